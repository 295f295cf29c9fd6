//! Workbook and CSV rendering of report data.

use super::models::{DetailedRow, ProvinceNode, ReportFilter, SummaryReport, Totals};
use super::services::Lookups;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

pub const SUMMARY_SHEET: &str = "Summary";
pub const GEOGRAPHY_SHEET: &str = "Geography";
pub const DETAILED_SHEET: &str = "Detailed";

pub const DETAILED_HEADERS: [&str; 25] = [
    "ID",
    "Spray Date",
    "Year",
    "Round",
    "Spray Type",
    "Status",
    "Province",
    "District",
    "Locality",
    "Community",
    "Sprayer",
    "Brigade Chief",
    "Configuration",
    "Insecticide",
    "Structures Found",
    "Structures Sprayed",
    "Structures Not Sprayed",
    "Compartments Sprayed",
    "Wall Type",
    "Roof Type",
    "Total Population",
    "Children Under 5",
    "Pregnant Women",
    "Reason Not Sprayed",
    "Notes",
];

const GEOGRAPHY_HEADERS: [&str; 12] = [
    "Level",
    "Province",
    "District",
    "Community",
    "Records",
    "Structures Found",
    "Structures Sprayed",
    "Structures Not Sprayed",
    "Coverage Rate (%)",
    "Total Population",
    "Children Under 5",
    "Pregnant Women",
];

/// Human readable filter lines, ids resolved to names
pub fn filter_labels(filter: &ReportFilter, lookups: &Lookups) -> Vec<(&'static str, String)> {
    let all = || "All".to_string();
    vec![
        ("Year", filter.year.map_or_else(all, |y| y.to_string())),
        ("Start Date", filter.start_date.map_or_else(all, |d| d.to_string())),
        ("End Date", filter.end_date.map_or_else(all, |d| d.to_string())),
        (
            "Province",
            filter
                .province_id
                .map_or_else(all, |id| lookups.provinces.get(&id).map_or_else(|| id.to_string(), |p| p.name.clone())),
        ),
        (
            "District",
            filter
                .district_id
                .map_or_else(all, |id| lookups.districts.get(&id).map_or_else(|| id.to_string(), |d| d.name.clone())),
        ),
        (
            "Status",
            filter.status.map_or_else(all, |s| sea_orm::ActiveEnum::to_value(&s)),
        ),
        (
            "Spray Type",
            filter.spray_type.map_or_else(all, |t| sea_orm::ActiveEnum::to_value(&t)),
        ),
    ]
}

#[allow(clippy::cast_precision_loss)]
fn summary_sheet(
    summary: &SummaryReport,
    filters: &[(&'static str, String)],
    bold: &Format,
) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;

    let mut row = 0;
    sheet.write_string_with_format(row, 0, "Filters", bold)?;
    row += 1;
    for (label, value) in filters {
        sheet.write_string(row, 0, *label)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }

    row += 1;
    sheet.write_string_with_format(row, 0, "Totals", bold)?;
    row += 1;
    let totals = &summary.totals;
    let counts = [
        ("Records", totals.records as f64),
        ("Structures Found", totals.structures_found as f64),
        ("Structures Sprayed", totals.structures_sprayed as f64),
        ("Structures Not Sprayed", totals.structures_not_sprayed as f64),
        ("Compartments Sprayed", totals.compartments_sprayed as f64),
        ("Total Population", totals.total_population as f64),
        ("Children Under 5", totals.children_under_5 as f64),
        ("Pregnant Women", totals.pregnant_women as f64),
        ("Coverage Rate (%)", totals.coverage_rate),
    ];
    for (label, value) in counts {
        sheet.write_string(row, 0, label)?;
        sheet.write_number(row, 1, value)?;
        row += 1;
    }

    row += 1;
    let target = &summary.target;
    sheet.write_string_with_format(row, 0, "Target Progress", bold)?;
    row += 1;
    sheet.write_string(row, 0, "Scope")?;
    sheet.write_string(row, 1, &target.scope)?;
    row += 1;
    let progress = [
        ("Target Year", f64::from(target.year)),
        ("Spray Target", target.spray_target as f64),
        ("Total Sprayed", target.total_sprayed as f64),
        ("Target Progress (%)", target.target_progress),
        ("Remaining Structures", target.remaining_structures as f64),
        ("Days Worked", target.days_worked as f64),
        ("Daily Target", target.daily_target),
        ("Average Daily Sprayed", target.average_daily_sprayed),
    ];
    for (label, value) in progress {
        sheet.write_string(row, 0, label)?;
        sheet.write_number(row, 1, value)?;
        row += 1;
    }
    sheet.write_string(row, 0, "On Track")?;
    sheet.write_string(row, 1, if target.on_track { "Yes" } else { "No" })?;

    sheet.autofit();
    Ok(sheet)
}

#[allow(clippy::cast_precision_loss)]
fn write_node(
    sheet: &mut Worksheet,
    row: u32,
    names: [&str; 4],
    totals: &Totals,
) -> Result<(), XlsxError> {
    for (col, name) in (0u16..).zip(names) {
        sheet.write_string(row, col, name)?;
    }
    let values = [
        totals.records as f64,
        totals.structures_found as f64,
        totals.structures_sprayed as f64,
        totals.structures_not_sprayed as f64,
        totals.coverage_rate,
        totals.total_population as f64,
        totals.children_under_5 as f64,
        totals.pregnant_women as f64,
    ];
    for (col, value) in (4u16..).zip(values) {
        sheet.write_number(row, col, value)?;
    }
    Ok(())
}

fn geography_sheet(provinces: &[ProvinceNode], bold: &Format) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(GEOGRAPHY_SHEET)?;
    for (col, header) in (0u16..).zip(GEOGRAPHY_HEADERS) {
        sheet.write_string_with_format(0, col, header, bold)?;
    }

    let mut row = 1;
    for province in provinces {
        write_node(&mut sheet, row, ["Province", &province.name, "", ""], &province.totals)?;
        row += 1;
        for district in &province.districts {
            write_node(
                &mut sheet,
                row,
                ["District", &province.name, &district.name, ""],
                &district.totals,
            )?;
            row += 1;
            for community in &district.communities {
                write_node(
                    &mut sheet,
                    row,
                    ["Community", &province.name, &district.name, &community.name],
                    &community.totals,
                )?;
                row += 1;
            }
        }
    }

    sheet.autofit();
    Ok(sheet)
}

fn detailed_sheet(rows: &[DetailedRow], bold: &Format) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(DETAILED_SHEET)?;
    for (col, header) in (0u16..).zip(DETAILED_HEADERS) {
        sheet.write_string_with_format(0, col, header, bold)?;
    }

    for (row, record) in (1u32..).zip(rows) {
        let texts = [
            (0, record.id.to_string()),
            (1, record.spray_date.to_string()),
            (4, record.spray_type.clone()),
            (5, record.spray_status.clone()),
            (6, record.province.clone()),
            (7, record.district.clone()),
            (8, record.locality.clone()),
            (9, record.community.clone()),
            (10, record.sprayer.clone()),
            (11, record.brigade_chief.clone()),
            (12, record.configuration.clone()),
            (13, record.insecticide.clone()),
            (18, record.wall_type.clone()),
            (19, record.roof_type.clone()),
            (23, record.reason_not_sprayed.clone()),
            (24, record.notes.clone()),
        ];
        for (col, text) in texts {
            sheet.write_string(row, col, text)?;
        }

        let numbers = [
            (2, record.spray_year),
            (3, record.spray_round),
            (14, record.structures_found),
            (15, record.structures_sprayed),
            (16, record.structures_not_sprayed),
            (17, record.compartments_sprayed),
            (20, record.total_population),
            (21, record.children_under_5),
            (22, record.pregnant_women),
        ];
        for (col, number) in numbers {
            sheet.write_number(row, col, number)?;
        }
    }

    sheet.autofit();
    Ok(sheet)
}

/// Summary, Geography and Detailed sheets as an `.xlsx` file
pub fn build_workbook(
    summary: &SummaryReport,
    rows: &[DetailedRow],
    filters: &[(&'static str, String)],
) -> Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    workbook.push_worksheet(summary_sheet(summary, filters, &bold)?);
    workbook.push_worksheet(geography_sheet(&summary.provinces, &bold)?);
    workbook.push_worksheet(detailed_sheet(rows, &bold)?);
    workbook.save_to_buffer()
}

/// Detailed rows as CSV with the same headers as the Detailed sheet
pub fn build_csv(rows: &[DetailedRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(DETAILED_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.spray_date.to_string(),
            row.spray_year.to_string(),
            row.spray_round.to_string(),
            row.spray_type.clone(),
            row.spray_status.clone(),
            row.province.clone(),
            row.district.clone(),
            row.locality.clone(),
            row.community.clone(),
            row.sprayer.clone(),
            row.brigade_chief.clone(),
            row.configuration.clone(),
            row.insecticide.clone(),
            row.structures_found.to_string(),
            row.structures_sprayed.to_string(),
            row.structures_not_sprayed.to_string(),
            row.compartments_sprayed.to_string(),
            row.wall_type.clone(),
            row.roof_type.clone(),
            row.total_population.to_string(),
            row.children_under_5.to_string(),
            row.pregnant_women.to_string(),
            row.reason_not_sprayed.clone(),
            row.notes.clone(),
        ])?;
    }
    Ok(writer.into_inner()?)
}
