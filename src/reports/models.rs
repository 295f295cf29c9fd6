use crate::spray_totals::models::{SprayStatus, SprayType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Selection shared by every report endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportFilter {
    pub year: Option<i32>,
    /// First spray date included
    pub start_date: Option<NaiveDate>,
    /// Last spray date included
    pub end_date: Option<NaiveDate>,
    pub province_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    #[param(inline)]
    pub status: Option<SprayStatus>,
    #[param(inline)]
    pub spray_type: Option<SprayType>,
}

/// Output format of `/api/reports/export`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

/// Read next to [`ReportFilter`] from the same query string
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `xlsx` (default) or `csv`
    #[param(inline)]
    pub format: Option<ExportFormat>,
}

/// Summed counts for any group of spray totals
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Totals {
    pub records: u64,
    pub structures_found: i64,
    pub structures_sprayed: i64,
    pub structures_not_sprayed: i64,
    pub compartments_sprayed: i64,
    pub total_population: i64,
    pub children_under_5: i64,
    pub pregnant_women: i64,
    /// `structures_sprayed / structures_found * 100`, 0 without structures
    pub coverage_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CommunityNode {
    pub id: Uuid,
    pub name: String,
    pub locality_name: String,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DistrictNode {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub totals: Totals,
    pub communities: Vec<CommunityNode>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvinceNode {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub totals: Totals,
    pub districts: Vec<DistrictNode>,
}

/// One bucket of a status or spray type breakdown
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Distribution {
    pub key: String,
    pub records: u64,
    pub structures_found: i64,
    pub structures_sprayed: i64,
    pub coverage_rate: f64,
}

/// Campaign progress against the configured targets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TargetProgress {
    pub year: i32,
    /// Province of the configurations, or `Nacional`
    pub scope: String,
    pub configurations: usize,
    pub spray_target: i64,
    pub total_sprayed: i64,
    pub target_progress: f64,
    pub remaining_structures: i64,
    pub proposed_spray_days: i32,
    pub days_worked: usize,
    pub daily_target: f64,
    pub average_daily_sprayed: f64,
    /// None while nothing has been sprayed
    pub projected_days_remaining: Option<f64>,
    pub on_track: bool,
}

/// One spray date of the progress series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub records: u64,
    pub structures_found: i64,
    pub structures_sprayed: i64,
    pub coverage_rate: f64,
    pub cumulative_found: i64,
    pub cumulative_sprayed: i64,
    pub cumulative_coverage_rate: f64,
}

/// One spray total flattened for tables and exports
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailedRow {
    pub id: Uuid,
    pub spray_date: NaiveDate,
    pub spray_year: i32,
    pub spray_round: i32,
    pub spray_type: String,
    pub spray_status: String,
    pub province: String,
    pub district: String,
    pub locality: String,
    pub community: String,
    pub sprayer: String,
    pub brigade_chief: String,
    pub configuration: String,
    pub insecticide: String,
    pub structures_found: i32,
    pub structures_sprayed: i32,
    pub structures_not_sprayed: i32,
    pub compartments_sprayed: i32,
    pub wall_type: String,
    pub roof_type: String,
    pub total_population: i32,
    pub children_under_5: i32,
    pub pregnant_women: i32,
    pub reason_not_sprayed: String,
    pub notes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryReport {
    pub filter: ReportFilter,
    pub totals: Totals,
    pub provinces: Vec<ProvinceNode>,
    pub by_status: Vec<Distribution>,
    pub by_spray_type: Vec<Distribution>,
    pub target: TargetProgress,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailedReport {
    pub filter: ReportFilter,
    pub totals: Totals,
    pub rows: Vec<DetailedRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProgressReport {
    pub filter: ReportFilter,
    pub target: TargetProgress,
    pub series: Vec<ProgressPoint>,
}
