//! Report aggregation.
//!
//! Matching spray totals are loaded once together with the reference tables
//! they point at; everything after [`load_report_data`] is pure and works on
//! the in-memory [`ReportData`].

use super::models::{
    CommunityNode, DetailedReport, DetailedRow, Distribution, DistrictNode, ProgressPoint,
    ProgressReport, ProvinceNode, ReportFilter, SummaryReport, TargetProgress, Totals,
};
use crate::actors::models as actors;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::communities::models as communities;
use crate::districts::models as districts;
use crate::localities::models as localities;
use crate::provinces::models as provinces;
use crate::spray_configurations::models::{self as configurations, NATIONAL_SCOPE};
use crate::spray_totals::models::{self as spray_totals, SprayStatus, SprayType};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Iterable,
    QueryFilter, QueryOrder,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

/// Reference rows keyed by id
#[derive(Debug, Default, Clone)]
pub struct Lookups {
    pub provinces: HashMap<Uuid, provinces::Model>,
    pub districts: HashMap<Uuid, districts::Model>,
    pub localities: HashMap<Uuid, localities::Model>,
    pub communities: HashMap<Uuid, communities::Model>,
    pub actors: HashMap<Uuid, actors::Model>,
    pub configurations: HashMap<Uuid, configurations::Model>,
}

/// Where a community sits in the hierarchy
#[derive(Debug, Default, Clone, Copy)]
pub struct Ancestry<'a> {
    pub province: Option<&'a provinces::Model>,
    pub district: Option<&'a districts::Model>,
    pub locality: Option<&'a localities::Model>,
    pub community: Option<&'a communities::Model>,
}

impl Lookups {
    pub fn ancestry(&self, community_id: Uuid) -> Ancestry<'_> {
        let community = self.communities.get(&community_id);
        let locality = community.and_then(|c| self.localities.get(&c.locality_id));
        let district = locality.and_then(|l| self.districts.get(&l.district_id));
        let province = district.and_then(|d| self.provinces.get(&d.province_id));
        Ancestry {
            province,
            district,
            locality,
            community,
        }
    }

    fn actor_name(&self, id: Uuid) -> String {
        self.actors.get(&id).map(|a| a.name.clone()).unwrap_or_default()
    }

    /// Province a configuration applies to, directly or through its district
    fn configuration_province(&self, configuration: &configurations::Model) -> Option<Uuid> {
        configuration.province_id.or_else(|| {
            configuration
                .district_id
                .and_then(|id| self.districts.get(&id))
                .map(|d| d.province_id)
        })
    }

    /// Province name of the configurations, or `Nacional` when they are
    /// unscoped or span several provinces
    pub fn scope_label<'a>(
        &self,
        selected: impl IntoIterator<Item = &'a configurations::Model>,
    ) -> String {
        let provinces: BTreeSet<Option<Uuid>> = selected
            .into_iter()
            .map(|c| self.configuration_province(c))
            .collect();
        match provinces.into_iter().collect::<Vec<_>>().as_slice() {
            [Some(province_id)] => self
                .provinces
                .get(province_id)
                .map_or_else(|| NATIONAL_SCOPE.to_string(), |p| p.name.clone()),
            _ => NATIONAL_SCOPE.to_string(),
        }
    }
}

/// Spray totals matching a filter plus everything needed to describe them
#[derive(Debug, Default, Clone)]
pub struct ReportData {
    pub records: Vec<spray_totals::Model>,
    pub lookups: Lookups,
}

fn by_id<M, F: Fn(&M) -> Uuid>(rows: Vec<M>, key: F) -> HashMap<Uuid, M> {
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

async fn load_lookups(db: &DatabaseConnection) -> Result<Lookups, DbErr> {
    Ok(Lookups {
        provinces: by_id(provinces::Entity::find().all(db).await?, |m| m.id),
        districts: by_id(districts::Entity::find().all(db).await?, |m| m.id),
        localities: by_id(localities::Entity::find().all(db).await?, |m| m.id),
        communities: by_id(communities::Entity::find().all(db).await?, |m| m.id),
        actors: by_id(actors::Entity::find().all(db).await?, |m| m.id),
        configurations: by_id(configurations::Entity::find().all(db).await?, |m| m.id),
    })
}

/// Communities inside the filter's province and district
fn communities_in_scope(lookups: &Lookups, filter: &ReportFilter) -> Vec<Uuid> {
    lookups
        .communities
        .keys()
        .copied()
        .filter(|id| {
            let ancestry = lookups.ancestry(*id);
            let province_ok = filter
                .province_id
                .is_none_or(|p| ancestry.province.is_some_and(|province| province.id == p));
            let district_ok = filter
                .district_id
                .is_none_or(|d| ancestry.district.is_some_and(|district| district.id == d));
            province_ok && district_ok
        })
        .collect()
}

pub async fn load_report_data(
    db: &DatabaseConnection,
    filter: &ReportFilter,
) -> BusinessResult<ReportData> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(crate::validation_error!(
                "start_date",
                "must not be after end_date"
            ));
        }
    }

    let lookups = load_lookups(db)
        .await
        .map_err(|e| e.to_business_error("report"))?;

    let mut condition = Condition::all().add(spray_totals::Column::IsDeleted.eq(false));
    if let Some(year) = filter.year {
        condition = condition.add(spray_totals::Column::SprayYear.eq(year));
    }
    if let Some(start) = filter.start_date {
        condition = condition.add(spray_totals::Column::SprayDate.gte(start));
    }
    if let Some(end) = filter.end_date {
        condition = condition.add(spray_totals::Column::SprayDate.lte(end));
    }
    if let Some(status) = filter.status {
        condition = condition.add(spray_totals::Column::SprayStatus.eq(status));
    }
    if let Some(spray_type) = filter.spray_type {
        condition = condition.add(spray_totals::Column::SprayType.eq(spray_type));
    }
    if filter.province_id.is_some() || filter.district_id.is_some() {
        condition = condition.add(
            spray_totals::Column::CommunityId.is_in(communities_in_scope(&lookups, filter)),
        );
    }

    let records = spray_totals::Entity::find()
        .filter(condition)
        .order_by_asc(spray_totals::Column::SprayDate)
        .order_by_asc(spray_totals::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| e.to_business_error("report"))?;

    tracing::debug!(records = records.len(), "Loaded report data");
    Ok(ReportData { records, lookups })
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub fn coverage_rate(found: i64, sprayed: i64) -> f64 {
    percentage(sprayed, found)
}

impl Totals {
    pub fn add(&mut self, record: &spray_totals::Model) {
        self.records += 1;
        self.structures_found += i64::from(record.structures_found);
        self.structures_sprayed += i64::from(record.structures_sprayed);
        self.structures_not_sprayed += i64::from(record.structures_not_sprayed);
        self.compartments_sprayed += i64::from(record.compartments_sprayed);
        self.total_population += i64::from(record.total_population);
        self.children_under_5 += i64::from(record.children_under_5);
        self.pregnant_women += i64::from(record.pregnant_women);
    }

    /// Sets the coverage rate once every record has been added
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.coverage_rate = coverage_rate(self.structures_found, self.structures_sprayed);
        self
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a spray_totals::Model>) -> Self {
        let mut totals = Totals::default();
        for record in records {
            totals.add(record);
        }
        totals.finish()
    }
}

/// Province -> district -> community tree, each level ordered by name
pub fn build_geography(data: &ReportData) -> Vec<ProvinceNode> {
    type CommunityKey = (String, Uuid);
    type DistrictKey = (String, Uuid);
    type ProvinceKey = (String, Uuid);

    let mut tree: BTreeMap<
        ProvinceKey,
        BTreeMap<DistrictKey, BTreeMap<CommunityKey, (String, Totals)>>,
    > = BTreeMap::new();

    for record in &data.records {
        let ancestry = data.lookups.ancestry(record.community_id);
        let (Some(province), Some(district), Some(locality), Some(community)) = (
            ancestry.province,
            ancestry.district,
            ancestry.locality,
            ancestry.community,
        ) else {
            tracing::warn!(community_id = %record.community_id, "Spray total outside the known hierarchy");
            continue;
        };

        tree.entry((province.name.clone(), province.id))
            .or_default()
            .entry((district.name.clone(), district.id))
            .or_default()
            .entry((community.name.clone(), community.id))
            .or_insert_with(|| (locality.name.clone(), Totals::default()))
            .1
            .add(record);
    }

    tree.into_iter()
        .map(|((province_name, province_id), districts)| {
            let districts: Vec<DistrictNode> = districts
                .into_iter()
                .map(|((district_name, district_id), communities)| {
                    let communities: Vec<CommunityNode> = communities
                        .into_iter()
                        .map(|((name, id), (locality_name, totals))| CommunityNode {
                            id,
                            name,
                            locality_name,
                            totals: totals.finish(),
                        })
                        .collect();
                    DistrictNode {
                        id: district_id,
                        name: district_name,
                        totals: sum_totals(communities.iter().map(|c| &c.totals)),
                        communities,
                    }
                })
                .collect();
            ProvinceNode {
                id: province_id,
                name: province_name,
                totals: sum_totals(districts.iter().map(|d| &d.totals)),
                districts,
            }
        })
        .collect()
}

/// Combines finished child totals and recomputes the rate for the parent
fn sum_totals<'a>(children: impl Iterator<Item = &'a Totals>) -> Totals {
    let mut sum = Totals::default();
    for child in children {
        sum.records += child.records;
        sum.structures_found += child.structures_found;
        sum.structures_sprayed += child.structures_sprayed;
        sum.structures_not_sprayed += child.structures_not_sprayed;
        sum.compartments_sprayed += child.compartments_sprayed;
        sum.total_population += child.total_population;
        sum.children_under_5 += child.children_under_5;
        sum.pregnant_women += child.pregnant_women;
    }
    sum.finish()
}

/// One bucket per enum value, in declaration order
fn distribution<E, F>(records: &[spray_totals::Model], key: F) -> Vec<Distribution>
where
    E: ActiveEnum<Value = String> + Iterable + PartialEq,
    F: Fn(&spray_totals::Model) -> E,
{
    E::iter()
        .map(|variant| {
            let totals = Totals::from_records(records.iter().filter(|r| key(r) == variant));
            Distribution {
                key: variant.to_value(),
                records: totals.records,
                structures_found: totals.structures_found,
                structures_sprayed: totals.structures_sprayed,
                coverage_rate: totals.coverage_rate,
            }
        })
        .collect()
}

pub fn status_distribution(records: &[spray_totals::Model]) -> Vec<Distribution> {
    distribution::<SprayStatus, _>(records, |r| r.spray_status)
}

pub fn spray_type_distribution(records: &[spray_totals::Model]) -> Vec<Distribution> {
    distribution::<SprayType, _>(records, |r| r.spray_type)
}

/// Year the target is measured against: the filter's year, then the start
/// date's, then the newest record's, then the current year
pub fn target_year(filter: &ReportFilter, records: &[spray_totals::Model]) -> i32 {
    filter
        .year
        .or_else(|| filter.start_date.map(|d| d.year()))
        .or_else(|| records.iter().map(|r| r.spray_year).max())
        .unwrap_or_else(|| Utc::now().year())
}

/// Active configurations of `year` that match the filter's scope. Without a
/// province or district the national configurations apply, or every active
/// configuration of the year when there is no national one.
pub fn select_configurations<'a>(
    lookups: &'a Lookups,
    filter: &ReportFilter,
    year: i32,
) -> Vec<&'a configurations::Model> {
    let mut active: Vec<&configurations::Model> = lookups
        .configurations
        .values()
        .filter(|c| c.is_active && c.year == year)
        .collect();
    active.sort_by_key(|c| c.created_at);

    if let Some(district_id) = filter.district_id {
        return active
            .into_iter()
            .filter(|c| c.district_id == Some(district_id))
            .collect();
    }
    if let Some(province_id) = filter.province_id {
        return active
            .into_iter()
            .filter(|c| c.province_id == Some(province_id))
            .collect();
    }

    let national: Vec<_> = active
        .iter()
        .copied()
        .filter(|c| c.province_id.is_none() && c.district_id.is_none())
        .collect();
    if national.is_empty() { active } else { national }
}

#[allow(clippy::cast_precision_loss)]
pub fn target_progress(data: &ReportData, filter: &ReportFilter) -> TargetProgress {
    let year = target_year(filter, &data.records);
    let selected = select_configurations(&data.lookups, filter, year);

    let spray_target: i64 = selected.iter().map(|c| i64::from(c.spray_target)).sum();
    let proposed_spray_days = selected
        .iter()
        .map(|c| c.proposed_spray_days)
        .max()
        .unwrap_or(0);
    let total_sprayed: i64 = data
        .records
        .iter()
        .map(|r| i64::from(r.structures_sprayed))
        .sum();
    let days_worked = data
        .records
        .iter()
        .map(|r| r.spray_date)
        .collect::<BTreeSet<NaiveDate>>()
        .len();

    let remaining_structures = (spray_target - total_sprayed).max(0);
    let daily_target = if proposed_spray_days > 0 {
        spray_target as f64 / f64::from(proposed_spray_days)
    } else {
        0.0
    };
    let average_daily_sprayed = if days_worked > 0 {
        total_sprayed as f64 / days_worked as f64
    } else {
        0.0
    };
    let projected_days_remaining = (average_daily_sprayed > 0.0)
        .then(|| (remaining_structures as f64 / average_daily_sprayed).ceil());

    TargetProgress {
        year,
        scope: data.lookups.scope_label(selected.iter().copied()),
        configurations: selected.len(),
        spray_target,
        total_sprayed,
        target_progress: percentage(total_sprayed, spray_target),
        remaining_structures,
        proposed_spray_days,
        days_worked,
        daily_target,
        average_daily_sprayed,
        projected_days_remaining,
        on_track: remaining_structures == 0
            || (days_worked > 0 && average_daily_sprayed >= daily_target),
    }
}

/// Daily buckets with running totals, oldest first
pub fn progress_series(records: &[spray_totals::Model]) -> Vec<ProgressPoint> {
    let mut by_day: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    for record in records {
        by_day.entry(record.spray_date).or_default().add(record);
    }

    let mut cumulative_found = 0;
    let mut cumulative_sprayed = 0;
    by_day
        .into_iter()
        .map(|(date, totals)| {
            let totals = totals.finish();
            cumulative_found += totals.structures_found;
            cumulative_sprayed += totals.structures_sprayed;
            ProgressPoint {
                date,
                records: totals.records,
                structures_found: totals.structures_found,
                structures_sprayed: totals.structures_sprayed,
                coverage_rate: totals.coverage_rate,
                cumulative_found,
                cumulative_sprayed,
                cumulative_coverage_rate: coverage_rate(cumulative_found, cumulative_sprayed),
            }
        })
        .collect()
}

pub fn detailed_row(lookups: &Lookups, record: &spray_totals::Model) -> DetailedRow {
    let ancestry = lookups.ancestry(record.community_id);
    let name = |value: Option<&String>| value.cloned().unwrap_or_default();

    DetailedRow {
        id: record.id,
        spray_date: record.spray_date,
        spray_year: record.spray_year,
        spray_round: record.spray_round,
        spray_type: record.spray_type.to_value(),
        spray_status: record.spray_status.to_value(),
        province: name(ancestry.province.map(|p| &p.name)),
        district: name(ancestry.district.map(|d| &d.name)),
        locality: name(ancestry.locality.map(|l| &l.name)),
        community: name(ancestry.community.map(|c| &c.name)),
        sprayer: lookups.actor_name(record.sprayer_id),
        brigade_chief: lookups.actor_name(record.brigade_chief_id),
        configuration: record
            .spray_configuration_id
            .and_then(|id| lookups.configurations.get(&id))
            .map_or_else(
                || NATIONAL_SCOPE.to_string(),
                |c| lookups.scope_label([c]),
            ),
        insecticide: record.insecticide.clone(),
        structures_found: record.structures_found,
        structures_sprayed: record.structures_sprayed,
        structures_not_sprayed: record.structures_not_sprayed,
        compartments_sprayed: record.compartments_sprayed,
        wall_type: record.wall_type.to_value(),
        roof_type: record.roof_type.to_value(),
        total_population: record.total_population,
        children_under_5: record.children_under_5,
        pregnant_women: record.pregnant_women,
        reason_not_sprayed: record
            .reason_not_sprayed
            .map(|r| r.to_value())
            .unwrap_or_default(),
        notes: record.notes.clone().unwrap_or_default(),
    }
}

pub fn detailed_rows(data: &ReportData) -> Vec<DetailedRow> {
    data.records
        .iter()
        .map(|record| detailed_row(&data.lookups, record))
        .collect()
}

pub fn summary_report(filter: ReportFilter, data: &ReportData) -> SummaryReport {
    SummaryReport {
        totals: Totals::from_records(&data.records),
        provinces: build_geography(data),
        by_status: status_distribution(&data.records),
        by_spray_type: spray_type_distribution(&data.records),
        target: target_progress(data, &filter),
        filter,
    }
}

pub fn detailed_report(filter: ReportFilter, data: &ReportData) -> DetailedReport {
    DetailedReport {
        filter,
        totals: Totals::from_records(&data.records),
        rows: detailed_rows(data),
    }
}

pub fn progress_report(filter: ReportFilter, data: &ReportData) -> ProgressReport {
    ProgressReport {
        target: target_progress(data, &filter),
        series: progress_series(&data.records),
        filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spray_totals::models::{RoofType, WallType};
    use rstest::rstest;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    /// Gaza (Chokwe: Lionde, Massavasse) and Tete (Moatize: Benga)
    struct Fixture {
        data: ReportData,
        gaza: Uuid,
        tete: Uuid,
        chokwe: Uuid,
        lionde: Uuid,
        massavasse: Uuid,
        benga: Uuid,
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let mut lookups = Lookups::default();

        let add_province = |lookups: &mut Lookups, name: &str| {
            let id = Uuid::new_v4();
            lookups.provinces.insert(
                id,
                provinces::Model {
                    id,
                    name: name.to_string(),
                    code: None,
                    created_at: now,
                    last_updated: now,
                },
            );
            id
        };
        let gaza = add_province(&mut lookups, "Gaza");
        let tete = add_province(&mut lookups, "Tete");

        let add_district = |lookups: &mut Lookups, province_id: Uuid, name: &str| {
            let id = Uuid::new_v4();
            lookups.districts.insert(
                id,
                districts::Model {
                    id,
                    name: name.to_string(),
                    code: None,
                    province_id,
                    created_at: now,
                    last_updated: now,
                    province_name: None,
                },
            );
            id
        };
        let chokwe = add_district(&mut lookups, gaza, "Chokwe");
        let moatize = add_district(&mut lookups, tete, "Moatize");

        let add_community = |lookups: &mut Lookups, district_id: Uuid, name: &str| {
            let locality_id = Uuid::new_v4();
            lookups.localities.insert(
                locality_id,
                localities::Model {
                    id: locality_id,
                    name: format!("{name} Sede"),
                    code: None,
                    district_id,
                    created_at: now,
                    last_updated: now,
                    district_name: None,
                },
            );
            let id = Uuid::new_v4();
            lookups.communities.insert(
                id,
                communities::Model {
                    id,
                    name: name.to_string(),
                    code: None,
                    locality_id,
                    created_at: now,
                    last_updated: now,
                    locality_name: None,
                },
            );
            id
        };
        let lionde = add_community(&mut lookups, chokwe, "Lionde");
        let massavasse = add_community(&mut lookups, chokwe, "Massavasse");
        let benga = add_community(&mut lookups, moatize, "Benga");

        let record = |community_id: Uuid, day: u32, found: i32, sprayed: i32, status: SprayStatus| {
            spray_totals::Model {
                id: Uuid::new_v4(),
                sprayer_id: Uuid::new_v4(),
                brigade_chief_id: Uuid::new_v4(),
                community_id,
                spray_configuration_id: None,
                spray_type: SprayType::Principal,
                spray_date: date(day),
                spray_year: 2025,
                spray_round: 1,
                spray_status: status,
                insecticide: "Actellic 300CS".to_string(),
                structures_found: found,
                structures_sprayed: sprayed,
                structures_not_sprayed: found - sprayed,
                compartments_sprayed: sprayed * 2,
                wall_type: WallType::Matope,
                roof_type: RoofType::Capim,
                total_population: found * 4,
                children_under_5: found,
                pregnant_women: 1,
                reason_not_sprayed: None,
                notes: None,
                is_deleted: false,
                created_by: None,
                updated_by: None,
                deleted_by: None,
                deleted_at: None,
                created_at: now,
                last_updated: now,
            }
        };

        let records = vec![
            record(lionde, 1, 100, 80, SprayStatus::Completed),
            record(massavasse, 1, 50, 50, SprayStatus::Completed),
            record(lionde, 2, 20, 10, SprayStatus::InProgress),
            record(benga, 3, 0, 0, SprayStatus::Planned),
        ];

        Fixture {
            data: ReportData { records, lookups },
            gaza,
            tete,
            chokwe,
            lionde,
            massavasse,
            benga,
        }
    }

    fn configuration(year: i32, province_id: Option<Uuid>, district_id: Option<Uuid>, target: i32) -> configurations::Model {
        configurations::Model {
            id: Uuid::new_v4(),
            year,
            province_id,
            district_id,
            spray_target: target,
            proposed_spray_days: 10,
            spray_rounds: 1,
            days_between_rounds: 0,
            is_active: true,
            description: None,
            notes: None,
            created_at: Utc::now(),
            last_updated: Utc::now(),
            province_name: None,
            district_name: None,
        }
    }

    fn with_configurations(mut data: ReportData, configs: Vec<configurations::Model>) -> ReportData {
        data.lookups.configurations = by_id(configs, |c| c.id);
        data
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(0, 5, 0.0)]
    #[case(100, 80, 80.0)]
    #[case(3, 1, 100.0 / 3.0)]
    fn test_coverage_rate(#[case] found: i64, #[case] sprayed: i64, #[case] expected: f64) {
        assert!((coverage_rate(found, sprayed) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_totals_sum_every_count() {
        let fixture = fixture();
        let totals = Totals::from_records(&fixture.data.records);
        assert_eq!(totals.records, 4);
        assert_eq!(totals.structures_found, 170);
        assert_eq!(totals.structures_sprayed, 140);
        assert_eq!(totals.structures_not_sprayed, 30);
        assert_eq!(totals.compartments_sprayed, 280);
        assert_eq!(totals.total_population, 680);
        assert_eq!(totals.pregnant_women, 4);
        assert!((totals.coverage_rate - 140.0 / 170.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_geography_tree() {
        let fixture = fixture();
        let tree = build_geography(&fixture.data);

        let names: Vec<&str> = tree.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Gaza", "Tete"]);

        let gaza = &tree[0];
        assert_eq!(gaza.id, fixture.gaza);
        assert_eq!(gaza.totals.records, 3);
        assert_eq!(gaza.totals.structures_found, 170);
        assert_eq!(gaza.districts.len(), 1);
        assert_eq!(gaza.districts[0].id, fixture.chokwe);

        let communities = &gaza.districts[0].communities;
        assert_eq!(communities[0].id, fixture.lionde);
        assert_eq!(communities[0].locality_name, "Lionde Sede");
        assert_eq!(communities[0].totals.structures_found, 120);
        assert!((communities[0].totals.coverage_rate - 75.0).abs() < 1e-9);
        assert_eq!(communities[1].id, fixture.massavasse);
        assert!((communities[1].totals.coverage_rate - 100.0).abs() < 1e-9);

        let tete = &tree[1];
        assert_eq!(tete.id, fixture.tete);
        assert_eq!(tete.districts[0].communities[0].id, fixture.benga);
        assert_eq!(tete.totals.coverage_rate, 0.0, "No structures found means zero coverage");
    }

    #[test]
    fn test_every_node_rate_matches_its_counts() {
        let tree = build_geography(&fixture().data);
        let check = |totals: &Totals| {
            let expected = if totals.structures_found == 0 {
                0.0
            } else {
                totals.structures_sprayed as f64 / totals.structures_found as f64 * 100.0
            };
            assert!((totals.coverage_rate - expected).abs() < 1e-9);
        };
        for province in &tree {
            check(&province.totals);
            for district in &province.districts {
                check(&district.totals);
                district.communities.iter().for_each(|c| check(&c.totals));
            }
        }
    }

    #[test]
    fn test_distributions_cover_every_value() {
        let records = fixture().data.records;

        let by_status = status_distribution(&records);
        let keys: Vec<&str> = by_status.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, ["PLANNED", "IN_PROGRESS", "COMPLETED", "CANCELLED"]);
        assert_eq!(by_status[2].records, 2);
        assert_eq!(by_status[2].structures_sprayed, 130);
        assert_eq!(by_status[3].records, 0);
        assert_eq!(by_status[3].coverage_rate, 0.0);

        let by_type = spray_type_distribution(&records);
        assert_eq!(by_type[0].key, "PRINCIPAL");
        assert_eq!(by_type[0].records, 4);
        assert_eq!(by_type[1].records, 0);
    }

    #[test]
    fn test_progress_series_is_cumulative() {
        let series = progress_series(&fixture().data.records);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, date(1));
        assert_eq!(series[0].records, 2);
        assert_eq!(series[0].cumulative_sprayed, 130);
        assert_eq!(series[1].structures_sprayed, 10);
        assert_eq!(series[1].cumulative_found, 170);
        assert_eq!(series[2].coverage_rate, 0.0);
        assert!((series[2].cumulative_coverage_rate - 140.0 / 170.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_prefers_national_configuration() {
        let fixture = fixture();
        let data = with_configurations(
            fixture.data,
            vec![
                configuration(2025, None, None, 1000),
                configuration(2025, Some(fixture.gaza), None, 400),
                configuration(2024, None, None, 9999),
            ],
        );

        let target = target_progress(&data, &ReportFilter { year: Some(2025), ..Default::default() });
        assert_eq!(target.scope, NATIONAL_SCOPE);
        assert_eq!(target.configurations, 1);
        assert_eq!(target.spray_target, 1000);
        assert_eq!(target.total_sprayed, 140);
        assert!((target.target_progress - 14.0).abs() < 1e-9);
        assert_eq!(target.remaining_structures, 860);
        assert_eq!(target.days_worked, 3);
        assert!((target.daily_target - 100.0).abs() < 1e-9);
        assert!(!target.on_track);
        assert_eq!(target.projected_days_remaining, Some((860.0_f64 / (140.0 / 3.0)).ceil()));
    }

    #[test]
    fn test_target_scoped_to_province() {
        let fixture = fixture();
        let data = with_configurations(
            fixture.data,
            vec![
                configuration(2025, None, None, 1000),
                configuration(2025, Some(fixture.gaza), None, 100),
            ],
        );

        let filter = ReportFilter {
            year: Some(2025),
            province_id: Some(fixture.gaza),
            ..Default::default()
        };
        let target = target_progress(&data, &filter);
        assert_eq!(target.scope, "Gaza");
        assert_eq!(target.spray_target, 100);
        assert_eq!(target.remaining_structures, 0);
        assert!(target.on_track);
    }

    #[test]
    fn test_target_falls_back_to_all_active_configurations() {
        let fixture = fixture();
        let mut inactive = configuration(2025, Some(fixture.tete), None, 5000);
        inactive.is_active = false;
        let data = with_configurations(
            fixture.data,
            vec![
                configuration(2025, Some(fixture.gaza), None, 300),
                configuration(2025, None, Some(fixture.chokwe), 200),
                inactive,
            ],
        );

        let target = target_progress(&data, &ReportFilter::default());
        assert_eq!(target.year, 2025, "Year comes from the records");
        assert_eq!(target.configurations, 2);
        assert_eq!(target.spray_target, 500);
        assert_eq!(target.scope, "Gaza", "Both configurations sit in Gaza");
    }

    #[test]
    fn test_zero_target_yields_zero_progress() {
        let data = with_configurations(fixture().data, vec![configuration(2025, None, None, 0)]);
        let target = target_progress(&data, &ReportFilter::default());
        assert_eq!(target.target_progress, 0.0);
        assert_eq!(target.daily_target, 0.0);

        let empty = target_progress(&ReportData::default(), &ReportFilter { year: Some(2030), ..Default::default() });
        assert_eq!(empty.configurations, 0);
        assert_eq!(empty.target_progress, 0.0);
        assert_eq!(empty.days_worked, 0);
        assert!(empty.projected_days_remaining.is_none());
    }

    #[test]
    fn test_detailed_rows_render_missing_relations_as_empty() {
        let fixture = fixture();
        let row = detailed_row(&fixture.data.lookups, &fixture.data.records[0]);
        assert_eq!(row.province, "Gaza");
        assert_eq!(row.district, "Chokwe");
        assert_eq!(row.locality, "Lionde Sede");
        assert_eq!(row.community, "Lionde");
        assert_eq!(row.sprayer, "", "Actors are not in the lookups");
        assert_eq!(row.configuration, NATIONAL_SCOPE);
        assert_eq!(row.spray_status, "COMPLETED");
        assert_eq!(row.reason_not_sprayed, "");
        assert_eq!(row.notes, "");

        let mut orphan = fixture.data.records[0].clone();
        orphan.community_id = Uuid::new_v4();
        let row = detailed_row(&fixture.data.lookups, &orphan);
        assert_eq!(row.province, "");
        assert_eq!(row.community, "");
    }

    #[test]
    fn test_configuration_label_uses_province() {
        let fixture = fixture();
        let scoped = configuration(2025, Some(fixture.tete), None, 10);
        let scoped_id = scoped.id;
        let data = with_configurations(fixture.data, vec![scoped]);

        let mut record = data.records[0].clone();
        record.spray_configuration_id = Some(scoped_id);
        assert_eq!(detailed_row(&data.lookups, &record).configuration, "Tete");
    }
}
