use crate::reports::models::{
    DetailedRow, Distribution, ProgressPoint, ReportFilter, TargetProgress, Totals,
};
use crate::reports::services::{
    ReportData, build_geography, detailed_row, progress_series, spray_type_distribution,
    status_distribution, target_progress,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Records listed under `recent_records`
pub const RECENT_RECORDS: usize = 10;

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    /// Campaign year; the current year when omitted
    pub year: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvinceBreakdown {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub year: i32,
    pub totals: Totals,
    pub coverage_percentage: f64,
    pub active_actors: usize,
    pub total_communities: usize,
    pub communities_sprayed: usize,
    pub target: TargetProgress,
    pub provinces: Vec<ProvinceBreakdown>,
    pub by_status: Vec<Distribution>,
    pub by_spray_type: Vec<Distribution>,
    pub recent_records: Vec<DetailedRow>,
    pub daily: Vec<ProgressPoint>,
}

impl Dashboard {
    pub fn build(year: i32, data: &ReportData) -> Self {
        let filter = ReportFilter {
            year: Some(year),
            ..ReportFilter::default()
        };
        let totals = Totals::from_records(&data.records);

        let mut newest_first: Vec<_> = data.records.iter().collect();
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            year,
            coverage_percentage: totals.coverage_rate,
            totals,
            active_actors: data.lookups.actors.values().filter(|a| a.is_active).count(),
            total_communities: data.lookups.communities.len(),
            communities_sprayed: data
                .records
                .iter()
                .filter(|r| r.structures_sprayed > 0)
                .map(|r| r.community_id)
                .collect::<HashSet<_>>()
                .len(),
            target: target_progress(data, &filter),
            provinces: build_geography(data)
                .into_iter()
                .map(|province| ProvinceBreakdown {
                    id: province.id,
                    name: province.name,
                    totals: province.totals,
                })
                .collect(),
            by_status: status_distribution(&data.records),
            by_spray_type: spray_type_distribution(&data.records),
            recent_records: newest_first
                .into_iter()
                .take(RECENT_RECORDS)
                .map(|record| detailed_row(&data.lookups, record))
                .collect(),
            daily: progress_series(&data.records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_year_yields_zeros() {
        let dashboard = Dashboard::build(2031, &ReportData::default());
        assert_eq!(dashboard.year, 2031);
        assert_eq!(dashboard.totals.records, 0);
        assert_eq!(dashboard.coverage_percentage, 0.0);
        assert_eq!(dashboard.target.target_progress, 0.0);
        assert_eq!(dashboard.target.year, 2031);
        assert!(dashboard.provinces.is_empty());
        assert!(dashboard.recent_records.is_empty());
        assert!(dashboard.daily.is_empty());
        assert_eq!(dashboard.by_status.len(), 4);
    }
}
