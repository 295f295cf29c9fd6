use crate::common::test_helpers::{
    Hierarchy, create_configuration, create_field_team, create_hierarchy,
    create_spray_total, delete, get, send, spray_total_payload,
};
use crate::config::test_helpers::{TestApp, setup_test_app};
use axum::body::to_bytes;
use axum::http::{StatusCode, header};
use calamine::{Data, Reader, Xlsx};
use serde_json::json;
use std::io::Cursor;

struct Campaign {
    gaza: Hierarchy,
    tete: Hierarchy,
}

/// Gaza: 100/80 on day 6 and 50/50 on day 7. Tete: 40/10 on day 7 as a
/// secondary spray. One Gaza record is soft-deleted.
async fn seed_campaign(app: &TestApp) -> Campaign {
    let gaza = create_hierarchy(app, "Gaza").await;
    let tete = create_hierarchy(app, "Tete").await;
    let team = create_field_team(app).await;

    let mut completed = spray_total_payload(&gaza, &team, "2025-10-06", 100, 80);
    completed["spray_status"] = json!("COMPLETED");
    create_spray_total(app, &app.sprayer.token, completed).await;
    create_spray_total(
        app,
        &app.sprayer.token,
        spray_total_payload(&gaza, &team, "2025-10-07", 50, 50),
    )
    .await;

    let mut secondary = spray_total_payload(&tete, &team, "2025-10-07", 40, 10);
    secondary["spray_type"] = json!("SECUNDARIA");
    secondary["reason_not_sprayed"] = json!("FECHADA");
    create_spray_total(app, &app.sprayer.token, secondary).await;

    let removed = create_spray_total(
        app,
        &app.sprayer.token,
        spray_total_payload(&gaza, &team, "2025-10-08", 999, 999),
    )
    .await;
    let status = delete(
        &app.router,
        &format!("/api/spray-totals/{}", removed["id"].as_str().unwrap()),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    Campaign { gaza, tete }
}

#[tokio::test]
async fn test_summary_report() {
    let app = setup_test_app().await;
    let campaign = seed_campaign(&app).await;
    create_configuration(&app, 2025, None, 1000).await;

    let (status, body) = get(&app.router, "/api/reports/summary?year=2025", &app.supervisor.token).await;
    assert_eq!(status, StatusCode::OK, "{body:?}");

    let totals = &body["totals"];
    assert_eq!(totals["records"], 3, "Soft-deleted records are excluded");
    assert_eq!(totals["structures_found"], 190);
    assert_eq!(totals["structures_sprayed"], 140);
    assert_eq!(totals["structures_not_sprayed"], 50);

    let provinces = body["provinces"].as_array().unwrap();
    assert_eq!(provinces.len(), 2);
    assert_eq!(provinces[0]["name"], "Gaza Province");
    assert_eq!(provinces[0]["id"], campaign.gaza.province_id.to_string());
    assert_eq!(provinces[0]["coverage_rate"], 13000.0 / 150.0);
    assert_eq!(provinces[1]["name"], "Tete Province");
    assert_eq!(provinces[1]["coverage_rate"], 25.0);
    let community = &provinces[1]["districts"][0]["communities"][0];
    assert_eq!(community["id"], campaign.tete.community_id.to_string());
    assert_eq!(community["locality_name"], "Tete Locality");

    assert_eq!(body["by_status"][2]["key"], "COMPLETED");
    assert_eq!(body["by_status"][2]["records"], 1);
    assert_eq!(body["by_spray_type"][1]["key"], "SECUNDARIA");
    assert_eq!(body["by_spray_type"][1]["structures_found"], 40);

    let target = &body["target"];
    assert_eq!(target["scope"], "Nacional");
    assert_eq!(target["spray_target"], 1000);
    assert_eq!(target["target_progress"], 14.0);
    assert_eq!(target["days_worked"], 2);
    assert_eq!(target["remaining_structures"], 860);
}

#[tokio::test]
async fn test_summary_filters_by_province_and_type() {
    let app = setup_test_app().await;
    let campaign = seed_campaign(&app).await;
    create_configuration(&app, 2025, Some(campaign.gaza.province_id), 200).await;

    let (status, body) = get(
        &app.router,
        &format!("/api/reports/summary?province_id={}", campaign.gaza.province_id),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["records"], 2);
    assert_eq!(body["provinces"].as_array().unwrap().len(), 1);
    assert_eq!(body["target"]["scope"], "Gaza Province");
    assert_eq!(body["target"]["target_progress"], 65.0);

    let (_, body) = get(
        &app.router,
        "/api/reports/summary?spray_type=SECUNDARIA",
        &app.admin.token,
    )
    .await;
    assert_eq!(body["totals"]["records"], 1);
    assert_eq!(body["totals"]["structures_sprayed"], 10);

    let (_, body) = get(
        &app.router,
        &format!(
            "/api/reports/summary?district_id={}&start_date=2025-10-07&end_date=2025-10-07",
            campaign.gaza.district_id
        ),
        &app.admin.token,
    )
    .await;
    assert_eq!(body["totals"]["records"], 1);
    assert_eq!(body["totals"]["structures_found"], 50);

    let (status, _) = get(&app.router, "/api/reports/summary?year=1990", &app.admin.token).await;
    assert_eq!(status, StatusCode::OK, "An empty year is not an error");
}

#[tokio::test]
async fn test_detailed_report_resolves_names() {
    let app = setup_test_app().await;
    seed_campaign(&app).await;

    let (status, body) = get(&app.router, "/api/reports/detailed", &app.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let first = &rows[0];
    assert_eq!(first["spray_date"], "2025-10-06");
    assert_eq!(first["province"], "Gaza Province");
    assert_eq!(first["district"], "Gaza District");
    assert_eq!(first["locality"], "Gaza Locality");
    assert_eq!(first["community"], "Gaza Community");
    assert_eq!(first["sprayer"], "Joao Sprayer");
    assert_eq!(first["brigade_chief"], "Maria Chief");
    assert_eq!(first["configuration"], "Nacional");
    assert_eq!(first["reason_not_sprayed"], "");

    let tete_row = rows
        .iter()
        .find(|row| row["community"] == "Tete Community")
        .unwrap();
    assert_eq!(tete_row["reason_not_sprayed"], "FECHADA");
    assert_eq!(tete_row["spray_type"], "SECUNDARIA");
}

#[tokio::test]
async fn test_progress_report_is_cumulative() {
    let app = setup_test_app().await;
    seed_campaign(&app).await;

    let (status, body) = get(&app.router, "/api/reports/progress?year=2025", &app.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    let series = body["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["date"], "2025-10-06");
    assert_eq!(series[0]["cumulative_sprayed"], 80);
    assert_eq!(series[1]["records"], 2);
    assert_eq!(series[1]["structures_sprayed"], 60);
    assert_eq!(series[1]["cumulative_found"], 190);
    assert_eq!(series[1]["cumulative_sprayed"], 140);
}

#[tokio::test]
async fn test_export_xlsx_workbook() {
    let app = setup_test_app().await;
    seed_campaign(&app).await;

    let response = send(
        &app.router,
        "GET",
        "/api/reports/export?year=2025&format=xlsx",
        Some(&app.supervisor.token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"spray-report-2025.xlsx\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Summary", "Geography", "Detailed"]);

    let detailed = workbook.worksheet_range("Detailed").unwrap();
    assert_eq!(detailed.height(), 4, "Header plus three live records");
    assert_eq!(detailed.get((1, 6)), Some(&Data::String("Gaza Province".to_string())));

    // Province, district and community rows for each of the two branches
    let geography = workbook.worksheet_range("Geography").unwrap();
    assert_eq!(geography.height(), 7);
    assert_eq!(geography.get((1, 0)), Some(&Data::String("Province".to_string())));
    assert_eq!(geography.get((3, 3)), Some(&Data::String("Gaza Community".to_string())));

    let summary = workbook.worksheet_range("Summary").unwrap();
    assert_eq!(summary.get((1, 1)), Some(&Data::String("2025".to_string())));
}

#[tokio::test]
async fn test_export_csv() {
    let app = setup_test_app().await;
    seed_campaign(&app).await;

    let response = send(
        &app.router,
        "GET",
        "/api/reports/export?format=csv",
        Some(&app.admin.token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"spray-report-all.csv\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_ref());
    assert_eq!(&reader.headers().unwrap()[0], "ID");
    assert_eq!(reader.records().count(), 3);
}

#[tokio::test]
async fn test_reports_require_manager_role() {
    let app = setup_test_app().await;

    for uri in [
        "/api/reports/summary",
        "/api/reports/detailed",
        "/api/reports/progress",
        "/api/reports/export",
    ] {
        let response = send(&app.router, "GET", uri, Some(&app.sprayer.token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");

        let response = send(&app.router, "GET", uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_report_rejects_inverted_dates() {
    let app = setup_test_app().await;

    let (status, body) = get(
        &app.router,
        "/api/reports/summary?start_date=2025-10-10&end_date=2025-10-01",
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
