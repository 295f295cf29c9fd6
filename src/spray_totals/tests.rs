use crate::common::test_helpers::{
    create_actor, create_actor_type, create_configuration, create_field_team, create_hierarchy,
    create_spray_total, delete, extract_response_body, filter_query, get, post, put, send,
    spray_total_payload,
};
use crate::config::test_helpers::setup_test_app;
use axum::http::{StatusCode, header::CONTENT_RANGE};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_applies_defaults_and_names() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;

    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 100, 80);
    payload.as_object_mut().unwrap().remove("structures_not_sprayed");
    let body = create_spray_total(&app, &app.sprayer.token, payload).await;

    assert_eq!(body["structures_not_sprayed"], 20);
    assert_eq!(body["spray_year"], 2025);
    assert_eq!(body["spray_round"], 1);
    assert_eq!(body["spray_status"], "PLANNED");
    assert_eq!(body["created_by"], app.sprayer.id.to_string());
    assert_eq!(body["community_name"], "Gaza Community");
    assert_eq!(body["sprayer_name"], "Joao Sprayer");
    assert_eq!(body["brigade_chief_name"], "Maria Chief");
    assert!(body.get("is_deleted").is_none());
}

#[tokio::test]
async fn test_create_rejects_inconsistent_counts() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;

    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 100, 80);
    payload["structures_not_sprayed"] = json!(15);
    let (status, body) = post(&app.router, "/api/spray-totals", &app.sprayer.token, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 12);
    let (status, _) = post(&app.router, "/api/spray-totals", &app.sprayer.token, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Sprayed above found leaves a negative remainder");

    let (status, list) = get(&app.router, "/api/spray-totals", &app.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_validates_references() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;

    let mut unknown_community = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 10);
    unknown_community["community_id"] = json!(Uuid::new_v4());

    let mut unknown_sprayer = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 10);
    unknown_sprayer["sprayer_id"] = json!(Uuid::new_v4());

    let mut unknown_configuration = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 10);
    unknown_configuration["spray_configuration_id"] = json!(Uuid::new_v4());

    for (label, payload) in [
        ("community", unknown_community),
        ("sprayer", unknown_sprayer),
        ("configuration", unknown_configuration),
    ] {
        let (status, body) =
            post(&app.router, "/api/spray-totals", &app.sprayer.token, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{label}: {body:?}");
    }

    // Inactive actors cannot record new work
    let chief_type = create_actor_type(&app, "Retired Chief").await;
    let retired = create_actor(&app, chief_type, "Old Chief").await;
    let (status, _) = put(
        &app.router,
        &format!("/api/actors/{retired}"),
        &app.admin.token,
        json!({"is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 10);
    payload["brigade_chief_id"] = json!(retired);
    let (status, body) = post(&app.router, "/api/spray-totals", &app.sprayer.token, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("brigade_chief_id"));
}

#[tokio::test]
async fn test_create_links_active_configuration() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let configuration_id = create_configuration(&app, 2025, Some(hierarchy.province_id), 500).await;

    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 9);
    payload["spray_configuration_id"] = json!(configuration_id);
    let body = create_spray_total(&app, &app.sprayer.token, payload).await;
    assert_eq!(body["spray_configuration_id"], configuration_id.to_string());

    let (status, _) = put(
        &app.router,
        &format!("/api/spray-configurations/{configuration_id}"),
        &app.admin.token,
        json!({"is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-07", 10, 9);
    payload["spray_configuration_id"] = json!(configuration_id);
    let (status, _) = post(&app.router, "/api/spray-totals", &app.sprayer.token, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_recomputes_and_validates() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let created = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 100, 80),
    )
    .await;
    let uri = format!("/api/spray-totals/{}", created["id"].as_str().unwrap());

    let (status, body) = put(
        &app.router,
        &uri,
        &app.sprayer.token,
        json!({"structures_found": 60, "structures_sprayed": 55, "notes": "finished early"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body["structures_not_sprayed"], 5);
    assert_eq!(body["notes"], "finished early");
    assert_eq!(body["updated_by"], app.sprayer.id.to_string());
    assert_eq!(body["insecticide"], "Actellic 300CS");

    // Found alone no longer matches the stored sprayed + not sprayed
    let (status, _) = put(&app.router, &uri, &app.sprayer.token, json!({"structures_found": 70})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = put(
        &app.router,
        &uri,
        &app.supervisor.token,
        json!({"community_id": Uuid::new_v4()}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");

    let (status, body) = put(&app.router, &uri, &app.supervisor.token, json!({"notes": null})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["notes"].is_null());
    assert_eq!(body["structures_found"], 60);
}

#[tokio::test]
async fn test_sprayer_cannot_touch_other_records() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let created = create_spray_total(
        &app,
        &app.supervisor.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 8),
    )
    .await;
    let uri = format!("/api/spray-totals/{}", created["id"].as_str().unwrap());

    let (status, body) = put(&app.router, &uri, &app.sprayer.token, json!({"notes": "mine now"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let status = delete(&app.router, &uri, &app.sprayer.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get(&app.router, &uri, &app.sprayer.token).await;
    assert_eq!(status, StatusCode::OK, "Reads stay open to every role");
    assert!(body["notes"].is_null());

    let (status, _) = put(&app.router, &uri, &app.admin.token, json!({"notes": "checked"})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_soft_delete_hides_record() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let kept = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 8),
    )
    .await;
    let removed = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-07", 12, 12),
    )
    .await;
    let uri = format!("/api/spray-totals/{}", removed["id"].as_str().unwrap());

    let status = delete(&app.router, &uri, &app.supervisor.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app.router, &uri, &app.admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = delete(&app.router, &uri, &app.supervisor.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "A deleted record cannot be deleted twice");

    let response = send(&app.router, "GET", "/api/spray-totals", Some(&app.admin.token), None).await;
    assert_eq!(response.headers()[CONTENT_RANGE], "spray totals 0-1/1");
    let (_, list) = extract_response_body(response).await;
    assert_eq!(list[0]["id"], kept["id"]);

    // The stored row keeps its audit trail
    use crate::spray_totals::models::Entity as SprayTotals;
    use sea_orm::EntityTrait;
    let row = SprayTotals::find_by_id(Uuid::parse_str(removed["id"].as_str().unwrap()).unwrap())
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_deleted);
    assert_eq!(row.deleted_by, Some(app.supervisor.id));
    assert!(row.deleted_at.is_some());
}

#[tokio::test]
async fn test_completed_record_cannot_be_deleted() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let mut payload = spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 10);
    payload["spray_status"] = json!("COMPLETED");
    let created = create_spray_total(&app, &app.sprayer.token, payload).await;
    let uri = format!("/api/spray-totals/{}", created["id"].as_str().unwrap());

    let response = send(&app.router, "DELETE", &uri, Some(&app.admin.token), None).await;
    let (status, body) = extract_response_body(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = get(&app.router, &uri, &app.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spray_status"], "COMPLETED");
    assert_eq!(body["last_updated"], created["last_updated"]);
}

#[tokio::test]
async fn test_bulk_delete_reports_each_id() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;

    let planned = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 8),
    )
    .await;
    let mut completed_payload = spray_total_payload(&hierarchy, &team, "2025-10-07", 10, 10);
    completed_payload["spray_status"] = json!("COMPLETED");
    let completed = create_spray_total(&app, &app.sprayer.token, completed_payload).await;
    let missing = Uuid::new_v4();

    let response = send(
        &app.router,
        "DELETE",
        "/api/spray-totals",
        Some(&app.supervisor.token),
        Some(json!([planned["id"], completed["id"], missing])),
    )
    .await;
    let (status, body) = extract_response_body(response).await;
    assert_eq!(status, StatusCode::OK, "{body:?}");
    assert_eq!(body["deleted"], json!([planned["id"]]));

    let failed: Vec<&str> = body["failed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|failure| failure["id"].as_str().unwrap())
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&completed["id"].as_str().unwrap()));
    assert!(failed.contains(&missing.to_string().as_str()));

    let response = send(
        &app.router,
        "DELETE",
        "/api/spray-totals",
        Some(&app.sprayer.token),
        Some(json!([completed["id"]])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_filters() {
    let app = setup_test_app().await;
    let gaza = create_hierarchy(&app, "Gaza").await;
    let tete = create_hierarchy(&app, "Tete").await;
    let team = create_field_team(&app).await;

    create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&gaza, &team, "2025-10-06", 10, 8),
    )
    .await;
    let mut secondary = spray_total_payload(&tete, &team, "2024-11-02", 20, 20);
    secondary["spray_type"] = json!("SECUNDARIA");
    secondary["spray_status"] = json!("IN_PROGRESS");
    create_spray_total(&app, &app.supervisor.token, secondary).await;

    let cases = [
        (json!({"community_id": tete.community_id}), 1),
        (json!({"spray_type": "SECUNDARIA"}), 1),
        (json!({"spray_status": "IN_PROGRESS"}), 1),
        (json!({"spray_status_neq": "PLANNED"}), 1),
        (json!({"spray_year": 2025}), 1),
        (json!({"spray_round": 1}), 2),
        (json!({"sprayer_id": team.sprayer_id}), 2),
        (json!({"created_by": app.supervisor.id}), 1),
        (json!({"q": "actellic"}), 2),
    ];
    for (filter, expected) in cases {
        let (status, body) = get(
            &app.router,
            &format!("/api/spray-totals?{}", filter_query(&filter)),
            &app.sprayer.token,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{filter}: {body:?}");
        assert_eq!(body.as_array().unwrap().len(), expected, "{filter}");
    }

    let (status, body) = get(
        &app.router,
        &format!("/api/spray-totals?{}", filter_query(&json!({"is_deleted": true}))),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.as_array().unwrap().len(),
        2,
        "Deleted rows cannot be filtered back in"
    );
}

#[tokio::test]
async fn test_extreme_counts_are_rejected() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;

    let mut overflowing = spray_total_payload(&hierarchy, &team, "2025-10-06", 5, 0);
    overflowing["structures_sprayed"] = json!(i32::MAX);
    overflowing["structures_not_sprayed"] = json!(1);
    let (status, body) = post(&app.router, "/api/spray-totals", &app.sprayer.token, overflowing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut minimum = spray_total_payload(&hierarchy, &team, "2025-10-06", 5, 0);
    minimum["structures_found"] = json!(i32::MIN);
    minimum.as_object_mut().unwrap().remove("structures_not_sprayed");
    let (status, body) = post(&app.router, "/api/spray-totals", &app.sprayer.token, minimum).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
    assert!(body["error"]["message"].as_str().unwrap().contains("structures_found"));

    let created = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 8),
    )
    .await;
    let uri = format!("/api/spray-totals/{}", created["id"].as_str().unwrap());
    let (status, body) = put(
        &app.router,
        &uri,
        &app.sprayer.token,
        json!({"structures_found": i32::MIN, "structures_sprayed": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");

    let (status, body) = get(&app.router, &uri, &app.sprayer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["structures_found"], 10);
}

#[tokio::test]
async fn test_update_after_delete_is_not_found() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    let created = create_spray_total(
        &app,
        &app.sprayer.token,
        spray_total_payload(&hierarchy, &team, "2025-10-06", 10, 8),
    )
    .await;
    let uri = format!("/api/spray-totals/{}", created["id"].as_str().unwrap());

    let status = delete(&app.router, &uri, &app.supervisor.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = put(&app.router, &uri, &app.admin.token, json!({"notes": "late edit"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body:?}");

    use crate::spray_totals::models::Entity as SprayTotals;
    use sea_orm::EntityTrait;
    let row = SprayTotals::find_by_id(Uuid::parse_str(created["id"].as_str().unwrap()).unwrap())
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_deleted);
    assert!(row.notes.is_none());
}

#[tokio::test]
async fn test_list_paging_and_sorting() {
    let app = setup_test_app().await;
    let hierarchy = create_hierarchy(&app, "Gaza").await;
    let team = create_field_team(&app).await;
    for (day, found) in [("2025-10-06", 10), ("2025-10-08", 30), ("2025-10-07", 20)] {
        create_spray_total(
            &app,
            &app.sprayer.token,
            spray_total_payload(&hierarchy, &team, day, found, found),
        )
        .await;
    }

    let (status, body) = get(&app.router, "/api/spray-totals", &app.sprayer.token).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["spray_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, ["2025-10-08", "2025-10-07", "2025-10-06"], "Newest first by default");

    let response = send(
        &app.router,
        "GET",
        "/api/spray-totals?sort=%5B%22structures_found%22%2C%22ASC%22%5D&range=%5B0%2C1%5D",
        Some(&app.sprayer.token),
        None,
    )
    .await;
    assert_eq!(response.headers()[CONTENT_RANGE], "spray totals 0-1/3");
    let (_, body) = extract_response_body(response).await;
    assert_eq!(body[0]["structures_found"], 10);
    assert_eq!(body[1]["structures_found"], 20);

    let (status, body) = get(
        &app.router,
        "/api/spray-totals?range=%5B0%2C18446744073709551615%5D",
        &app.sprayer.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
}
