use crate::common::test_helpers::{delete, extract_response_body, get, post, put, send};
use crate::config::test_helpers::setup_test_app;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_login_me_logout_cycle() {
    let app = setup_test_app().await;

    let (status, created) = post(
        &app.router,
        "/api/users",
        &app.admin.token,
        json!({
            "username": "field.supervisor",
            "full_name": "Field Supervisor",
            "password": "s3cret-pass",
            "role": "SUPERVISOR"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create user: {created:?}");
    assert!(created.get("password_hash").is_none());
    assert!(created.get("password").is_none());
    assert_eq!(created["is_active"], true);

    let response = send(
        &app.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "field.supervisor", "password": "s3cret-pass"})),
    )
    .await;
    let (status, login) = extract_response_body(response).await;
    assert_eq!(status, StatusCode::OK, "Login failed: {login:?}");
    let token = login["token"].as_str().unwrap().to_string();
    assert_eq!(login["user"]["role"], "SUPERVISOR");

    let (status, me) = get(&app.router, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "field.supervisor");

    let logout = send(&app.router, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let (status, _) = get(&app.router, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = setup_test_app().await;

    post(
        &app.router,
        "/api/users",
        &app.admin.token,
        json!({
            "username": "sprayer.one",
            "full_name": "Sprayer One",
            "password": "right-password",
            "role": "SPRAYER"
        }),
    )
    .await;

    for (username, password) in [
        ("sprayer.one", "wrong-password"),
        ("nobody", "right-password"),
        // Test accounts carry a placeholder hash
        ("admin", "anything-at-all"),
    ] {
        let response = send(
            &app.router,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await;
        let (status, body) = extract_response_body(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{username}: {body:?}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_inactive_user_cannot_log_in() {
    let app = setup_test_app().await;

    let (_, created) = post(
        &app.router,
        "/api/users",
        &app.admin.token,
        json!({
            "username": "retired",
            "full_name": "Retired User",
            "password": "long-enough",
            "role": "SPRAYER",
            "is_active": false
        }),
    )
    .await;
    assert_eq!(created["is_active"], false);

    let response = send(
        &app.router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "retired", "password": "long-enough"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivation_ends_sessions() {
    let app = setup_test_app().await;

    let (status, _) = put(
        &app.router,
        &format!("/api/users/{}", app.sprayer.id),
        &app.admin.token,
        json!({"is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, "/api/auth/me", &app.sprayer.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthorized() {
    let app = setup_test_app().await;

    let response = send(&app.router, "GET", "/api/provinces", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app.router, "/api/provinces", "not-a-real-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "Unauthorized");
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = setup_test_app().await;

    for token in [&app.supervisor.token, &app.sprayer.token] {
        let (status, _) = get(&app.router, "/api/users", token).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, users) = get(&app.router, "/api/users", &app.admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_user_validation() {
    let app = setup_test_app().await;

    let (status, body) = post(
        &app.router,
        "/api/users",
        &app.admin.token,
        json!({
            "username": "shorty",
            "full_name": "Short Password",
            "password": "1234567",
            "role": "SPRAYER"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("password"));

    let (status, body) = post(
        &app.router,
        "/api/users",
        &app.admin.token,
        json!({
            "username": "sprayer",
            "full_name": "Duplicate Username",
            "password": "long-enough",
            "role": "SPRAYER"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body:?}");
    assert_eq!(body["error"]["code"], "DUPLICATE_RESOURCE");
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = setup_test_app().await;

    let status = delete(
        &app.router,
        &format!("/api/users/{}", app.admin.id),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = delete(
        &app.router,
        &format!("/api/users/{}", app.supervisor.id),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(
        &app.router,
        &format!("/api/users/{}", app.supervisor.id),
        &app.admin.token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Sessions cascade with the account
    let (status, _) = get(&app.router, "/api/auth/me", &app.supervisor.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bootstrap_admin_only_on_empty_table() {
    use crate::config::Config;
    use crate::config::test_helpers::setup_test_db;
    use crate::users::services::ensure_bootstrap_admin;

    let db = setup_test_db().await;
    let mut config = Config::for_tests();
    config.bootstrap_admin_username = Some("root".to_string());
    config.bootstrap_admin_password = Some("bootstrap-pass".to_string());

    let created = ensure_bootstrap_admin(&db, &config).await.unwrap();
    assert_eq!(created.unwrap().username, "root");

    let second = ensure_bootstrap_admin(&db, &config).await.unwrap();
    assert!(second.is_none());
}
