use crate::common::state::AppState;
use crate::config::Config;
use crate::{
    actor_types, actors, communities, dashboard, districts, localities, provinces, reports,
    spray_configurations, spray_totals, users,
};
use axum::{Router, extract::DefaultBodyLimit};
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub fn build_router(db: &DatabaseConnection, config: &Config) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        modifiers(&SecurityAddon),
        security(
            ("bearerAuth" = [])
        )
    )]
    struct ApiDoc;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "bearerAuth",
                    utoipa::openapi::security::SecurityScheme::Http(
                        utoipa::openapi::security::HttpBuilder::new()
                            .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                            .description(Some("Session token from POST /api/auth/login"))
                            .build(),
                    ),
                );
            }
        }
    }

    let app_state: AppState = AppState::new(db.clone(), config.clone());

    // Build the router with OpenAPI documentation
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Public routes
        .nest("/api/auth", users::views::auth_router(&app_state))
        .nest("/api/users", users::views::router(&app_state))
        .nest("/api/provinces", provinces::views::router(&app_state))
        .nest("/api/districts", districts::views::router(&app_state))
        .nest("/api/localities", localities::views::router(&app_state))
        .nest("/api/communities", communities::views::router(&app_state))
        .nest("/api/actor-types", actor_types::views::router(&app_state))
        .nest("/api/actors", actors::views::router(&app_state))
        .nest(
            "/api/spray-configurations",
            spray_configurations::views::router(&app_state),
        )
        .nest("/api/spray-totals", spray_totals::views::router(&app_state))
        .nest("/api/reports", reports::views::router(&app_state))
        .nest("/api/dashboard", dashboard::views::router(&app_state))
        .split_for_parts();

    router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
}
