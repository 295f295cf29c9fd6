use crate::common::auth::Role;
use crate::config::Config;
use crate::spray_totals::models::{ReasonNotSprayed, RoofType, SprayStatus, SprayType, WallType};
use sea_orm::{ActiveEnum, Iterable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored values of a string-backed enum, in declaration order
fn options<E: ActiveEnum<Value = String> + Iterable>() -> Vec<String> {
    E::iter().map(|variant| variant.to_value()).collect()
}

/// Option lists the web client renders in its forms
#[derive(ToSchema, Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct FormOptions {
    pub roles: Vec<String>,
    pub spray_types: Vec<String>,
    pub spray_statuses: Vec<String>,
    pub wall_types: Vec<String>,
    pub roof_types: Vec<String>,
    pub reasons_not_sprayed: Vec<String>,
}

#[derive(ToSchema, Deserialize, Serialize, Default, Debug, Clone)]
pub struct UIConfiguration {
    pub app_name: String,
    pub deployment: String,
    pub options: FormOptions,
}

impl UIConfiguration {
    pub fn new(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            deployment: config.deployment.clone(),
            options: FormOptions {
                roles: options::<Role>(),
                spray_types: options::<SprayType>(),
                spray_statuses: options::<SprayStatus>(),
                wall_types: options::<WallType>(),
                roof_types: options::<RoofType>(),
                reasons_not_sprayed: options::<ReasonNotSprayed>(),
            },
        }
    }
}

#[derive(ToSchema, Deserialize, Serialize)]
pub struct HealthCheck {
    pub status: String,
}
