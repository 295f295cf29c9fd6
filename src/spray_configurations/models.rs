use crate::common::errors::validation_db_err;
use crate::districts::models as districts;
use crate::provinces::models as provinces;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Label for a configuration without a province scope
pub const NATIONAL_SCOPE: &str = "Nacional";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "spray_configurations")]
#[crudcrate(
    generate_router,
    api_struct = "SprayConfiguration",
    name_singular = "spray configuration",
    name_plural = "spray configurations",
    description = "Campaign targets for a year, optionally scoped to a province or district.",
    fn_get_one = get_one_configuration,
    fn_get_all = get_all_configurations,
    fn_create = create_configuration,
    fn_update = update_configuration,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, filterable, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable)]
    pub year: i32,
    #[crudcrate(sortable, filterable)]
    pub province_id: Option<Uuid>,
    #[crudcrate(sortable, filterable)]
    pub district_id: Option<Uuid>,
    #[crudcrate(sortable)]
    pub spray_target: i32,
    #[crudcrate(sortable)]
    pub proposed_spray_days: i32,
    #[crudcrate(sortable)]
    pub spray_rounds: i32,
    #[crudcrate(sortable)]
    pub days_between_rounds: i32,
    #[crudcrate(sortable, filterable)]
    pub is_active: bool,
    #[sea_orm(column_type = "Text", nullable)]
    #[crudcrate(fulltext)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub province_name: Option<String>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub district_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::provinces::models::Entity",
        from = "Column::ProvinceId",
        to = "crate::provinces::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Provinces,
    #[sea_orm(
        belongs_to = "crate::districts::models::Entity",
        from = "Column::DistrictId",
        to = "crate::districts::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Districts,
}

impl Related<crate::provinces::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provinces.def()
    }
}

impl Related<crate::districts::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Districts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Range and count rules that need no database access
pub fn check_ranges(candidate: &Model) -> Result<(), DbErr> {
    if !(2000..=2100).contains(&candidate.year) {
        return Err(validation_db_err("year must be between 2000 and 2100"));
    }
    if candidate.spray_target < 0 {
        return Err(validation_db_err("spray_target must not be negative"));
    }
    if candidate.proposed_spray_days < 1 {
        return Err(validation_db_err("proposed_spray_days must be at least 1"));
    }
    if candidate.spray_rounds < 1 {
        return Err(validation_db_err("spray_rounds must be at least 1"));
    }
    if candidate.days_between_rounds < 0 {
        return Err(validation_db_err("days_between_rounds must not be negative"));
    }
    Ok(())
}

async fn validate(db: &DatabaseConnection, active_model: &ActiveModel) -> Result<(), DbErr> {
    let candidate = sea_orm::TryIntoModel::try_into_model(active_model.clone())?;
    check_ranges(&candidate)?;

    if let Some(province_id) = candidate.province_id {
        provinces::require_province(db, province_id).await?;
    }
    if let Some(district_id) = candidate.district_id {
        let district = districts::require_district(db, district_id).await?;
        if candidate
            .province_id
            .is_some_and(|province_id| province_id != district.province_id)
        {
            return Err(validation_db_err(
                "district_id does not belong to the given province",
            ));
        }
    }
    Ok(())
}

pub async fn get_one_configuration(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<SprayConfiguration, DbErr> {
    let model = Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        DbErr::RecordNotFound(format!("Spray configuration with id '{id}' not found"))
    })?;

    let (province_names, district_names) = scope_names(db).await?;
    let mut configuration: SprayConfiguration = model.into();
    configuration.province_name = configuration
        .province_id
        .and_then(|id| province_names.get(&id).cloned());
    configuration.district_name = configuration
        .district_id
        .and_then(|id| district_names.get(&id).cloned());
    Ok(configuration)
}

pub async fn create_configuration(
    db: &DatabaseConnection,
    data: SprayConfigurationCreate,
) -> Result<SprayConfiguration, DbErr> {
    let active_model: ActiveModel = data.into();
    validate(db, &active_model).await?;
    let inserted = active_model.insert(db).await?;
    get_one_configuration(db, inserted.id).await
}

pub async fn update_configuration(
    db: &DatabaseConnection,
    id: Uuid,
    data: SprayConfigurationUpdate,
) -> Result<SprayConfiguration, DbErr> {
    let existing = Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        DbErr::RecordNotFound(format!("Spray configuration with id '{id}' not found"))
    })?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    validate(db, &merged).await?;
    merged.update(db).await?;
    get_one_configuration(db, id).await
}

async fn scope_names(
    db: &DatabaseConnection,
) -> Result<(HashMap<Uuid, String>, HashMap<Uuid, String>), DbErr> {
    let province_names = provinces::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let district_names = districts::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    Ok((province_names, district_names))
}

/// List rows with `province_name` and `district_name` filled
async fn with_scope_names(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<SprayConfigurationList>, DbErr> {
    let (province_names, district_names) = scope_names(db).await?;
    Ok(models
        .into_iter()
        .map(|model| {
            let province_name = model.province_id.and_then(|id| province_names.get(&id).cloned());
            let district_name = model.district_id.and_then(|id| district_names.get(&id).cloned());
            let mut configuration = SprayConfigurationList::from(model);
            configuration.province_name = province_name;
            configuration.district_name = district_name;
            configuration
        })
        .collect())
}

/// Fails unless `id` names an active configuration
pub async fn require_active_configuration(db: &DatabaseConnection, id: Uuid) -> Result<Model, DbErr> {
    match Entity::find_by_id(id).one(db).await? {
        Some(configuration) if configuration.is_active => Ok(configuration),
        Some(_) => Err(validation_db_err(format!(
            "spray_configuration_id '{id}' is not an active configuration"
        ))),
        None => Err(validation_db_err(format!(
            "spray_configuration_id '{id}' does not exist"
        ))),
    }
}

/// Newest campaign years first unless a sortable column is requested
async fn get_all_configurations(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<SprayConfigurationList>, DbErr> {
    let (order_column, order_direction) = match order_column {
        Column::Id => (Column::Year, Order::Desc),
        column => (column, order_direction),
    };

    let models = Entity::find()
        .filter(condition.clone())
        .order_by(order_column, order_direction)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    with_scope_names(db, models).await
}
