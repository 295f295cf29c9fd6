use crate::common::errors::validation_db_err;
use crate::common::validation::{normalize_name, validate_code};
use crate::districts::models as districts;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "localities")]
#[crudcrate(
    generate_router,
    api_struct = "Locality",
    name_singular = "locality",
    name_plural = "localities",
    description = "Localities group communities within a district.",
    fn_get_one = get_one_locality,
    fn_get_all = get_all_localities,
    fn_create = create_locality,
    fn_update = update_locality,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, filterable, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub code: Option<String>,
    #[crudcrate(sortable, filterable)]
    pub district_id: Uuid,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub district_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::districts::models::Entity",
        from = "Column::DistrictId",
        to = "crate::districts::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Districts,
    #[sea_orm(has_many = "crate::communities::models::Entity")]
    Communities,
}

impl Related<crate::districts::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Districts.def()
    }
}

impl Related<crate::communities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Communities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validates a fully populated active model, including its parent
async fn validate(db: &DatabaseConnection, mut active_model: ActiveModel) -> Result<ActiveModel, DbErr> {
    let candidate = sea_orm::TryIntoModel::try_into_model(active_model.clone())?;
    validate_code(candidate.code.as_deref())?;
    let name = normalize_name(&candidate.name)?;
    if name != candidate.name {
        active_model.name = sea_orm::ActiveValue::Set(name);
    }
    districts::require_district(db, candidate.district_id).await?;
    Ok(active_model)
}

pub async fn get_one_locality(db: &DatabaseConnection, id: Uuid) -> Result<Locality, DbErr> {
    let (model, district) = Entity::find_by_id(id)
        .find_also_related(districts::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Locality with id '{id}' not found")))?;

    let mut locality: Locality = model.into();
    locality.district_name = district.map(|d| d.name);
    Ok(locality)
}

pub async fn create_locality(db: &DatabaseConnection, data: LocalityCreate) -> Result<Locality, DbErr> {
    let active_model: ActiveModel = data.into();
    let inserted = validate(db, active_model).await?.insert(db).await?;
    get_one_locality(db, inserted.id).await
}

pub async fn update_locality(
    db: &DatabaseConnection,
    id: Uuid,
    data: LocalityUpdate,
) -> Result<Locality, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Locality with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    validate(db, merged).await?.update(db).await?;
    get_one_locality(db, id).await
}

/// Loads a locality or reports the missing parent as invalid input
pub async fn require_locality(db: &DatabaseConnection, id: Uuid) -> Result<Model, DbErr> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| validation_db_err(format!("locality_id '{id}' does not exist")))
}

/// List rows with `district_name` filled from one lookup query
async fn with_district_names(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<LocalityList>, DbErr> {
    let district_ids: Vec<Uuid> = models.iter().map(|m| m.district_id).collect();
    let names: HashMap<Uuid, String> = districts::Entity::find()
        .filter(districts::Column::Id.is_in(district_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let district_name = names.get(&model.district_id).cloned();
            let mut locality = LocalityList::from(model);
            locality.district_name = district_name;
            locality
        })
        .collect())
}

/// Localities sort by name unless a sortable column is requested
async fn get_all_localities(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<LocalityList>, DbErr> {
    let (order_column, order_direction) = match order_column {
        Column::Id => (Column::Name, Order::Asc),
        column => (column, order_direction),
    };

    let models = Entity::find()
        .filter(condition.clone())
        .order_by(order_column, order_direction)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    with_district_names(db, models).await
}
