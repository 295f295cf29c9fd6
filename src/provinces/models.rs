use crate::common::errors::validation_db_err;
use crate::common::validation::{normalize_name, validate_code};
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "provinces")]
#[crudcrate(
    generate_router,
    api_struct = "Province",
    name_singular = "province",
    name_plural = "provinces",
    description = "Provinces are the top level of the campaign geography. Each province contains districts.",
    fn_get_all = get_all_provinces,
    fn_create = create_province,
    fn_update = update_province,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, filterable, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[sea_orm(unique)]
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub code: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::districts::models::Entity")]
    Districts,
}

impl Related<crate::districts::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Districts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Provinces sort by name unless a sortable column is requested
async fn get_all_provinces(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<ProvinceList>, DbErr> {
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

    Ok(models.into_iter().map(ProvinceList::from).collect())
}

/// Validates name and code on a fully populated active model
fn validate(mut active_model: ActiveModel) -> Result<ActiveModel, DbErr> {
    let candidate = sea_orm::TryIntoModel::try_into_model(active_model.clone())?;
    validate_code(candidate.code.as_deref())?;
    let name = normalize_name(&candidate.name)?;
    if name != candidate.name {
        active_model.name = sea_orm::ActiveValue::Set(name);
    }
    Ok(active_model)
}

pub async fn create_province(db: &DatabaseConnection, data: ProvinceCreate) -> Result<Province, DbErr> {
    let active_model: ActiveModel = data.into();
    let inserted = validate(active_model)?.insert(db).await?;
    Ok(inserted.into())
}

pub async fn update_province(
    db: &DatabaseConnection,
    id: Uuid,
    data: ProvinceUpdate,
) -> Result<Province, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Province with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    let updated = validate(merged)?.update(db).await?;
    Ok(updated.into())
}

/// Loads a province or reports the missing parent as invalid input
pub async fn require_province(db: &DatabaseConnection, id: Uuid) -> Result<Model, DbErr> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| validation_db_err(format!("province_id '{id}' does not exist")))
}
