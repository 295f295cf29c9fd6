use crate::common::errors::validation_db_err;
use crate::common::validation::{normalize_name, validate_code};
use crate::provinces::models as provinces;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "districts")]
#[crudcrate(
    generate_router,
    api_struct = "District",
    name_singular = "district",
    name_plural = "districts",
    description = "Districts subdivide a province and contain localities.",
    fn_get_one = get_one_district,
    fn_get_all = get_all_districts,
    fn_create = create_district,
    fn_update = update_district,
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
    pub province_id: Uuid,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub province_name: Option<String>,
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
    #[sea_orm(has_many = "crate::localities::models::Entity")]
    Localities,
}

impl Related<crate::provinces::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provinces.def()
    }
}

impl Related<crate::localities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Localities.def()
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
    provinces::require_province(db, candidate.province_id).await?;
    Ok(active_model)
}

pub async fn get_one_district(db: &DatabaseConnection, id: Uuid) -> Result<District, DbErr> {
    let (model, province) = Entity::find_by_id(id)
        .find_also_related(provinces::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("District with id '{id}' not found")))?;

    let mut district: District = model.into();
    district.province_name = province.map(|p| p.name);
    Ok(district)
}

pub async fn create_district(db: &DatabaseConnection, data: DistrictCreate) -> Result<District, DbErr> {
    let active_model: ActiveModel = data.into();
    let inserted = validate(db, active_model).await?.insert(db).await?;
    get_one_district(db, inserted.id).await
}

pub async fn update_district(
    db: &DatabaseConnection,
    id: Uuid,
    data: DistrictUpdate,
) -> Result<District, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("District with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    validate(db, merged).await?.update(db).await?;
    get_one_district(db, id).await
}

/// Loads a district or reports the missing parent as invalid input
pub async fn require_district(db: &DatabaseConnection, id: Uuid) -> Result<Model, DbErr> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| validation_db_err(format!("district_id '{id}' does not exist")))
}

/// List rows with `province_name` filled from one lookup query
async fn with_province_names(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<DistrictList>, DbErr> {
    let province_ids: Vec<Uuid> = models.iter().map(|m| m.province_id).collect();
    let names: HashMap<Uuid, String> = provinces::Entity::find()
        .filter(provinces::Column::Id.is_in(province_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let province_name = names.get(&model.province_id).cloned();
            let mut district = DistrictList::from(model);
            district.province_name = province_name;
            district
        })
        .collect())
}

/// Districts sort by name unless a sortable column is requested
async fn get_all_districts(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<DistrictList>, DbErr> {
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

    with_province_names(db, models).await
}
