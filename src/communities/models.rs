use crate::common::errors::validation_db_err;
use crate::common::validation::{normalize_name, validate_code};
use crate::localities::models as localities;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "communities")]
#[crudcrate(
    generate_router,
    api_struct = "Community",
    name_singular = "community",
    name_plural = "communities",
    description = "Communities are the villages or neighbourhoods where spraying is recorded.",
    fn_get_one = get_one_community,
    fn_get_all = get_all_communities,
    fn_create = create_community,
    fn_update = update_community,
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
    pub locality_id: Uuid,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub locality_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::localities::models::Entity",
        from = "Column::LocalityId",
        to = "crate::localities::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Localities,
    #[sea_orm(has_many = "crate::spray_totals::models::Entity")]
    SprayTotals,
}

impl Related<crate::localities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Localities.def()
    }
}

impl Related<crate::spray_totals::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SprayTotals.def()
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
    localities::require_locality(db, candidate.locality_id).await?;
    Ok(active_model)
}

pub async fn get_one_community(db: &DatabaseConnection, id: Uuid) -> Result<Community, DbErr> {
    let (model, locality) = Entity::find_by_id(id)
        .find_also_related(localities::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Community with id '{id}' not found")))?;

    let mut community: Community = model.into();
    community.locality_name = locality.map(|l| l.name);
    Ok(community)
}

pub async fn create_community(db: &DatabaseConnection, data: CommunityCreate) -> Result<Community, DbErr> {
    let active_model: ActiveModel = data.into();
    let inserted = validate(db, active_model).await?.insert(db).await?;
    get_one_community(db, inserted.id).await
}

pub async fn update_community(
    db: &DatabaseConnection,
    id: Uuid,
    data: CommunityUpdate,
) -> Result<Community, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Community with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    validate(db, merged).await?.update(db).await?;
    get_one_community(db, id).await
}

/// Loads a community or reports the missing parent as invalid input
pub async fn require_community(db: &DatabaseConnection, id: Uuid) -> Result<Model, DbErr> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| validation_db_err(format!("community_id '{id}' does not exist")))
}

/// List rows with `locality_name` filled from one lookup query
async fn with_locality_names(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<CommunityList>, DbErr> {
    let locality_ids: Vec<Uuid> = models.iter().map(|m| m.locality_id).collect();
    let names: HashMap<Uuid, String> = localities::Entity::find()
        .filter(localities::Column::Id.is_in(locality_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let locality_name = names.get(&model.locality_id).cloned();
            let mut community = CommunityList::from(model);
            community.locality_name = locality_name;
            community
        })
        .collect())
}

/// Communities sort by name unless a sortable column is requested
async fn get_all_communities(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<CommunityList>, DbErr> {
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

    with_locality_names(db, models).await
}
