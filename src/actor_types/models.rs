use crate::common::validation::normalize_name;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "actor_types")]
#[crudcrate(
    generate_router,
    api_struct = "ActorType",
    name_singular = "actor type",
    name_plural = "actor types",
    description = "Kinds of field staff, for example sprayers and brigade chiefs.",
    fn_get_all = get_all_actor_types,
    fn_create = create_actor_type,
    fn_update = update_actor_type,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, filterable, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[sea_orm(unique)]
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    #[crudcrate(filterable)]
    pub description: Option<String>,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::actors::models::Entity")]
    Actors,
}

impl Related<crate::actors::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn normalized(mut active_model: ActiveModel) -> Result<ActiveModel, DbErr> {
    let candidate = sea_orm::TryIntoModel::try_into_model(active_model.clone())?;
    active_model.name = sea_orm::ActiveValue::Set(normalize_name(&candidate.name)?);
    Ok(active_model)
}

pub async fn create_actor_type(
    db: &DatabaseConnection,
    data: ActorTypeCreate,
) -> Result<ActorType, DbErr> {
    let active_model: ActiveModel = data.into();
    Ok(normalized(active_model)?.insert(db).await?.into())
}

pub async fn update_actor_type(
    db: &DatabaseConnection,
    id: Uuid,
    data: ActorTypeUpdate,
) -> Result<ActorType, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Actor type with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    Ok(normalized(merged)?.update(db).await?.into())
}

async fn get_all_actor_types(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<ActorTypeList>, DbErr> {
    let (order_column, order_direction) = match order_column {
        Column::Id => (Column::Name, Order::Asc),
        column => (column, order_direction),
    };

    Ok(Entity::find()
        .filter(condition.clone())
        .order_by(order_column, order_direction)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(ActorTypeList::from)
        .collect())
}
