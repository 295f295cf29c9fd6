use crate::actor_types::models as actor_types;
use crate::common::errors::validation_db_err;
use crate::common::validation::normalize_name;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, EntityToModels, traits::MergeIntoActiveModel};
use sea_orm::{
    ActiveModelTrait, IntoActiveModel, Order, QueryOrder, QuerySelect, entity::prelude::*,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, EntityToModels)]
#[sea_orm(table_name = "actors")]
#[crudcrate(
    generate_router,
    api_struct = "Actor",
    name_singular = "actor",
    name_plural = "actors",
    description = "Field staff recorded on spray totals, such as sprayers and brigade chiefs. Actors are not user accounts.",
    fn_get_one = get_one_actor,
    fn_get_all = get_all_actors,
    fn_create = create_actor,
    fn_update = update_actor,
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[crudcrate(primary_key, filterable, update_model = false, create_model = false, on_create = Uuid::new_v4())]
    pub id: Uuid,
    #[crudcrate(sortable, filterable, fulltext)]
    pub name: String,
    #[crudcrate(sortable, filterable)]
    pub number: Option<String>,
    #[crudcrate(sortable, filterable)]
    pub is_active: bool,
    #[crudcrate(sortable, filterable)]
    pub actor_type_id: Uuid,
    #[crudcrate(update_model = false, create_model = false, on_create = chrono::Utc::now(), sortable)]
    pub created_at: DateTime<Utc>,
    #[crudcrate(update_model = false, create_model = false, on_update = chrono::Utc::now(), on_create = chrono::Utc::now(), sortable)]
    pub last_updated: DateTime<Utc>,
    #[sea_orm(ignore)]
    #[crudcrate(non_db_attr = true, default = None, create_model = false, update_model = false)]
    pub actor_type_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::actor_types::models::Entity",
        from = "Column::ActorTypeId",
        to = "crate::actor_types::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    ActorTypes,
}

impl Related<crate::actor_types::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActorTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

async fn validate(db: &DatabaseConnection, mut active_model: ActiveModel) -> Result<ActiveModel, DbErr> {
    let candidate = sea_orm::TryIntoModel::try_into_model(active_model.clone())?;
    active_model.name = sea_orm::ActiveValue::Set(normalize_name(&candidate.name)?);

    if actor_types::Entity::find_by_id(candidate.actor_type_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(validation_db_err(format!(
            "actor_type_id '{}' does not exist",
            candidate.actor_type_id
        )));
    }
    Ok(active_model)
}

pub async fn get_one_actor(db: &DatabaseConnection, id: Uuid) -> Result<Actor, DbErr> {
    let (model, actor_type) = Entity::find_by_id(id)
        .find_also_related(actor_types::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Actor with id '{id}' not found")))?;

    let mut actor: Actor = model.into();
    actor.actor_type_name = actor_type.map(|t| t.name);
    Ok(actor)
}

pub async fn create_actor(db: &DatabaseConnection, data: ActorCreate) -> Result<Actor, DbErr> {
    let active_model: ActiveModel = data.into();
    let inserted = validate(db, active_model).await?.insert(db).await?;
    get_one_actor(db, inserted.id).await
}

pub async fn update_actor(db: &DatabaseConnection, id: Uuid, data: ActorUpdate) -> Result<Actor, DbErr> {
    let existing = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Actor with id '{id}' not found")))?;

    let merged = data.merge_into_activemodel(existing.into_active_model())?;
    validate(db, merged).await?.update(db).await?;
    get_one_actor(db, id).await
}

/// Fails with a validation error naming `field` unless `id` is an active actor
pub async fn require_active_actor(
    db: &DatabaseConnection,
    id: Uuid,
    field: &str,
) -> Result<Model, DbErr> {
    match Entity::find_by_id(id).one(db).await? {
        Some(actor) if actor.is_active => Ok(actor),
        Some(_) => Err(validation_db_err(format!("{field} '{id}' is not an active actor"))),
        None => Err(validation_db_err(format!("{field} '{id}' does not exist"))),
    }
}

/// List rows with `actor_type_name` filled from one lookup query
async fn with_type_names(
    db: &DatabaseConnection,
    models: Vec<Model>,
) -> Result<Vec<ActorList>, DbErr> {
    let names: HashMap<Uuid, String> = actor_types::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let actor_type_name = names.get(&model.actor_type_id).cloned();
            let mut actor = ActorList::from(model);
            actor.actor_type_name = actor_type_name;
            actor
        })
        .collect())
}

/// Actors sort by name and carry their type name
async fn get_all_actors(
    db: &DatabaseConnection,
    condition: &sea_orm::Condition,
    order_column: Column,
    order_direction: Order,
    offset: u64,
    limit: u64,
) -> Result<Vec<ActorList>, DbErr> {
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

    with_type_names(db, models).await
}
