use crate::actors::models as actors;
use crate::common::errors::validation_db_err;
use crate::communities::models as communities;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use crudcrate::{CRUDResource, traits::MergeIntoActiveModel};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{Condition, Order, PaginatorTrait, QueryOrder, QuerySelect, entity::prelude::*};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprayType {
    #[sea_orm(string_value = "PRINCIPAL")]
    Principal,
    #[sea_orm(string_value = "SECUNDARIA")]
    Secundaria,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprayStatus {
    #[sea_orm(string_value = "PLANNED")]
    Planned,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WallType {
    #[sea_orm(string_value = "MATOPE")]
    Matope,
    #[sea_orm(string_value = "BLOCO")]
    Bloco,
    #[sea_orm(string_value = "CANICO")]
    Canico,
    #[sea_orm(string_value = "MADEIRA")]
    Madeira,
    #[sea_orm(string_value = "ZINCO")]
    Zinco,
    #[sea_orm(string_value = "OUTRO")]
    Outro,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoofType {
    #[sea_orm(string_value = "CAPIM")]
    Capim,
    #[sea_orm(string_value = "ZINCO")]
    Zinco,
    #[sea_orm(string_value = "LUSALITE")]
    Lusalite,
    #[sea_orm(string_value = "TELHA")]
    Telha,
    #[sea_orm(string_value = "BETAO")]
    Betao,
    #[sea_orm(string_value = "OUTRO")]
    Outro,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonNotSprayed {
    #[sea_orm(string_value = "RECUSA")]
    Recusa,
    #[sea_orm(string_value = "FECHADA")]
    Fechada,
    #[sea_orm(string_value = "DOENTE")]
    Doente,
    #[sea_orm(string_value = "FUNERAL")]
    Funeral,
    #[sea_orm(string_value = "OUTRO")]
    Outro,
}

/// One record of spraying activity in a community on a given day
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "spray_totals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sprayer_id: Uuid,
    pub brigade_chief_id: Uuid,
    pub community_id: Uuid,
    pub spray_configuration_id: Option<Uuid>,
    pub spray_type: SprayType,
    pub spray_date: NaiveDate,
    pub spray_year: i32,
    pub spray_round: i32,
    pub spray_status: SprayStatus,
    pub insecticide: String,
    pub structures_found: i32,
    pub structures_sprayed: i32,
    pub structures_not_sprayed: i32,
    pub compartments_sprayed: i32,
    pub wall_type: WallType,
    pub roof_type: RoofType,
    pub total_population: i32,
    pub children_under_5: i32,
    pub pregnant_women: i32,
    pub reason_not_sprayed: Option<ReasonNotSprayed>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::communities::models::Entity",
        from = "Column::CommunityId",
        to = "crate::communities::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Communities,
    #[sea_orm(
        belongs_to = "crate::actors::models::Entity",
        from = "Column::SprayerId",
        to = "crate::actors::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Sprayer,
    #[sea_orm(
        belongs_to = "crate::actors::models::Entity",
        from = "Column::BrigadeChiefId",
        to = "crate::actors::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    BrigadeChief,
    #[sea_orm(
        belongs_to = "crate::spray_configurations::models::Entity",
        from = "Column::SprayConfigurationId",
        to = "crate::spray_configurations::models::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    SprayConfigurations,
}

impl Related<crate::communities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Communities.def()
    }
}

impl Related<crate::spray_configurations::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SprayConfigurations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A spray total as returned by the API, with display names resolved
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SprayTotal {
    pub id: Uuid,
    pub sprayer_id: Uuid,
    pub brigade_chief_id: Uuid,
    pub community_id: Uuid,
    pub spray_configuration_id: Option<Uuid>,
    pub spray_type: SprayType,
    pub spray_date: NaiveDate,
    pub spray_year: i32,
    pub spray_round: i32,
    pub spray_status: SprayStatus,
    pub insecticide: String,
    pub structures_found: i32,
    pub structures_sprayed: i32,
    pub structures_not_sprayed: i32,
    pub compartments_sprayed: i32,
    pub wall_type: WallType,
    pub roof_type: RoofType,
    pub total_population: i32,
    pub children_under_5: i32,
    pub pregnant_women: i32,
    pub reason_not_sprayed: Option<ReasonNotSprayed>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub community_name: Option<String>,
    pub sprayer_name: Option<String>,
    pub brigade_chief_name: Option<String>,
}

impl From<Model> for SprayTotal {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            sprayer_id: model.sprayer_id,
            brigade_chief_id: model.brigade_chief_id,
            community_id: model.community_id,
            spray_configuration_id: model.spray_configuration_id,
            spray_type: model.spray_type,
            spray_date: model.spray_date,
            spray_year: model.spray_year,
            spray_round: model.spray_round,
            spray_status: model.spray_status,
            insecticide: model.insecticide,
            structures_found: model.structures_found,
            structures_sprayed: model.structures_sprayed,
            structures_not_sprayed: model.structures_not_sprayed,
            compartments_sprayed: model.compartments_sprayed,
            wall_type: model.wall_type,
            roof_type: model.roof_type,
            total_population: model.total_population,
            children_under_5: model.children_under_5,
            pregnant_women: model.pregnant_women,
            reason_not_sprayed: model.reason_not_sprayed,
            notes: model.notes,
            created_by: model.created_by,
            updated_by: model.updated_by,
            created_at: model.created_at,
            last_updated: model.last_updated,
            community_name: None,
            sprayer_name: None,
            brigade_chief_name: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SprayTotalCreate {
    pub sprayer_id: Uuid,
    pub brigade_chief_id: Uuid,
    pub community_id: Uuid,
    #[serde(default)]
    pub spray_configuration_id: Option<Uuid>,
    pub spray_type: SprayType,
    pub spray_date: NaiveDate,
    /// Defaults to the year of `spray_date`
    #[serde(default)]
    pub spray_year: Option<i32>,
    /// Defaults to 1
    #[serde(default)]
    pub spray_round: Option<i32>,
    /// Defaults to `PLANNED`
    #[serde(default)]
    pub spray_status: Option<SprayStatus>,
    pub insecticide: String,
    pub structures_found: i32,
    pub structures_sprayed: i32,
    /// Computed as found minus sprayed when omitted
    #[serde(default)]
    pub structures_not_sprayed: Option<i32>,
    #[serde(default)]
    pub compartments_sprayed: i32,
    pub wall_type: WallType,
    pub roof_type: RoofType,
    #[serde(default)]
    pub total_population: i32,
    #[serde(default)]
    pub children_under_5: i32,
    #[serde(default)]
    pub pregnant_women: i32,
    #[serde(default)]
    pub reason_not_sprayed: Option<ReasonNotSprayed>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Distinguishes an absent field from an explicit `null`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields are left unchanged and `null` clears the
/// optional ones
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct SprayTotalUpdate {
    pub sprayer_id: Option<Uuid>,
    pub brigade_chief_id: Option<Uuid>,
    pub community_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub spray_configuration_id: Option<Option<Uuid>>,
    pub spray_type: Option<SprayType>,
    pub spray_date: Option<NaiveDate>,
    pub spray_year: Option<i32>,
    pub spray_round: Option<i32>,
    pub spray_status: Option<SprayStatus>,
    pub insecticide: Option<String>,
    pub structures_found: Option<i32>,
    pub structures_sprayed: Option<i32>,
    pub structures_not_sprayed: Option<i32>,
    pub compartments_sprayed: Option<i32>,
    pub wall_type: Option<WallType>,
    pub roof_type: Option<RoofType>,
    pub total_population: Option<i32>,
    pub children_under_5: Option<i32>,
    pub pregnant_women: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<ReasonNotSprayed>)]
    pub reason_not_sprayed: Option<Option<ReasonNotSprayed>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

/// Why one id of a bulk delete was not deleted
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResult {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<BulkDeleteFailure>,
}

impl From<SprayTotalCreate> for ActiveModel {
    /// `structures_not_sprayed` stays unset when omitted and `created_by` is
    /// left empty; the caller fills both in.
    fn from(data: SprayTotalCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Set(Uuid::new_v4()),
            sprayer_id: Set(data.sprayer_id),
            brigade_chief_id: Set(data.brigade_chief_id),
            community_id: Set(data.community_id),
            spray_configuration_id: Set(data.spray_configuration_id),
            spray_type: Set(data.spray_type),
            spray_date: Set(data.spray_date),
            spray_year: Set(data.spray_year.unwrap_or_else(|| data.spray_date.year())),
            spray_round: Set(data.spray_round.unwrap_or(1)),
            spray_status: Set(data.spray_status.unwrap_or(SprayStatus::Planned)),
            insecticide: Set(data.insecticide.trim().to_string()),
            structures_found: Set(data.structures_found),
            structures_sprayed: Set(data.structures_sprayed),
            structures_not_sprayed: data.structures_not_sprayed.map_or(NotSet, Set),
            compartments_sprayed: Set(data.compartments_sprayed),
            wall_type: Set(data.wall_type),
            roof_type: Set(data.roof_type),
            total_population: Set(data.total_population),
            children_under_5: Set(data.children_under_5),
            pregnant_women: Set(data.pregnant_women),
            reason_not_sprayed: Set(data.reason_not_sprayed),
            notes: Set(data.notes),
            is_deleted: Set(false),
            created_by: Set(None),
            updated_by: Set(None),
            deleted_by: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            last_updated: Set(now),
        }
    }
}

/// `found - sprayed` when the caller leaves not-sprayed out. Both counts are
/// checked for sign first so the subtraction cannot overflow.
pub fn resolve_not_sprayed(
    found: i32,
    sprayed: i32,
    not_sprayed: Option<i32>,
) -> Result<i32, DbErr> {
    if let Some(value) = not_sprayed {
        return Ok(value);
    }
    for (field, value) in [("structures_found", found), ("structures_sprayed", sprayed)] {
        if value < 0 {
            return Err(validation_db_err(format!("{field} must not be negative")));
        }
    }
    Ok(found - sprayed)
}

/// Sets only the fields present in the update. Not-sprayed is recomputed
/// when found and sprayed arrive without it.
impl MergeIntoActiveModel<ActiveModel> for SprayTotalUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let (Some(found), Some(sprayed), None) = (
            self.structures_found,
            self.structures_sprayed,
            self.structures_not_sprayed,
        ) {
            existing.structures_not_sprayed = Set(resolve_not_sprayed(found, sprayed, None)?);
        }

        if let Some(value) = self.sprayer_id {
            existing.sprayer_id = Set(value);
        }
        if let Some(value) = self.brigade_chief_id {
            existing.brigade_chief_id = Set(value);
        }
        if let Some(value) = self.community_id {
            existing.community_id = Set(value);
        }
        if let Some(value) = self.spray_configuration_id {
            existing.spray_configuration_id = Set(value);
        }
        if let Some(value) = self.spray_type {
            existing.spray_type = Set(value);
        }
        if let Some(value) = self.spray_date {
            existing.spray_date = Set(value);
        }
        if let Some(value) = self.spray_year {
            existing.spray_year = Set(value);
        }
        if let Some(value) = self.spray_round {
            existing.spray_round = Set(value);
        }
        if let Some(value) = self.spray_status {
            existing.spray_status = Set(value);
        }
        if let Some(value) = self.insecticide {
            existing.insecticide = Set(value.trim().to_string());
        }
        if let Some(value) = self.structures_found {
            existing.structures_found = Set(value);
        }
        if let Some(value) = self.structures_sprayed {
            existing.structures_sprayed = Set(value);
        }
        if let Some(value) = self.structures_not_sprayed {
            existing.structures_not_sprayed = Set(value);
        }
        if let Some(value) = self.compartments_sprayed {
            existing.compartments_sprayed = Set(value);
        }
        if let Some(value) = self.wall_type {
            existing.wall_type = Set(value);
        }
        if let Some(value) = self.roof_type {
            existing.roof_type = Set(value);
        }
        if let Some(value) = self.total_population {
            existing.total_population = Set(value);
        }
        if let Some(value) = self.children_under_5 {
            existing.children_under_5 = Set(value);
        }
        if let Some(value) = self.pregnant_women {
            existing.pregnant_women = Set(value);
        }
        if let Some(value) = self.reason_not_sprayed {
            existing.reason_not_sprayed = Set(value);
        }
        if let Some(value) = self.notes {
            existing.notes = Set(value);
        }
        Ok(existing)
    }
}

/// Soft-deleted records never leave the API
fn live(condition: &Condition) -> Condition {
    condition.clone().add(Column::IsDeleted.eq(false))
}

/// Resolves the community and actor names for a page of records
async fn with_names(db: &DatabaseConnection, models: Vec<Model>) -> Result<Vec<SprayTotal>, DbErr> {
    let community_ids: HashSet<Uuid> = models.iter().map(|m| m.community_id).collect();
    let actor_ids: HashSet<Uuid> = models
        .iter()
        .flat_map(|m| [m.sprayer_id, m.brigade_chief_id])
        .collect();

    let community_names: HashMap<Uuid, String> = communities::Entity::find()
        .filter(communities::Column::Id.is_in(community_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let actor_names: HashMap<Uuid, String> = actors::Entity::find()
        .filter(actors::Column::Id.is_in(actor_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let community_name = community_names.get(&model.community_id).cloned();
            let sprayer_name = actor_names.get(&model.sprayer_id).cloned();
            let brigade_chief_name = actor_names.get(&model.brigade_chief_id).cloned();
            let mut total = SprayTotal::from(model);
            total.community_name = community_name;
            total.sprayer_name = sprayer_name;
            total.brigade_chief_name = brigade_chief_name;
            total
        })
        .collect())
}

#[async_trait]
impl CRUDResource for SprayTotal {
    type EntityType = Entity;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = SprayTotalCreate;
    type UpdateModel = SprayTotalUpdate;
    type ListModel = SprayTotal;

    const ID_COLUMN: Self::ColumnType = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "spray total";
    const RESOURCE_NAME_PLURAL: &'static str = "spray totals";
    const TABLE_NAME: &'static str = "spray_totals";
    const RESOURCE_DESCRIPTION: &'static str =
        "Daily spraying results of one brigade in one community. Deleted records are hidden.";

    async fn get_one(db: &DatabaseConnection, id: Uuid) -> Result<Self, DbErr> {
        let not_found = || DbErr::RecordNotFound(format!("Spray total with id '{id}' not found"));
        let model = Entity::find_by_id(id)
            .filter(Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        with_names(db, vec![model]).await?.pop().ok_or_else(not_found)
    }

    async fn get_all(
        db: &DatabaseConnection,
        condition: &Condition,
        order_column: Self::ColumnType,
        order_direction: Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Self::ListModel>, DbErr> {
        let (order_column, order_direction) = match order_column {
            Column::Id => (Column::SprayDate, Order::Desc),
            column => (column, order_direction),
        };

        let models = Entity::find()
            .filter(live(condition))
            .order_by(order_column, order_direction)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;
        with_names(db, models).await
    }

    async fn total_count(db: &DatabaseConnection, condition: &Condition) -> u64 {
        match Entity::find().filter(live(condition)).count(db).await {
            Ok(count) => count,
            Err(err) => {
                tracing::error!("Failed to count spray totals: {err}");
                0
            }
        }
    }

    fn sortable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![
            ("spray_date", Column::SprayDate),
            ("spray_year", Column::SprayYear),
            ("spray_round", Column::SprayRound),
            ("spray_status", Column::SprayStatus),
            ("spray_type", Column::SprayType),
            ("structures_found", Column::StructuresFound),
            ("structures_sprayed", Column::StructuresSprayed),
            ("community_id", Column::CommunityId),
            ("created_at", Column::CreatedAt),
            ("last_updated", Column::LastUpdated),
        ]
    }

    fn filterable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![
            ("id", Column::Id),
            ("community_id", Column::CommunityId),
            ("sprayer_id", Column::SprayerId),
            ("brigade_chief_id", Column::BrigadeChiefId),
            ("spray_configuration_id", Column::SprayConfigurationId),
            ("spray_status", Column::SprayStatus),
            ("spray_type", Column::SprayType),
            ("spray_year", Column::SprayYear),
            ("spray_round", Column::SprayRound),
            ("insecticide", Column::Insecticide),
            ("created_by", Column::CreatedBy),
        ]
    }

    fn is_enum_field(field_name: &str) -> bool {
        matches!(field_name, "spray_status" | "spray_type")
    }

    fn like_filterable_columns() -> Vec<&'static str> {
        vec!["insecticide"]
    }

    fn fulltext_searchable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![("insecticide", Column::Insecticide)]
    }
}
