use crate::common::auth::{CurrentUser, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crudcrate::{CRUDResource, traits::MergeIntoActiveModel};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{Condition, Order, QueryOrder, QuerySelect, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub full_name: String,
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A user account as returned by the API. The password hash stays internal.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            last_updated: model.last_updated,
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Partial update; absent fields are left unchanged
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl From<UserCreate> for ActiveModel {
    /// The password hash is left unset for the caller to fill in
    fn from(data: UserCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Set(Uuid::new_v4()),
            username: Set(data.username.trim().to_string()),
            full_name: Set(data.full_name.trim().to_string()),
            password_hash: NotSet,
            role: Set(data.role),
            is_active: Set(data.is_active),
            created_at: Set(now),
            last_updated: Set(now),
        }
    }
}

/// Profile fields only; a new password is hashed by the caller
impl MergeIntoActiveModel<ActiveModel> for UserUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(full_name) = self.full_name {
            existing.full_name = Set(full_name.trim().to_string());
        }
        if let Some(role) = self.role {
            existing.role = Set(role);
        }
        if let Some(is_active) = self.is_active {
            existing.is_active = Set(is_active);
        }
        existing.last_updated = Set(Utc::now());
        Ok(existing)
    }
}

#[async_trait]
impl CRUDResource for User {
    type EntityType = Entity;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = UserCreate;
    type UpdateModel = UserUpdate;
    type ListModel = User;

    const ID_COLUMN: Self::ColumnType = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "user";
    const RESOURCE_NAME_PLURAL: &'static str = "users";
    const TABLE_NAME: &'static str = "users";
    const RESOURCE_DESCRIPTION: &'static str =
        "Accounts that log in to the API. Password hashes are never returned.";

    async fn get_all(
        db: &DatabaseConnection,
        condition: &Condition,
        order_column: Self::ColumnType,
        order_direction: Order,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Self::ListModel>, DbErr> {
        let (order_column, order_direction) = match order_column {
            Column::Id => (Column::Username, Order::Asc),
            column => (column, order_direction),
        };

        let models = Entity::find()
            .filter(condition.clone())
            .order_by(order_column, order_direction)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    fn sortable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![
            ("username", Column::Username),
            ("full_name", Column::FullName),
            ("role", Column::Role),
            ("is_active", Column::IsActive),
            ("created_at", Column::CreatedAt),
        ]
    }

    fn filterable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![
            ("id", Column::Id),
            ("role", Column::Role),
            ("is_active", Column::IsActive),
            ("username", Column::Username),
            ("full_name", Column::FullName),
        ]
    }

    fn is_enum_field(field_name: &str) -> bool {
        field_name == "role"
    }

    fn like_filterable_columns() -> Vec<&'static str> {
        vec!["full_name"]
    }

    fn fulltext_searchable_columns() -> Vec<(&'static str, Self::ColumnType)> {
        vec![("username", Column::Username), ("full_name", Column::FullName)]
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: CurrentUser,
}
