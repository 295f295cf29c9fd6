use super::models::{
    self as spray_totals, BulkDeleteFailure, BulkDeleteResult, SprayStatus, SprayTotal,
    SprayTotalCreate, SprayTotalUpdate, resolve_not_sprayed,
};
use crate::actors::models::require_active_actor;
use crate::common::auth::CurrentUser;
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt, validation_db_err};
use crate::communities::models::require_community;
use crate::spray_configurations::models::require_active_configuration;
use chrono::Utc;
use crudcrate::{CRUDResource, traits::MergeIntoActiveModel};
use futures::future::join_all;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, TryIntoModel,
};
use uuid::Uuid;

const RESOURCE: &str = SprayTotal::RESOURCE_NAME_SINGULAR;

/// Count and range rules for a fully merged record
pub fn check_record(record: &spray_totals::Model) -> Result<(), DbErr> {
    let counts = [
        ("structures_found", record.structures_found),
        ("structures_sprayed", record.structures_sprayed),
        ("structures_not_sprayed", record.structures_not_sprayed),
        ("compartments_sprayed", record.compartments_sprayed),
        ("total_population", record.total_population),
        ("children_under_5", record.children_under_5),
        ("pregnant_women", record.pregnant_women),
    ];
    if let Some((field, _)) = counts.iter().find(|(_, value)| *value < 0) {
        return Err(validation_db_err(format!("{field} must not be negative")));
    }

    let accounted = i64::from(record.structures_sprayed) + i64::from(record.structures_not_sprayed);
    if accounted != i64::from(record.structures_found) {
        return Err(validation_db_err(format!(
            "structures_sprayed ({}) plus structures_not_sprayed ({}) must equal structures_found ({})",
            record.structures_sprayed, record.structures_not_sprayed, record.structures_found
        )));
    }
    if !(2000..=2100).contains(&record.spray_year) {
        return Err(validation_db_err("spray_year must be between 2000 and 2100"));
    }
    if record.spray_round < 1 {
        return Err(validation_db_err("spray_round must be at least 1"));
    }
    if record.insecticide.trim().is_empty() {
        return Err(validation_db_err("insecticide must not be empty"));
    }
    Ok(())
}

/// Loads a record that has not been soft-deleted
async fn find_live(db: &DatabaseConnection, id: Uuid) -> Result<spray_totals::Model, DbErr> {
    spray_totals::Entity::find_by_id(id)
        .filter(spray_totals::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Spray total with id '{id}' not found")))
}

/// Writes the `Set` columns of `changes` to `id` while it is still live.
/// Zero affected rows means the record was deleted in the meantime.
async fn update_live(
    db: &DatabaseConnection,
    id: Uuid,
    changes: spray_totals::ActiveModel,
) -> Result<(), DbErr> {
    let result = spray_totals::Entity::update_many()
        .set(changes)
        .filter(spray_totals::Column::Id.eq(id))
        .filter(spray_totals::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!(
            "Spray total with id '{id}' not found"
        )));
    }
    Ok(())
}

pub async fn create_spray_total(
    db: &DatabaseConnection,
    current: &CurrentUser,
    data: SprayTotalCreate,
) -> BusinessResult<SprayTotal> {
    let not_sprayed = resolve_not_sprayed(
        data.structures_found,
        data.structures_sprayed,
        data.structures_not_sprayed,
    )
    .map_err(|e| e.to_business_error(RESOURCE))?;

    let mut active: spray_totals::ActiveModel = data.into();
    active.structures_not_sprayed = Set(not_sprayed);
    active.created_by = Set(Some(current.id));

    let record = active
        .clone()
        .try_into_model()
        .map_err(|e| e.to_business_error(RESOURCE))?;
    validate(db, &record, None)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;

    let inserted = active
        .insert(db)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;
    tracing::info!(
        username = %current.username,
        spray_total_id = %inserted.id,
        community_id = %inserted.community_id,
        "Recorded spray total"
    );

    SprayTotal::get_one(db, inserted.id)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))
}

/// Record rules plus reference checks. With `previous`, only references
/// that changed are looked up again.
async fn validate(
    db: &DatabaseConnection,
    record: &spray_totals::Model,
    previous: Option<&spray_totals::Model>,
) -> Result<(), DbErr> {
    check_record(record)?;

    let changed = |old: fn(&spray_totals::Model) -> Option<Uuid>| {
        previous.is_none_or(|prev| old(prev) != old(record))
    };

    if changed(|m| Some(m.sprayer_id)) {
        require_active_actor(db, record.sprayer_id, "sprayer_id").await?;
    }
    if changed(|m| Some(m.brigade_chief_id)) {
        require_active_actor(db, record.brigade_chief_id, "brigade_chief_id").await?;
    }
    if changed(|m| Some(m.community_id)) {
        require_community(db, record.community_id).await?;
    }
    if let Some(configuration_id) = record.spray_configuration_id {
        if changed(|m| m.spray_configuration_id) {
            require_active_configuration(db, configuration_id).await?;
        }
    }
    Ok(())
}

/// SPRAYER accounts may only touch the records they created
fn ensure_owner(current: &CurrentUser, record: &spray_totals::Model, action: &str) -> BusinessResult<()> {
    if current.is_privileged() || record.created_by == Some(current.id) {
        Ok(())
    } else {
        tracing::warn!(
            username = %current.username,
            spray_total_id = %record.id,
            "Denied {action} on a spray total created by another user"
        );
        Err(crate::forbidden!(action, "spray totals created by another user"))
    }
}

pub async fn update_spray_total(
    db: &DatabaseConnection,
    current: &CurrentUser,
    id: Uuid,
    data: SprayTotalUpdate,
) -> BusinessResult<SprayTotal> {
    let existing = find_live(db, id)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;
    ensure_owner(current, &existing, "update")?;

    let mut changes = data
        .merge_into_activemodel(existing.clone().into_active_model())
        .map_err(|e| e.to_business_error(RESOURCE))?;
    changes.updated_by = Set(Some(current.id));
    changes.last_updated = Set(Utc::now());

    let merged = changes
        .clone()
        .try_into_model()
        .map_err(|e| e.to_business_error(RESOURCE))?;
    validate(db, &merged, Some(&existing))
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;

    update_live(db, id, changes)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;

    SprayTotal::get_one(db, id)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))
}

/// Marks a record as deleted. Completed records are kept.
pub async fn soft_delete_spray_total(
    db: &DatabaseConnection,
    current: &CurrentUser,
    id: Uuid,
) -> BusinessResult<()> {
    let existing = find_live(db, id)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;
    ensure_owner(current, &existing, "delete")?;

    if existing.spray_status == SprayStatus::Completed {
        return Err(crate::validation_error!(
            "spray_status",
            "completed spray totals cannot be deleted"
        ));
    }

    let now = Utc::now();
    let tombstone = spray_totals::ActiveModel {
        is_deleted: Set(true),
        deleted_at: Set(Some(now)),
        deleted_by: Set(Some(current.id)),
        last_updated: Set(now),
        ..Default::default()
    };
    update_live(db, id, tombstone)
        .await
        .map_err(|e| e.to_business_error(RESOURCE))?;

    tracing::info!(username = %current.username, spray_total_id = %id, "Soft-deleted spray total");
    Ok(())
}

/// Message reported for one failed id of a bulk delete. Server-side
/// failures are logged and replaced by a generic message.
fn failure_message(id: Uuid, error: &BusinessError) -> String {
    match error {
        BusinessError::InternalError { .. } | BusinessError::ExternalServiceError { .. } => {
            tracing::error!(spray_total_id = %id, "Bulk delete failed: {error}");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    }
}

/// Soft-deletes each id on its own; one failure does not stop the others
pub async fn bulk_soft_delete(
    db: &DatabaseConnection,
    current: &CurrentUser,
    ids: Vec<Uuid>,
) -> BulkDeleteResult {
    let outcomes = join_all(
        ids.iter()
            .map(|id| soft_delete_spray_total(db, current, *id)),
    )
    .await;

    let mut result = BulkDeleteResult::default();
    for (id, outcome) in ids.into_iter().zip(outcomes) {
        match outcome {
            Ok(()) => result.deleted.push(id),
            Err(error) => result.failed.push(BulkDeleteFailure {
                id,
                error: failure_message(id, &error),
            }),
        }
    }
    result
}
