use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (index name, column) pairs on `spray_totals` used by the report filters
const SPRAY_TOTALS_INDEXES: [(&str, SprayTotals); 7] = [
    ("idx_spray_totals_spray_year", SprayTotals::SprayYear),
    ("idx_spray_totals_spray_date", SprayTotals::SprayDate),
    ("idx_spray_totals_community_id", SprayTotals::CommunityId),
    ("idx_spray_totals_spray_status", SprayTotals::SprayStatus),
    ("idx_spray_totals_spray_type", SprayTotals::SprayType),
    ("idx_spray_totals_is_deleted", SprayTotals::IsDeleted),
    ("idx_spray_totals_created_by", SprayTotals::CreatedBy),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============ SPRAY TOTALS INDEXES ============
        for (name, column) in SPRAY_TOTALS_INDEXES {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(SprayTotals::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // ============ LOOKUP INDEXES ============
        manager
            .create_index(
                Index::create()
                    .name("idx_spray_configurations_year")
                    .table(SprayConfigurations::Table)
                    .col(SprayConfigurations::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_expires_at")
                    .table(Sessions::Table)
                    .col(Sessions::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in SPRAY_TOTALS_INDEXES {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(SprayTotals::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }
        manager
            .drop_index(
                Index::drop()
                    .name("idx_spray_configurations_year")
                    .table(SprayConfigurations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sessions_expires_at")
                    .table(Sessions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum SprayTotals {
    Table,
    SprayYear,
    SprayDate,
    CommunityId,
    SprayStatus,
    SprayType,
    IsDeleted,
    CreatedBy,
}

#[derive(DeriveIden)]
enum SprayConfigurations {
    Table,
    Year,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    ExpiresAt,
}
