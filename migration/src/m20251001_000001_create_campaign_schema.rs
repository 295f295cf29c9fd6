use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Timestamp columns shared by every table
fn timestamp_columns(table: &mut TableCreateStatement) {
    table
        .col(
            ColumnDef::new(Shared::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Shared::LastUpdated)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        );
}

async fn create_unique_index(
    manager: &SchemaManager<'_>,
    name: &str,
    table: impl IntoTableRef,
    columns: Vec<DynIden>,
) -> Result<(), DbErr> {
    let mut index = Index::create();
    index.name(name).table(table).unique();
    for column in columns {
        index.col(column);
    }
    manager.create_index(index.to_owned()).await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)] // One migration holds the whole campaign schema
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============ GEOGRAPHY ============
        let mut provinces = Table::create()
            .table(Provinces::Table)
            .if_not_exists()
            .col(ColumnDef::new(Provinces::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Provinces::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Provinces::Code).string_len(10))
            .to_owned();
        timestamp_columns(&mut provinces);
        manager.create_table(provinces).await?;

        let mut districts = Table::create()
            .table(Districts::Table)
            .if_not_exists()
            .col(ColumnDef::new(Districts::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Districts::Name).string().not_null())
            .col(ColumnDef::new(Districts::Code).string_len(10))
            .col(ColumnDef::new(Districts::ProvinceId).uuid().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_districts_province_id")
                    .from(Districts::Table, Districts::ProvinceId)
                    .to(Provinces::Table, Provinces::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut districts);
        manager.create_table(districts).await?;
        create_unique_index(
            manager,
            "districts_name_province_unique",
            Districts::Table,
            vec![Districts::Name.into_iden(), Districts::ProvinceId.into_iden()],
        )
        .await?;

        let mut localities = Table::create()
            .table(Localities::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Localities::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Localities::Name).string().not_null())
            .col(ColumnDef::new(Localities::Code).string_len(10))
            .col(ColumnDef::new(Localities::DistrictId).uuid().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_localities_district_id")
                    .from(Localities::Table, Localities::DistrictId)
                    .to(Districts::Table, Districts::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut localities);
        manager.create_table(localities).await?;
        create_unique_index(
            manager,
            "localities_name_district_unique",
            Localities::Table,
            vec![
                Localities::Name.into_iden(),
                Localities::DistrictId.into_iden(),
            ],
        )
        .await?;

        let mut communities = Table::create()
            .table(Communities::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Communities::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Communities::Name).string().not_null())
            .col(ColumnDef::new(Communities::Code).string_len(10))
            .col(ColumnDef::new(Communities::LocalityId).uuid().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_communities_locality_id")
                    .from(Communities::Table, Communities::LocalityId)
                    .to(Localities::Table, Localities::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut communities);
        manager.create_table(communities).await?;
        create_unique_index(
            manager,
            "communities_name_locality_unique",
            Communities::Table,
            vec![
                Communities::Name.into_iden(),
                Communities::LocalityId.into_iden(),
            ],
        )
        .await?;

        // ============ ACTORS AND USERS ============
        let mut actor_types = Table::create()
            .table(ActorTypes::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(ActorTypes::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(ActorTypes::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(ActorTypes::Description).text())
            .to_owned();
        timestamp_columns(&mut actor_types);
        manager.create_table(actor_types).await?;

        let mut actors = Table::create()
            .table(Actors::Table)
            .if_not_exists()
            .col(ColumnDef::new(Actors::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Actors::Name).string().not_null())
            .col(ColumnDef::new(Actors::Number).string())
            .col(
                ColumnDef::new(Actors::IsActive)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(ColumnDef::new(Actors::ActorTypeId).uuid().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_actors_actor_type_id")
                    .from(Actors::Table, Actors::ActorTypeId)
                    .to(ActorTypes::Table, ActorTypes::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut actors);
        manager.create_table(actors).await?;

        let mut users = Table::create()
            .table(Users::Table)
            .if_not_exists()
            .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Users::Username)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Users::FullName).string().not_null())
            .col(ColumnDef::new(Users::PasswordHash).text().not_null())
            .col(ColumnDef::new(Users::Role).string_len(16).not_null())
            .col(
                ColumnDef::new(Users::IsActive)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .to_owned();
        timestamp_columns(&mut users);
        manager.create_table(users).await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Sessions::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Sessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // ============ CAMPAIGN CONFIGURATION ============
        let mut spray_configurations = Table::create()
            .table(SprayConfigurations::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SprayConfigurations::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(SprayConfigurations::Year)
                    .integer()
                    .not_null(),
            )
            .col(ColumnDef::new(SprayConfigurations::ProvinceId).uuid())
            .col(ColumnDef::new(SprayConfigurations::DistrictId).uuid())
            .col(
                ColumnDef::new(SprayConfigurations::SprayTarget)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayConfigurations::ProposedSprayDays)
                    .integer()
                    .not_null()
                    .default(1),
            )
            .col(
                ColumnDef::new(SprayConfigurations::SprayRounds)
                    .integer()
                    .not_null()
                    .default(1),
            )
            .col(
                ColumnDef::new(SprayConfigurations::DaysBetweenRounds)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayConfigurations::IsActive)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(ColumnDef::new(SprayConfigurations::Description).text())
            .col(ColumnDef::new(SprayConfigurations::Notes).text())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_configurations_province_id")
                    .from(SprayConfigurations::Table, SprayConfigurations::ProvinceId)
                    .to(Provinces::Table, Provinces::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_configurations_district_id")
                    .from(SprayConfigurations::Table, SprayConfigurations::DistrictId)
                    .to(Districts::Table, Districts::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut spray_configurations);
        manager.create_table(spray_configurations).await?;

        // ============ SPRAY TOTALS ============
        let mut spray_totals = Table::create()
            .table(SprayTotals::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SprayTotals::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(SprayTotals::SprayerId).uuid().not_null())
            .col(
                ColumnDef::new(SprayTotals::BrigadeChiefId)
                    .uuid()
                    .not_null(),
            )
            .col(ColumnDef::new(SprayTotals::CommunityId).uuid().not_null())
            .col(ColumnDef::new(SprayTotals::SprayConfigurationId).uuid())
            .col(
                ColumnDef::new(SprayTotals::SprayType)
                    .string_len(16)
                    .not_null(),
            )
            .col(ColumnDef::new(SprayTotals::SprayDate).date().not_null())
            .col(ColumnDef::new(SprayTotals::SprayYear).integer().not_null())
            .col(
                ColumnDef::new(SprayTotals::SprayRound)
                    .integer()
                    .not_null()
                    .default(1),
            )
            .col(
                ColumnDef::new(SprayTotals::SprayStatus)
                    .string_len(16)
                    .not_null(),
            )
            .col(ColumnDef::new(SprayTotals::Insecticide).string().not_null())
            .col(
                ColumnDef::new(SprayTotals::StructuresFound)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::StructuresSprayed)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::StructuresNotSprayed)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::CompartmentsSprayed)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::WallType)
                    .string_len(16)
                    .not_null(),
            )
            .col(
                ColumnDef::new(SprayTotals::RoofType)
                    .string_len(16)
                    .not_null(),
            )
            .col(
                ColumnDef::new(SprayTotals::TotalPopulation)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::ChildrenUnder5)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(
                ColumnDef::new(SprayTotals::PregnantWomen)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(SprayTotals::ReasonNotSprayed).string_len(16))
            .col(ColumnDef::new(SprayTotals::Notes).text())
            .col(
                ColumnDef::new(SprayTotals::IsDeleted)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(ColumnDef::new(SprayTotals::CreatedBy).uuid())
            .col(ColumnDef::new(SprayTotals::UpdatedBy).uuid())
            .col(ColumnDef::new(SprayTotals::DeletedBy).uuid())
            .col(ColumnDef::new(SprayTotals::DeletedAt).timestamp_with_time_zone())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_totals_sprayer_id")
                    .from(SprayTotals::Table, SprayTotals::SprayerId)
                    .to(Actors::Table, Actors::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_totals_brigade_chief_id")
                    .from(SprayTotals::Table, SprayTotals::BrigadeChiefId)
                    .to(Actors::Table, Actors::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_totals_community_id")
                    .from(SprayTotals::Table, SprayTotals::CommunityId)
                    .to(Communities::Table, Communities::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_spray_totals_spray_configuration_id")
                    .from(SprayTotals::Table, SprayTotals::SprayConfigurationId)
                    .to(SprayConfigurations::Table, SprayConfigurations::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamp_columns(&mut spray_totals);
        manager.create_table(spray_totals).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse dependency order
        manager
            .drop_table(Table::drop().table(SprayTotals::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SprayConfigurations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Actors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActorTypes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Communities::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Localities::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Districts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Provinces::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Shared {
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum Provinces {
    Table,
    Id,
    Name,
    Code,
}

#[derive(DeriveIden)]
enum Districts {
    Table,
    Id,
    Name,
    Code,
    ProvinceId,
}

#[derive(DeriveIden)]
enum Localities {
    Table,
    Id,
    Name,
    Code,
    DistrictId,
}

#[derive(DeriveIden)]
enum Communities {
    Table,
    Id,
    Name,
    Code,
    LocalityId,
}

#[derive(DeriveIden)]
enum ActorTypes {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Actors {
    Table,
    Id,
    Name,
    Number,
    IsActive,
    ActorTypeId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    FullName,
    PasswordHash,
    Role,
    IsActive,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    Token,
    UserId,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum SprayConfigurations {
    Table,
    Id,
    Year,
    ProvinceId,
    DistrictId,
    SprayTarget,
    ProposedSprayDays,
    SprayRounds,
    DaysBetweenRounds,
    IsActive,
    Description,
    Notes,
}

#[derive(DeriveIden)]
enum SprayTotals {
    Table,
    Id,
    SprayerId,
    BrigadeChiefId,
    CommunityId,
    SprayConfigurationId,
    SprayType,
    SprayDate,
    SprayYear,
    SprayRound,
    SprayStatus,
    Insecticide,
    StructuresFound,
    StructuresSprayed,
    StructuresNotSprayed,
    CompartmentsSprayed,
    WallType,
    RoofType,
    TotalPopulation,
    #[sea_orm(iden = "children_under_5")]
    ChildrenUnder5,
    PregnantWomen,
    ReasonNotSprayed,
    Notes,
    IsDeleted,
    CreatedBy,
    UpdatedBy,
    DeletedBy,
    DeletedAt,
}
