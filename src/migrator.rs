use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_assets_table::Migration),
            Box::new(m20240101_000002_create_failure_types_table::Migration),
            Box::new(m20240101_000003_create_technicians_table::Migration),
            Box::new(m20240101_000004_create_jobs_table::Migration),
            Box::new(m20240101_000005_create_job_cost_entries_table::Migration),
            Box::new(m20240101_000006_create_job_cost_snapshots_table::Migration),
            Box::new(m20240101_000007_create_document_hashes_table::Migration),
            Box::new(m20240101_000008_create_item_request_lines_table::Migration),
            Box::new(m20240101_000009_create_downtime_logs_table::Migration),
            Box::new(m20240101_000010_create_pm_schedules_table::Migration),
            Box::new(m20240101_000011_create_meter_readings_table::Migration),
            Box::new(m20240101_000012_create_alerts_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_assets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_assets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Assets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Assets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Assets::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Assets::Code).string().not_null())
                        .col(ColumnDef::new(Assets::Description).string().not_null())
                        .col(
                            ColumnDef::new(Assets::CurrentMeter)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Assets::MeterUnit).string().not_null())
                        .col(
                            ColumnDef::new(Assets::SafetyCritical)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Assets::OpportunityCostPerHour)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(Assets::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Assets::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_company_id")
                        .table(Assets::Table)
                        .col(Assets::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_company_code")
                        .table(Assets::Table)
                        .col(Assets::CompanyId)
                        .col(Assets::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Assets {
        Table,
        Id,
        CompanyId,
        Code,
        Description,
        CurrentMeter,
        MeterUnit,
        SafetyCritical,
        OpportunityCostPerHour,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_failure_types_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_failure_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FailureTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FailureTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FailureTypes::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(FailureTypes::Name).string().not_null())
                        .col(
                            ColumnDef::new(FailureTypes::SafetyCritical)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_failure_types_company_id")
                        .table(FailureTypes::Table)
                        .col(FailureTypes::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FailureTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum FailureTypes {
        Table,
        Id,
        CompanyId,
        Name,
        SafetyCritical,
    }
}

mod m20240101_000003_create_technicians_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_technicians_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Technicians::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Technicians::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Technicians::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Technicians::Name).string().not_null())
                        .col(
                            ColumnDef::new(Technicians::HourlyRate)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Technicians::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Technicians {
        Table,
        Id,
        CompanyId,
        Name,
        HourlyRate,
    }
}

mod m20240101_000004_create_jobs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_jobs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Jobs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Jobs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Jobs::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Jobs::AssetId).uuid().not_null())
                        .col(ColumnDef::new(Jobs::FailureTypeId).uuid().null())
                        .col(ColumnDef::new(Jobs::PmScheduleId).uuid().null())
                        .col(ColumnDef::new(Jobs::Title).string().not_null())
                        .col(ColumnDef::new(Jobs::JobType).string().not_null())
                        .col(ColumnDef::new(Jobs::Status).string().not_null())
                        .col(ColumnDef::new(Jobs::Priority).string().not_null())
                        .col(ColumnDef::new(Jobs::AssignedTo).uuid().null())
                        .col(
                            ColumnDef::new(Jobs::SafetyPhotoRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Jobs::SafetyPhotoUrl).string().null())
                        .col(
                            ColumnDef::new(Jobs::TotalPauseSeconds)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::MaterialCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::LaborCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::FuelCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::ServiceCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::OtherCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Jobs::TotalCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Jobs::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(Jobs::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Jobs::StartedAt).timestamp().null())
                        .col(ColumnDef::new(Jobs::PausedAt).timestamp().null())
                        .col(ColumnDef::new(Jobs::CompletedAt).timestamp().null())
                        .col(ColumnDef::new(Jobs::ClosedAt).timestamp().null())
                        .col(ColumnDef::new(Jobs::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_jobs_asset_id")
                        .table(Jobs::Table)
                        .col(Jobs::AssetId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_jobs_status")
                        .table(Jobs::Table)
                        .col(Jobs::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_jobs_pm_schedule_id")
                        .table(Jobs::Table)
                        .col(Jobs::PmScheduleId)
                        .to_owned(),
                )
                .await?;

            // Partial unique index backing the one-pending-job-per-schedule
            // rule. Supported as-is on both Postgres and SQLite.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_pending_pm_schedule \
                     ON jobs (pm_schedule_id) WHERE pm_schedule_id IS NOT NULL \
                     AND status IN ('CREATED', 'ASSIGNED', 'IN_PROGRESS')",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Jobs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Jobs {
        Table,
        Id,
        CompanyId,
        AssetId,
        FailureTypeId,
        PmScheduleId,
        Title,
        JobType,
        Status,
        Priority,
        AssignedTo,
        SafetyPhotoRequired,
        SafetyPhotoUrl,
        TotalPauseSeconds,
        MaterialCost,
        LaborCost,
        FuelCost,
        ServiceCost,
        OtherCost,
        TotalCost,
        CreatedBy,
        CreatedAt,
        StartedAt,
        PausedAt,
        CompletedAt,
        ClosedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_job_cost_entries_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_job_cost_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobCostEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobCostEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobCostEntries::JobId).uuid().not_null())
                        .col(
                            ColumnDef::new(JobCostEntries::SeqNo)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobCostEntries::CostType).string().not_null())
                        .col(ColumnDef::new(JobCostEntries::Amount).decimal().not_null())
                        .col(ColumnDef::new(JobCostEntries::Quantity).decimal().null())
                        .col(ColumnDef::new(JobCostEntries::UnitCost).decimal().null())
                        .col(
                            ColumnDef::new(JobCostEntries::RunningTotal)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostEntries::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(JobCostEntries::ReferenceId).uuid().null())
                        .col(ColumnDef::new(JobCostEntries::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(JobCostEntries::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Ledger ordering is per job; the pair is the natural key
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_cost_entries_job_seq")
                        .table(JobCostEntries::Table)
                        .col(JobCostEntries::JobId)
                        .col(JobCostEntries::SeqNo)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(JobCostEntries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum JobCostEntries {
        Table,
        Id,
        JobId,
        SeqNo,
        CostType,
        Amount,
        Quantity,
        UnitCost,
        RunningTotal,
        ReferenceType,
        ReferenceId,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000006_create_job_cost_snapshots_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_job_cost_snapshots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobCostSnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobCostSnapshots::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobCostSnapshots::JobId).uuid().not_null())
                        .col(
                            ColumnDef::new(JobCostSnapshots::MaterialCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::LaborCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::FuelCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::ServiceCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::OtherCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::TotalCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::LaborHours)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::HourlyRate)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::Digest)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCostSnapshots::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One snapshot per job, ever
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_cost_snapshots_job_id")
                        .table(JobCostSnapshots::Table)
                        .col(JobCostSnapshots::JobId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(JobCostSnapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum JobCostSnapshots {
        Table,
        Id,
        JobId,
        MaterialCost,
        LaborCost,
        FuelCost,
        ServiceCost,
        OtherCost,
        TotalCost,
        LaborHours,
        HourlyRate,
        Digest,
        CreatedAt,
    }
}

mod m20240101_000007_create_document_hashes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_document_hashes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentHashes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentHashes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentHashes::DocumentType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentHashes::DocumentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DocumentHashes::Digest).string().not_null())
                        .col(
                            ColumnDef::new(DocumentHashes::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_document_hashes_type_id")
                        .table(DocumentHashes::Table)
                        .col(DocumentHashes::DocumentType)
                        .col(DocumentHashes::DocumentId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentHashes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DocumentHashes {
        Table,
        Id,
        DocumentType,
        DocumentId,
        Digest,
        CreatedAt,
    }
}

mod m20240101_000008_create_item_request_lines_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_item_request_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemRequestLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemRequestLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemRequestLines::JobId).uuid().not_null())
                        .col(
                            ColumnDef::new(ItemRequestLines::ItemName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::RequestedQty)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::ApprovedQty)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::IssuedQty)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::ReturnedQty)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::TotalCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_request_lines_job_id")
                        .table(ItemRequestLines::Table)
                        .col(ItemRequestLines::JobId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemRequestLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ItemRequestLines {
        Table,
        Id,
        JobId,
        ItemName,
        RequestedQty,
        ApprovedQty,
        IssuedQty,
        ReturnedQty,
        UnitCost,
        TotalCost,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000009_create_downtime_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_downtime_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DowntimeLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DowntimeLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DowntimeLogs::AssetId).uuid().not_null())
                        .col(ColumnDef::new(DowntimeLogs::JobId).uuid().null())
                        .col(ColumnDef::new(DowntimeLogs::Category).string().not_null())
                        .col(
                            ColumnDef::new(DowntimeLogs::StartedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DowntimeLogs::EndedAt).timestamp().null())
                        .col(
                            ColumnDef::new(DowntimeLogs::DurationMinutes)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DowntimeLogs::OpportunityCostPerHour)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DowntimeLogs::LostOpportunityCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DowntimeLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_downtime_logs_asset_id")
                        .table(DowntimeLogs::Table)
                        .col(DowntimeLogs::AssetId)
                        .to_owned(),
                )
                .await?;

            // Partial unique index backing the one-open-interval-per-asset rule.
            // Supported as-is on both Postgres and SQLite.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_downtime_logs_open_interval \
                     ON downtime_logs (asset_id) WHERE ended_at IS NULL",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DowntimeLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DowntimeLogs {
        Table,
        Id,
        AssetId,
        JobId,
        Category,
        StartedAt,
        EndedAt,
        DurationMinutes,
        OpportunityCostPerHour,
        LostOpportunityCost,
        CreatedAt,
    }
}

mod m20240101_000010_create_pm_schedules_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000010_create_pm_schedules_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PmSchedules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PmSchedules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PmSchedules::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(PmSchedules::AssetId).uuid().not_null())
                        .col(
                            ColumnDef::new(PmSchedules::IntervalType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::IntervalValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::LastServiceMeter)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::NextDueMeter)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::JobTitleTemplate)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PmSchedules::Priority).string().not_null())
                        .col(
                            ColumnDef::new(PmSchedules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PmSchedules::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pm_schedules_asset_id")
                        .table(PmSchedules::Table)
                        .col(PmSchedules::AssetId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PmSchedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PmSchedules {
        Table,
        Id,
        CompanyId,
        AssetId,
        IntervalType,
        IntervalValue,
        LastServiceMeter,
        NextDueMeter,
        JobTitleTemplate,
        Priority,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000011_create_meter_readings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000011_create_meter_readings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MeterReadings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MeterReadings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MeterReadings::AssetId).uuid().not_null())
                        .col(ColumnDef::new(MeterReadings::Reading).decimal().not_null())
                        .col(
                            ColumnDef::new(MeterReadings::PreviousReading)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MeterReadings::EffectiveDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MeterReadings::Rollback)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(MeterReadings::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(MeterReadings::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_meter_readings_asset_id")
                        .table(MeterReadings::Table)
                        .col(MeterReadings::AssetId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MeterReadings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MeterReadings {
        Table,
        Id,
        AssetId,
        Reading,
        PreviousReading,
        EffectiveDate,
        Rollback,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000012_create_alerts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000012_create_alerts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Alerts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Alerts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Alerts::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(Alerts::AssetId).uuid().null())
                        .col(ColumnDef::new(Alerts::Severity).string().not_null())
                        .col(ColumnDef::new(Alerts::Category).string().not_null())
                        .col(ColumnDef::new(Alerts::Message).string().not_null())
                        .col(ColumnDef::new(Alerts::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_alerts_asset_id")
                        .table(Alerts::Table)
                        .col(Alerts::AssetId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Alerts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Alerts {
        Table,
        Id,
        CompanyId,
        AssetId,
        Severity,
        Category,
        Message,
        CreatedAt,
    }
}
