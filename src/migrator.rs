use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_customers_table::Migration),
            Box::new(m20260101_000002_create_distributions_table::Migration),
            Box::new(m20260101_000003_create_orders_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260101_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Customers::IsServed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(Customers::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        IsServed,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20260101_000002_create_distributions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_distributions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Distributions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Distributions::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Distributions::Name).string().not_null())
                        .col(ColumnDef::new(Distributions::Status).string().not_null())
                        .col(
                            ColumnDef::new(Distributions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Distributions::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(Distributions::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Distributions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Distributions {
        Table,
        Id,
        Name,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20260101_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Orders::DistributionId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::Amount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .col(ColumnDef::new(Orders::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_distribution_id")
                        .table(Orders::Table)
                        .col(Orders::DistributionId)
                        .to_owned(),
                )
                .await?;

            // The active-pair uniqueness check filters on deleted_at in the
            // service layer; this index keeps that lookup cheap.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_distribution")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .col(Orders::DistributionId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        CustomerId,
        DistributionId,
        Amount,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}
