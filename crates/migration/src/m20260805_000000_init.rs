//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication
//! - `vehicles`: tracked vehicles owned by users, with the baseline odometer
//!   anchoring each distance chain
//! - `fillups`: fuel purchases with their derived fields

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Vehicles {
    Table,
    Id,
    Name,
    UserId,
    BaselineOdometer,
    MileageMode,
}

#[derive(Iden)]
enum Fillups {
    Table,
    Id,
    VehicleId,
    Date,
    CreatedAt,
    FuelAmount,
    TotalPrice,
    Odometer,
    DistanceTraveled,
    FuelConsumption,
    Note,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Vehicles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vehicles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vehicles::Name).string().not_null())
                    .col(ColumnDef::new(Vehicles::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Vehicles::BaselineOdometer)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Vehicles::MileageMode).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vehicles-user_id")
                            .from(Vehicles::Table, Vehicles::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-vehicles-user_id-name-unique")
                    .table(Vehicles::Table)
                    .col(Vehicles::UserId)
                    .col(Vehicles::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Fillups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Fillups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fillups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fillups::VehicleId).string().not_null())
                    .col(ColumnDef::new(Fillups::Date).timestamp().not_null())
                    .col(ColumnDef::new(Fillups::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Fillups::FuelAmount).double().not_null())
                    .col(ColumnDef::new(Fillups::TotalPrice).double().not_null())
                    .col(ColumnDef::new(Fillups::Odometer).double())
                    .col(
                        ColumnDef::new(Fillups::DistanceTraveled)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Fillups::FuelConsumption).double())
                    .col(ColumnDef::new(Fillups::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fillups-vehicle_id")
                            .from(Fillups::Table, Fillups::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fillups-vehicle_id-date")
                    .table(Fillups::Table)
                    .col(Fillups::VehicleId)
                    .col(Fillups::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Fillups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
