//! The module contains the `Fillup` type representing one fuel purchase.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, stats};

/// A single fuel purchase.
///
/// `distance_traveled` and `fuel_consumption` are derived fields: in odometer
/// mode the engine recomputes them from the chain of readings on every
/// mutation, and in distance mode `distance_traveled` is the user's own input
/// while consumption is still derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fillup {
    pub id: Uuid,
    pub vehicle_id: String,
    /// Chain position. Ties between same-date fillups are broken by
    /// `created_at`, then `id`, so the order is deterministic.
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub fuel_amount: f64,
    pub total_price: f64,
    /// Absolute reading, present only for odometer-mode vehicles.
    pub odometer: Option<f64>,
    pub distance_traveled: f64,
    pub fuel_consumption: Option<f64>,
    pub note: Option<String>,
}

impl Fillup {
    /// Price paid per unit of fuel. Derived on demand, never persisted.
    #[must_use]
    pub fn price_per_unit(&self) -> f64 {
        stats::price_per_unit(self.total_price, self.fuel_amount)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fillups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub vehicle_id: String,
    pub date: DateTimeUtc,
    pub created_at: DateTimeUtc,
    #[sea_orm(column_type = "Double")]
    pub fuel_amount: f64,
    #[sea_orm(column_type = "Double")]
    pub total_price: f64,
    pub odometer: Option<f64>,
    #[sea_orm(column_type = "Double")]
    pub distance_traveled: f64,
    pub fuel_consumption: Option<f64>,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicles::Entity",
        from = "Column::VehicleId",
        to = "super::vehicles::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Vehicles,
}

impl Related<super::vehicles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Fillup> for ActiveModel {
    fn from(fillup: &Fillup) -> Self {
        Self {
            id: ActiveValue::Set(fillup.id.to_string()),
            vehicle_id: ActiveValue::Set(fillup.vehicle_id.clone()),
            date: ActiveValue::Set(fillup.date),
            created_at: ActiveValue::Set(fillup.created_at),
            fuel_amount: ActiveValue::Set(fillup.fuel_amount),
            total_price: ActiveValue::Set(fillup.total_price),
            odometer: ActiveValue::Set(fillup.odometer),
            distance_traveled: ActiveValue::Set(fillup.distance_traveled),
            fuel_consumption: ActiveValue::Set(fillup.fuel_consumption),
            note: ActiveValue::Set(fillup.note.clone()),
        }
    }
}

impl TryFrom<Model> for Fillup {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("fillup not exists".to_string()))?,
            vehicle_id: model.vehicle_id,
            date: model.date,
            created_at: model.created_at,
            fuel_amount: model.fuel_amount,
            total_price: model.total_price,
            odometer: model.odometer,
            distance_traveled: model.distance_traveled,
            fuel_consumption: model.fuel_consumption,
            note: model.note,
        })
    }
}
