//! The module contains the `Vehicle` struct and its mileage mode.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// How a vehicle's fillups report mileage.
///
/// The mode is fixed at vehicle creation: switching it mid-history would
/// change the meaning of every stored record, so no engine operation accepts
/// a mode change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MileageMode {
    /// Each fillup carries an absolute odometer reading; distance is derived
    /// from the previous reading in date order.
    Odometer,
    /// Each fillup carries the distance traveled directly; odometer readings
    /// are never stored.
    Distance,
}

impl MileageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Odometer => "odometer",
            Self::Distance => "distance",
        }
    }
}

impl TryFrom<&str> for MileageMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "odometer" => Ok(Self::Odometer),
            "distance" => Ok(Self::Distance),
            other => Err(EngineError::Validation(format!(
                "invalid mileage mode: {other}"
            ))),
        }
    }
}

/// A vehicle whose fuel purchases are tracked.
///
/// `baseline_odometer` is the reading before the first recorded fillup; it
/// anchors the distance chain and may be edited later, which forces a full
/// chain recalculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Stable identifier, a UUID generated once and persisted, so the vehicle
    /// can be renamed without breaking references.
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub baseline_odometer: f64,
    pub mileage_mode: MileageMode,
}

impl Vehicle {
    pub fn new(
        name: String,
        user_id: &str,
        mileage_mode: MileageMode,
        baseline_odometer: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            user_id: user_id.to_string(),
            baseline_odometer,
            mileage_mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub user_id: String,
    #[sea_orm(column_type = "Double")]
    pub baseline_odometer: f64,
    pub mileage_mode: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fillups::Entity")]
    Fillups,
}

impl Related<super::fillups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fillups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Vehicle> for ActiveModel {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: ActiveValue::Set(vehicle.id.clone()),
            name: ActiveValue::Set(vehicle.name.clone()),
            user_id: ActiveValue::Set(vehicle.user_id.clone()),
            baseline_odometer: ActiveValue::Set(vehicle.baseline_odometer),
            mileage_mode: ActiveValue::Set(vehicle.mileage_mode.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Vehicle {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
            baseline_odometer: model.baseline_odometer,
            mileage_mode: MileageMode::try_from(model.mileage_mode.as_str())?,
        })
    }
}
