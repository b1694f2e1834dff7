//! Record store adapter.
//!
//! Everything the engine reads from or writes to the database goes through
//! this module, one function per persistence operation, generic over
//! [`ConnectionTrait`] so the same calls run inside a transaction or on the
//! bare connection. The chain recalculator never touches this layer.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Fillup, ResultEngine, Vehicle, fillups, vehicles};

/// Partial column patch for a fillup. `None` leaves the column untouched;
/// the nested `Option` on nullable columns distinguishes "set to NULL" from
/// "keep".
#[derive(Clone, Debug, Default)]
pub struct FillupFieldPatch {
    pub date: Option<DateTime<Utc>>,
    pub fuel_amount: Option<f64>,
    pub total_price: Option<f64>,
    pub odometer: Option<Option<f64>>,
    pub distance_traveled: Option<f64>,
    pub fuel_consumption: Option<Option<f64>>,
    pub note: Option<Option<String>>,
}

impl FillupFieldPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.fuel_amount.is_none()
            && self.total_price.is_none()
            && self.odometer.is_none()
            && self.distance_traveled.is_none()
            && self.fuel_consumption.is_none()
            && self.note.is_none()
    }
}

pub(crate) async fn get_vehicle<C>(conn: &C, vehicle_id: &str) -> ResultEngine<Option<Vehicle>>
where
    C: ConnectionTrait,
{
    let model = vehicles::Entity::find_by_id(vehicle_id.to_string())
        .one(conn)
        .await?;
    model.map(Vehicle::try_from).transpose()
}

pub(crate) async fn list_vehicles<C>(conn: &C, user_id: &str) -> ResultEngine<Vec<Vehicle>>
where
    C: ConnectionTrait,
{
    let models = vehicles::Entity::find()
        .filter(vehicles::Column::UserId.eq(user_id.to_string()))
        .all(conn)
        .await?;
    models.into_iter().map(Vehicle::try_from).collect()
}

pub(crate) async fn find_vehicle_by_name<C>(
    conn: &C,
    user_id: &str,
    name: &str,
) -> ResultEngine<Option<Vehicle>>
where
    C: ConnectionTrait,
{
    let lowered = name.to_lowercase();
    let models = vehicles::Entity::find()
        .filter(vehicles::Column::UserId.eq(user_id.to_string()))
        .all(conn)
        .await?;
    for model in models {
        if model.name.to_lowercase() == lowered {
            return Ok(Some(Vehicle::try_from(model)?));
        }
    }
    Ok(None)
}

pub(crate) async fn insert_vehicle<C>(conn: &C, vehicle: &Vehicle) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    vehicles::ActiveModel::from(vehicle).insert(conn).await?;
    Ok(())
}

pub(crate) async fn update_vehicle_baseline<C>(
    conn: &C,
    vehicle_id: &str,
    new_baseline: f64,
) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let model = vehicles::ActiveModel {
        id: ActiveValue::Set(vehicle_id.to_string()),
        baseline_odometer: ActiveValue::Set(new_baseline),
        ..Default::default()
    };
    model.update(conn).await?;
    Ok(())
}

pub(crate) async fn delete_vehicle_by_id<C>(conn: &C, vehicle_id: &str) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    fillups::Entity::delete_many()
        .filter(fillups::Column::VehicleId.eq(vehicle_id.to_string()))
        .exec(conn)
        .await?;
    vehicles::Entity::delete_by_id(vehicle_id.to_string())
        .exec(conn)
        .await?;
    Ok(())
}

/// Returns the complete fillup set of a vehicle, unordered; callers sort via
/// [`crate::chain::chain_order`] when they need chain order.
pub(crate) async fn list_fillups<C>(conn: &C, vehicle_id: &str) -> ResultEngine<Vec<Fillup>>
where
    C: ConnectionTrait,
{
    let models = fillups::Entity::find()
        .filter(fillups::Column::VehicleId.eq(vehicle_id.to_string()))
        .all(conn)
        .await?;
    models.into_iter().map(Fillup::try_from).collect()
}

pub(crate) async fn get_fillup<C>(conn: &C, fillup_id: Uuid) -> ResultEngine<Option<Fillup>>
where
    C: ConnectionTrait,
{
    let model = fillups::Entity::find_by_id(fillup_id.to_string())
        .one(conn)
        .await?;
    model.map(Fillup::try_from).transpose()
}

pub(crate) async fn insert_fillup<C>(conn: &C, fillup: &Fillup) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    fillups::ActiveModel::from(fillup).insert(conn).await?;
    Ok(())
}

pub(crate) async fn update_fillup_fields<C>(
    conn: &C,
    fillup_id: Uuid,
    fields: FillupFieldPatch,
) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if fields.is_empty() {
        return Ok(());
    }

    let mut model = fillups::ActiveModel {
        id: ActiveValue::Set(fillup_id.to_string()),
        ..Default::default()
    };
    if let Some(date) = fields.date {
        model.date = ActiveValue::Set(date);
    }
    if let Some(fuel_amount) = fields.fuel_amount {
        model.fuel_amount = ActiveValue::Set(fuel_amount);
    }
    if let Some(total_price) = fields.total_price {
        model.total_price = ActiveValue::Set(total_price);
    }
    if let Some(odometer) = fields.odometer {
        model.odometer = ActiveValue::Set(odometer);
    }
    if let Some(distance_traveled) = fields.distance_traveled {
        model.distance_traveled = ActiveValue::Set(distance_traveled);
    }
    if let Some(fuel_consumption) = fields.fuel_consumption {
        model.fuel_consumption = ActiveValue::Set(fuel_consumption);
    }
    if let Some(note) = fields.note {
        model.note = ActiveValue::Set(note);
    }
    model.update(conn).await?;
    Ok(())
}

pub(crate) async fn delete_fillup_by_id<C>(conn: &C, fillup_id: Uuid) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let result = fillups::Entity::delete_by_id(fillup_id.to_string())
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::KeyNotFound("fillup not exists".to_string()));
    }
    Ok(())
}
