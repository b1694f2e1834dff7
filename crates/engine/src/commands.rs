//! Command structs for engine operations.
//!
//! These types group parameters for write operations (add/update/import),
//! keeping call sites readable and avoiding long argument lists. Which of
//! `odometer`/`distance` is accepted depends on the vehicle's mileage mode;
//! the operation validates the pairing before any write.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Record a new fillup.
#[derive(Clone, Debug)]
pub struct AddFillupCmd {
    pub vehicle_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub fuel_amount: f64,
    pub total_price: f64,
    pub odometer: Option<f64>,
    pub distance: Option<f64>,
    pub note: Option<String>,
}

impl AddFillupCmd {
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>,
        user_id: impl Into<String>,
        date: DateTime<Utc>,
        fuel_amount: f64,
        total_price: f64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            user_id: user_id.into(),
            date,
            fuel_amount,
            total_price,
            odometer: None,
            distance: None,
            note: None,
        }
    }

    #[must_use]
    pub fn odometer(mut self, odometer: f64) -> Self {
        self.odometer = Some(odometer);
        self
    }

    #[must_use]
    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Edit an existing fillup. Unset fields keep their stored value.
#[derive(Clone, Debug)]
pub struct UpdateFillupCmd {
    pub vehicle_id: String,
    pub fillup_id: Uuid,
    pub user_id: String,

    pub date: Option<DateTime<Utc>>,
    pub fuel_amount: Option<f64>,
    pub total_price: Option<f64>,
    pub odometer: Option<f64>,
    pub distance: Option<f64>,
    pub note: Option<String>,
}

impl UpdateFillupCmd {
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>,
        fillup_id: Uuid,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            fillup_id,
            user_id: user_id.into(),
            date: None,
            fuel_amount: None,
            total_price: None,
            odometer: None,
            distance: None,
            note: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn fuel_amount(mut self, fuel_amount: f64) -> Self {
        self.fuel_amount = Some(fuel_amount);
        self
    }

    #[must_use]
    pub fn total_price(mut self, total_price: f64) -> Self {
        self.total_price = Some(total_price);
        self
    }

    #[must_use]
    pub fn odometer(mut self, odometer: f64) -> Self {
        self.odometer = Some(odometer);
        self
    }

    #[must_use]
    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One row of a bulk import, interpreted under the vehicle's mileage mode.
#[derive(Clone, Debug)]
pub struct ImportFillupRow {
    pub date: DateTime<Utc>,
    pub fuel_amount: f64,
    pub total_price: f64,
    pub odometer: Option<f64>,
    pub distance: Option<f64>,
    pub note: Option<String>,
}

/// Insert many fillups in one batch, then reconcile the chain once.
#[derive(Clone, Debug)]
pub struct ImportFillupsCmd {
    pub vehicle_id: String,
    pub user_id: String,
    pub rows: Vec<ImportFillupRow>,
}

impl ImportFillupsCmd {
    #[must_use]
    pub fn new(
        vehicle_id: impl Into<String>,
        user_id: impl Into<String>,
        rows: Vec<ImportFillupRow>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            user_id: user_id.into(),
            rows,
        }
    }
}
