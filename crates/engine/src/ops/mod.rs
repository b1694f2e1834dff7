use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    ChainWarning, EngineError, Fillup, MileageMode, ResultEngine, Vehicle, chain, store,
    store::FillupFieldPatch,
};

mod fillups;
mod vehicles;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) async fn require_vehicle<C>(
        &self,
        conn: &C,
        vehicle_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vehicle>
    where
        C: ConnectionTrait,
    {
        let vehicle = store::get_vehicle(conn, vehicle_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("vehicle not exists".to_string()))?;
        if vehicle.user_id != user_id {
            return Err(EngineError::KeyNotFound("vehicle not exists".to_string()));
        }
        Ok(vehicle)
    }

    /// Rereads the vehicle's complete fillup set, recomputes the chain, and
    /// persists the rows whose derived fields moved.
    ///
    /// The patch phase is best-effort: the primary mutation has already
    /// committed, so a row that fails to write is counted and logged rather
    /// than rolling back the rows already fixed.
    pub(crate) async fn reconcile_chain(&self, vehicle: &Vehicle) -> ResultEngine<RecalcSummary> {
        let fillups = store::list_fillups(&self.database, &vehicle.id).await?;
        let outcome = chain::recalculate(vehicle.baseline_odometer, vehicle.mileage_mode, &fillups);

        let attempted = outcome.updated.len();
        let mut applied = 0usize;
        for patch in &outcome.updated {
            let fields = FillupFieldPatch {
                distance_traveled: Some(patch.distance_traveled),
                fuel_consumption: Some(patch.fuel_consumption),
                ..Default::default()
            };
            match store::update_fillup_fields(&self.database, patch.fillup_id, fields).await {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(
                        fillup_id = %patch.fillup_id,
                        vehicle_id = %vehicle.id,
                        error = %err,
                        "failed to persist recalculated fillup"
                    );
                }
            }
        }

        debug!(vehicle_id = %vehicle.id, attempted, applied, "chain reconciled");
        Ok(RecalcSummary {
            attempted,
            applied,
            warnings: outcome.warnings,
        })
    }
}

/// How a chain reconciliation went: how many rows needed rewriting, how many
/// writes succeeded, and the consistency warnings observed during the walk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalcSummary {
    pub attempted: usize,
    pub applied: usize,
    pub warnings: Vec<ChainWarning>,
}

impl RecalcSummary {
    /// True when some chain rows could not be rewritten after the primary
    /// mutation committed.
    pub fn is_partial(&self) -> bool {
        self.applied < self.attempted
    }
}

/// Result of a fillup create/update: the record as stored after the chain
/// settled, plus the reconciliation summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillupSaved {
    pub fillup: Fillup,
    pub recalc: RecalcSummary,
}

/// Result of a batch import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub recalc: RecalcSummary,
}

/// Which mileage field a caller submitted, checked against the vehicle's
/// fixed mode. Exactly one of the two is allowed; the other must be absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum MileageInput {
    Odometer(f64),
    Distance(f64),
}

pub(crate) fn validate_mileage_input(
    mode: MileageMode,
    odometer: Option<f64>,
    distance: Option<f64>,
) -> ResultEngine<MileageInput> {
    match mode {
        MileageMode::Odometer => {
            if distance.is_some() {
                return Err(EngineError::Validation(
                    "vehicle tracks odometer readings, distance must not be set".to_string(),
                ));
            }
            let odometer = odometer.ok_or_else(|| {
                EngineError::Validation("odometer reading is required".to_string())
            })?;
            if odometer < 0.0 {
                return Err(EngineError::Validation(
                    "odometer must be >= 0".to_string(),
                ));
            }
            Ok(MileageInput::Odometer(odometer))
        }
        MileageMode::Distance => {
            if odometer.is_some() {
                return Err(EngineError::Validation(
                    "vehicle tracks distances, odometer must not be set".to_string(),
                ));
            }
            let distance = distance.ok_or_else(|| {
                EngineError::Validation("distance traveled is required".to_string())
            })?;
            if distance < 0.0 {
                return Err(EngineError::Validation(
                    "distance must be >= 0".to_string(),
                ));
            }
            Ok(MileageInput::Distance(distance))
        }
    }
}

pub(crate) fn validate_amounts(fuel_amount: f64, total_price: f64) -> ResultEngine<()> {
    if fuel_amount <= 0.0 {
        return Err(EngineError::Validation(
            "fuel_amount must be > 0".to_string(),
        ));
    }
    if total_price < 0.0 {
        return Err(EngineError::Validation(
            "total_price must be >= 0".to_string(),
        ));
    }
    Ok(())
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
