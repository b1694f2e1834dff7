use chrono::{DateTime, Duration, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    AddFillupCmd, EngineError, Fillup, ImportFillupsCmd, ResultEngine, UpdateFillupCmd, Vehicle,
    chain, stats, store, store::FillupFieldPatch,
};

use super::{
    Engine, FillupSaved, ImportOutcome, MileageInput, RecalcSummary, normalize_optional_text,
    validate_amounts, validate_mileage_input, with_tx,
};

impl Engine {
    /// Return a vehicle's fillups in chain order (oldest first).
    pub async fn list_fillups(&self, vehicle_id: &str, user_id: &str) -> ResultEngine<Vec<Fillup>> {
        self.require_vehicle(&self.database, vehicle_id, user_id)
            .await?;
        let mut fillups = store::list_fillups(&self.database, vehicle_id).await?;
        chain::chain_order(&mut fillups);
        Ok(fillups)
    }

    /// Record a new fillup and reconcile the vehicle's chain.
    ///
    /// The new record's own derived fields are computed against its chain
    /// predecessor before the insert; the reconciliation pass then fixes any
    /// record the insert displaced (an earlier-dated entry shifts everything
    /// after it).
    pub async fn add_fillup(&self, cmd: AddFillupCmd) -> ResultEngine<FillupSaved> {
        let AddFillupCmd {
            vehicle_id,
            user_id,
            date,
            fuel_amount,
            total_price,
            odometer,
            distance,
            note,
        } = cmd;
        validate_amounts(fuel_amount, total_price)?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let vehicle = with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, &vehicle_id, &user_id).await?;
            let input = validate_mileage_input(vehicle.mileage_mode, odometer, distance)?;

            let (odometer, distance_traveled) = match input {
                MileageInput::Odometer(reading) => {
                    let existing = store::list_fillups(&db_tx, &vehicle.id).await?;
                    let reference = reference_before(&vehicle, &existing, (date, created_at, id));
                    let distance =
                        stats::distance_from_odometers(reading, reference).max(0.0);
                    (Some(reading), distance)
                }
                MileageInput::Distance(distance) => (None, distance),
            };

            let fillup = Fillup {
                id,
                vehicle_id: vehicle.id.clone(),
                date,
                created_at,
                fuel_amount,
                total_price,
                odometer,
                distance_traveled,
                fuel_consumption: stats::consumption(distance_traveled, fuel_amount),
                note: normalize_optional_text(note.as_deref()),
            };
            store::insert_fillup(&db_tx, &fillup).await?;
            Ok(vehicle)
        })?;

        let recalc = self.reconcile_chain(&vehicle).await?;
        let fillup = self.require_fillup_fresh(id).await?;
        Ok(FillupSaved { fillup, recalc })
    }

    /// Edit an existing fillup and reconcile the vehicle's chain.
    ///
    /// Only the supplied fields are written; derived fields are never taken
    /// from the caller. `recalc.applied` is the real count of rewritten rows,
    /// the edited record included when its own derived fields moved.
    pub async fn update_fillup(&self, cmd: UpdateFillupCmd) -> ResultEngine<FillupSaved> {
        let UpdateFillupCmd {
            vehicle_id,
            fillup_id,
            user_id,
            date,
            fuel_amount,
            total_price,
            odometer,
            distance,
            note,
        } = cmd;

        let vehicle = with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, &vehicle_id, &user_id).await?;
            let existing = self
                .require_fillup_in_vehicle(&db_tx, &vehicle, fillup_id)
                .await?;

            validate_fillup_patch(&vehicle, odometer, distance)?;
            if let Some(fuel_amount) = fuel_amount {
                validate_amounts(fuel_amount, total_price.unwrap_or(existing.total_price))?;
            } else if let Some(total_price) = total_price {
                validate_amounts(existing.fuel_amount, total_price)?;
            }

            let fields = FillupFieldPatch {
                date,
                fuel_amount,
                total_price,
                odometer: odometer.map(Some),
                distance_traveled: distance,
                fuel_consumption: None,
                note: note.map(|n| normalize_optional_text(Some(&n))),
            };
            store::update_fillup_fields(&db_tx, fillup_id, fields).await?;
            Ok(vehicle)
        })?;

        let recalc = self.reconcile_chain(&vehicle).await?;
        let fillup = self.require_fillup_fresh(fillup_id).await?;
        Ok(FillupSaved { fillup, recalc })
    }

    /// Remove a fillup and reconcile the remaining chain.
    pub async fn delete_fillup(
        &self,
        vehicle_id: &str,
        fillup_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<RecalcSummary> {
        let vehicle = with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, vehicle_id, user_id).await?;
            self.require_fillup_in_vehicle(&db_tx, &vehicle, fillup_id)
                .await?;
            store::delete_fillup_by_id(&db_tx, fillup_id).await?;
            Ok(vehicle)
        })?;

        self.reconcile_chain(&vehicle).await
    }

    /// Insert a batch of fillups in one transaction, then reconcile once.
    ///
    /// Every row is interpreted under the vehicle's single mileage mode; a
    /// row that does not fit rejects the whole batch before any write.
    pub async fn import_fillups(&self, cmd: ImportFillupsCmd) -> ResultEngine<ImportOutcome> {
        let ImportFillupsCmd {
            vehicle_id,
            user_id,
            rows,
        } = cmd;

        let now = Utc::now();
        let vehicle = with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, &vehicle_id, &user_id).await?;

            for (index, row) in rows.iter().enumerate() {
                validate_amounts(row.fuel_amount, row.total_price)?;
                let input =
                    validate_mileage_input(vehicle.mileage_mode, row.odometer, row.distance)?;

                let (odometer, distance_traveled) = match input {
                    // Derivation happens in the single reconciliation pass
                    // after the batch lands.
                    MileageInput::Odometer(reading) => (Some(reading), 0.0),
                    MileageInput::Distance(distance) => (None, distance),
                };

                let fillup = Fillup {
                    id: Uuid::new_v4(),
                    vehicle_id: vehicle.id.clone(),
                    date: row.date,
                    // Spread creation stamps so same-date rows keep their
                    // input order in the chain.
                    created_at: now + Duration::microseconds(index as i64),
                    fuel_amount: row.fuel_amount,
                    total_price: row.total_price,
                    odometer,
                    distance_traveled,
                    fuel_consumption: None,
                    note: normalize_optional_text(row.note.as_deref()),
                };
                store::insert_fillup(&db_tx, &fillup).await?;
            }
            Ok(vehicle)
        })?;

        let recalc = self.reconcile_chain(&vehicle).await?;
        Ok(ImportOutcome {
            inserted: rows.len(),
            recalc,
        })
    }

    async fn require_fillup_in_vehicle<C>(
        &self,
        conn: &C,
        vehicle: &Vehicle,
        fillup_id: Uuid,
    ) -> ResultEngine<Fillup>
    where
        C: sea_orm::ConnectionTrait,
    {
        let fillup = store::get_fillup(conn, fillup_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("fillup not exists".to_string()))?;
        if fillup.vehicle_id != vehicle.id {
            return Err(EngineError::KeyNotFound("fillup not exists".to_string()));
        }
        Ok(fillup)
    }

    async fn require_fillup_fresh(&self, fillup_id: Uuid) -> ResultEngine<Fillup> {
        store::get_fillup(&self.database, fillup_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("fillup not exists".to_string()))
    }
}

/// Reference odometer seen by a record inserted at `key`: the reading of the
/// nearest odometer-bearing predecessor, advanced over any reading-less
/// records in between, or the baseline when the record lands first.
fn reference_before(
    vehicle: &Vehicle,
    existing: &[Fillup],
    key: (DateTime<Utc>, DateTime<Utc>, Uuid),
) -> f64 {
    let mut predecessors: Vec<&Fillup> = existing
        .iter()
        .filter(|f| (f.date, f.created_at, f.id) < key)
        .collect();
    predecessors.sort_by(|a, b| (a.date, a.created_at, a.id).cmp(&(b.date, b.created_at, b.id)));

    let mut reference = vehicle.baseline_odometer;
    for fillup in predecessors {
        match fillup.odometer {
            Some(reading) => reference = reading,
            None => reference += fillup.distance_traveled,
        }
    }
    reference
}

fn validate_fillup_patch(
    vehicle: &Vehicle,
    odometer: Option<f64>,
    distance: Option<f64>,
) -> ResultEngine<()> {
    use crate::MileageMode;

    match vehicle.mileage_mode {
        MileageMode::Odometer => {
            if distance.is_some() {
                return Err(EngineError::Validation(
                    "vehicle tracks odometer readings, distance must not be set".to_string(),
                ));
            }
            if let Some(odometer) = odometer
                && odometer < 0.0
            {
                return Err(EngineError::Validation(
                    "odometer must be >= 0".to_string(),
                ));
            }
        }
        MileageMode::Distance => {
            if odometer.is_some() {
                return Err(EngineError::Validation(
                    "vehicle tracks distances, odometer must not be set".to_string(),
                ));
            }
            if let Some(distance) = distance
                && distance < 0.0
            {
                return Err(EngineError::Validation(
                    "distance must be >= 0".to_string(),
                ));
            }
        }
    }
    Ok(())
}
