use sea_orm::TransactionTrait;

use crate::{EngineError, ResultEngine, Vehicle, MileageMode, store};

use super::{Engine, RecalcSummary, normalize_required_name, with_tx};

impl Engine {
    /// Add a new vehicle.
    ///
    /// The mileage mode is fixed here for the vehicle's lifetime; every later
    /// fillup is validated against it.
    pub async fn new_vehicle(
        &self,
        name: &str,
        user_id: &str,
        mileage_mode: MileageMode,
        baseline_odometer: f64,
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "vehicle")?;
        if baseline_odometer < 0.0 {
            return Err(EngineError::Validation(
                "baseline_odometer must be >= 0".to_string(),
            ));
        }

        let vehicle = Vehicle::new(name.clone(), user_id, mileage_mode, baseline_odometer);
        let vehicle_id = vehicle.id.clone();
        with_tx!(self, |db_tx| {
            // Enforce unique vehicle names per owner (case-insensitive) to
            // avoid ambiguous name lookups.
            if store::find_vehicle_by_name(&db_tx, user_id, &name)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(name));
            }
            store::insert_vehicle(&db_tx, &vehicle).await?;
            Ok(())
        })?;
        Ok(vehicle_id)
    }

    /// Return a user's vehicle.
    pub async fn vehicle(&self, vehicle_id: &str, user_id: &str) -> ResultEngine<Vehicle> {
        self.require_vehicle(&self.database, vehicle_id, user_id)
            .await
    }

    /// Return all vehicles of a user.
    pub async fn vehicles(&self, user_id: &str) -> ResultEngine<Vec<Vehicle>> {
        store::list_vehicles(&self.database, user_id).await
    }

    /// Change a vehicle's baseline odometer and reconcile its whole chain.
    ///
    /// This is the only operation that can move the first chronological
    /// fillup's distance without any fillup being edited: the baseline is the
    /// virtual zeroth chain element.
    pub async fn set_vehicle_baseline(
        &self,
        vehicle_id: &str,
        user_id: &str,
        new_baseline: f64,
    ) -> ResultEngine<RecalcSummary> {
        if new_baseline < 0.0 {
            return Err(EngineError::Validation(
                "baseline_odometer must be >= 0".to_string(),
            ));
        }

        let mut vehicle = with_tx!(self, |db_tx| {
            let vehicle = self.require_vehicle(&db_tx, vehicle_id, user_id).await?;
            store::update_vehicle_baseline(&db_tx, vehicle_id, new_baseline).await?;
            Ok(vehicle)
        })?;

        vehicle.baseline_odometer = new_baseline;
        self.reconcile_chain(&vehicle).await
    }

    /// Delete a vehicle together with its fillups.
    pub async fn delete_vehicle(&self, vehicle_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_vehicle(&db_tx, vehicle_id, user_id).await?;
            store::delete_vehicle_by_id(&db_tx, vehicle_id).await?;
            Ok(())
        })
    }
}
