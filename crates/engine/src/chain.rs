//! Full-chain recalculation of derived fillup fields.
//!
//! Every mutation (create, update, delete, import, baseline edit) funnels
//! through [`recalculate`]: the complete set of a vehicle's fillups is sorted
//! into chain order and walked once from the baseline odometer, recomputing
//! `distance_traveled` and `fuel_consumption` for each record. Patching only
//! records "after" the edited row is unsound because a date edit can move a
//! record anywhere in the chain; the single full walk is O(n), always
//! correct, and idempotent.
//!
//! The function is pure: all reads happen before the call, all writes after,
//! through the store layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Fillup, MileageMode, stats};

/// Stored distances within this tolerance of the recomputed value are left
/// untouched, absorbing the 2-decimal rounding applied to user input upstream.
pub const DISTANCE_TOLERANCE: f64 = 0.1;
/// Same, for consumption values.
pub const CONSUMPTION_TOLERANCE: f64 = 0.01;

/// New derived values for one fillup whose stored fields drifted out of
/// tolerance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillupPatch {
    pub fillup_id: Uuid,
    pub distance_traveled: f64,
    pub fuel_consumption: Option<f64>,
}

/// Non-fatal consistency flags raised during a chain walk.
///
/// Warnings never block a save; they are attached to the operation result and
/// the caller decides how to surface them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainWarning {
    /// The odometer reading is lower than its chain predecessor (or the
    /// baseline). The record is kept with distance clamped to zero.
    OdometerRegression {
        fillup_id: Uuid,
        odometer: f64,
        reference: f64,
    },
    /// The odometer reading equals its chain predecessor.
    OdometerStagnant { fillup_id: Uuid, odometer: f64 },
}

impl ChainWarning {
    pub fn fillup_id(&self) -> Uuid {
        match self {
            Self::OdometerRegression { fillup_id, .. } | Self::OdometerStagnant { fillup_id, .. } => {
                *fillup_id
            }
        }
    }
}

/// Result of a chain walk: the records whose derived fields must be
/// rewritten, and the warnings observed along the way.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub updated: Vec<FillupPatch>,
    pub warnings: Vec<ChainWarning>,
}

/// Sorts fillups into chain order: date, then creation time, then id.
///
/// The secondary keys make same-date entries deterministic; `created_at` is
/// assigned by the engine at insert, so ties resolve in insertion order.
pub fn chain_order(fillups: &mut [Fillup]) {
    fillups.sort_by(|a, b| {
        (a.date, a.created_at, a.id).cmp(&(b.date, b.created_at, b.id))
    });
}

/// Recomputes derived fields over the **complete** fillup set of one vehicle.
///
/// Any subset walk is unsafe: an edit can reorder the chain, changing which
/// records are neighbors. Callers pass everything, the walk decides what
/// actually changed.
pub fn recalculate(
    baseline_odometer: f64,
    mileage_mode: MileageMode,
    fillups: &[Fillup],
) -> ChainOutcome {
    let mut ordered: Vec<&Fillup> = fillups.iter().collect();
    ordered.sort_by(|a, b| (a.date, a.created_at, a.id).cmp(&(b.date, b.created_at, b.id)));

    let mut outcome = ChainOutcome::default();
    let mut reference = baseline_odometer;

    for fillup in ordered {
        let new_distance = match (mileage_mode, fillup.odometer) {
            (MileageMode::Odometer, Some(odometer)) => {
                let raw_delta = stats::distance_from_odometers(odometer, reference);
                if raw_delta < 0.0 {
                    outcome.warnings.push(ChainWarning::OdometerRegression {
                        fillup_id: fillup.id,
                        odometer,
                        reference,
                    });
                } else if raw_delta == 0.0 {
                    outcome.warnings.push(ChainWarning::OdometerStagnant {
                        fillup_id: fillup.id,
                        odometer,
                    });
                }
                // The chain advances to the actual reading even on a
                // regression, so one bad entry does not poison its successors.
                reference = odometer;
                raw_delta.max(0.0)
            }
            // Distance mode, or an odometer-mode record without a reading:
            // the stored distance is authoritative. The reference still
            // advances (internal bookkeeping only, never persisted) so any
            // later odometer-bearing record stays consistent.
            _ => {
                let distance = fillup.distance_traveled;
                reference += distance;
                distance
            }
        };

        let new_consumption = stats::consumption(new_distance, fillup.fuel_amount);

        if derived_fields_differ(new_distance, new_consumption, fillup) {
            outcome.updated.push(FillupPatch {
                fillup_id: fillup.id,
                distance_traveled: new_distance,
                fuel_consumption: new_consumption,
            });
        }
    }

    outcome
}

fn derived_fields_differ(new_distance: f64, new_consumption: Option<f64>, stored: &Fillup) -> bool {
    if (new_distance - stored.distance_traveled).abs() > DISTANCE_TOLERANCE {
        return true;
    }
    match (new_consumption, stored.fuel_consumption) {
        (None, None) => false,
        (Some(new), Some(old)) => (new - old).abs() > CONSUMPTION_TOLERANCE,
        _ => true,
    }
}
