//! Pure numeric primitives for fillup statistics.
//!
//! These functions never touch the database and never panic: every edge case
//! (zero distance, zero fuel, backwards odometer) has a defined value.

/// Fuel consumption per 100 distance units.
///
/// Returns `None` when `distance` is not strictly positive: a fillup with an
/// unknown or zero distance has no meaningful consumption.
#[must_use]
pub fn consumption(distance: f64, fuel_amount: f64) -> Option<f64> {
    if distance > 0.0 {
        Some(fuel_amount / distance * 100.0)
    } else {
        None
    }
}

/// Price paid per unit of fuel.
///
/// Callers treat this as always-present, so a non-positive `fuel_amount`
/// yields `0.0` instead of an absent value.
#[must_use]
pub fn price_per_unit(total_price: f64, fuel_amount: f64) -> f64 {
    if fuel_amount > 0.0 {
        total_price / fuel_amount
    } else {
        0.0
    }
}

/// Signed odometer delta, deliberately unclamped.
///
/// The chain walk clamps to zero; callers that need to detect a backwards
/// reading use the raw sign.
#[must_use]
pub fn distance_from_odometers(current: f64, reference: f64) -> f64 {
    current - reference
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumption_requires_positive_distance() {
        assert_eq!(consumption(500.0, 50.0), Some(10.0));
        assert_eq!(consumption(0.0, 50.0), None);
        assert_eq!(consumption(-10.0, 50.0), None);
    }

    #[test]
    fn price_per_unit_never_divides_by_zero() {
        assert_eq!(price_per_unit(75.0, 50.0), 1.5);
        assert_eq!(price_per_unit(75.0, 0.0), 0.0);
        assert_eq!(price_per_unit(0.0, 50.0), 0.0);
    }

    #[test]
    fn odometer_delta_keeps_sign() {
        assert_eq!(distance_from_odometers(10500.0, 10000.0), 500.0);
        assert_eq!(distance_from_odometers(950.0, 1500.0), -550.0);
        assert_eq!(distance_from_odometers(1500.0, 1500.0), 0.0);
    }
}
