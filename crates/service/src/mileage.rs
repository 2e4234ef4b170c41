//! Mileage pricing.
use chrono::NaiveDate;

use models::{mileage_rate, ChargerType, VehicleType};

/// Distance times rate, rounded to the nearest penny. `None` when the
/// result is not a finite, non-negative amount that fits in `i64`.
pub fn calculate_amount_pence(distance_miles: f64, rate_pence_per_mile: i64) -> Option<i64> {
    let amount = (distance_miles * rate_pence_per_mile as f64).round();
    // i64::MAX as f64 rounds up to 2^63, so the bound is exclusive
    if !amount.is_finite() || amount < 0.0 || amount >= i64::MAX as f64 {
        return None;
    }
    Some(amount as i64)
}

/// Pick the applicable rate: matching vehicle (and charger for electric
/// vehicles), effective on `date`, latest `effective_from` first.
pub fn pick_rate<'a>(
    rates: &'a [mileage_rate::Model],
    vehicle: VehicleType,
    charger: Option<ChargerType>,
    date: NaiveDate,
) -> Option<&'a mileage_rate::Model> {
    rates
        .iter()
        .filter(|r| r.applies_to(vehicle, charger) && r.is_effective_on(date))
        .max_by_key(|r| r.effective_from)
}
