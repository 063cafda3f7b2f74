//! Simplified train kinematics used to turn route distances into days.
//!
//! A train accelerates uniformly up to its top speed and then cruises for
//! the rest of the service day. Every attached carriage slows it down by a
//! fixed percentage, capped at [`MAX_DEBUFF_PCT`].

use crate::calendar::Day;
use crate::error::{SimError, SimResult};

/// Service hours a train runs per simulated day
pub const MAX_SERVICE_HOURS: f64 = 14.0;
pub const DEBUFF_PCT_PER_CARRIAGE: u32 = 5;
pub const MAX_DEBUFF_PCT: u32 = 70;

/// Distance covered in one service day without carriage penalty.
pub fn max_daily_distance(acceleration: f64, top_speed: f64) -> f64 {
    if acceleration <= 0.0 || top_speed <= 0.0 {
        return 0.0;
    }

    let time_to_top_speed = top_speed / acceleration;
    if time_to_top_speed >= MAX_SERVICE_HOURS {
        0.5 * acceleration * MAX_SERVICE_HOURS
    } else {
        0.5 * acceleration * time_to_top_speed * time_to_top_speed
            + top_speed * (MAX_SERVICE_HOURS - time_to_top_speed)
    }
}

pub fn carriage_debuff_pct(carriage_count: usize) -> u32 {
    let pct = (carriage_count as u64).saturating_mul(DEBUFF_PCT_PER_CARRIAGE as u64);
    pct.min(MAX_DEBUFF_PCT as u64) as u32
}

pub fn debuffed_max_daily_distance(acceleration: f64, top_speed: f64, carriage_count: usize) -> u64 {
    let remaining_pct = (100 - carriage_debuff_pct(carriage_count)) as f64;
    (max_daily_distance(acceleration, top_speed) * remaining_pct / 100.0).floor() as u64
}

/// Whole days needed to cover `distance`, rounding any remainder up.
///
/// A leg always takes at least one day so a train never departs and
/// arrives within the same tick.
pub fn travel_time(train: &str, distance: u64, daily_distance: u64) -> SimResult<Day> {
    if daily_distance == 0 {
        return Err(SimError::ZeroDailyDistance {
            train: train.to_string(),
        });
    }
    Ok(distance.div_ceil(daily_distance).max(1))
}
