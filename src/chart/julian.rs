use crate::chart::error::DeriveError;
use crate::chart::types::BirthData;

/// Universal-time hour of the birth instant. May fall outside [0, 24).
pub fn ut_hour(birth: &BirthData) -> f64 {
    birth.hour as f64 - birth.utc_offset
        + birth.minute as f64 / 60.0
        + birth.second as f64 / 3600.0
}

/// Gregorian-calendar Julian Day (Meeus, Astronomical Algorithms ch. 7).
///
/// `ut_hour` is added as a day fraction, so values below 0 or above 24 roll
/// into the neighbouring days.
pub fn julian_day(year: i32, month: u32, day: u32, ut_hour: f64) -> Result<f64, DeriveError> {
    if !(1..=12).contains(&month) {
        return Err(DeriveError::InvalidJulianDay(format!("month {}", month)));
    }
    if !(1..=31).contains(&day) {
        return Err(DeriveError::InvalidJulianDay(format!("day {}", day)));
    }
    if !ut_hour.is_finite() {
        return Err(DeriveError::InvalidJulianDay(format!("hour {}", ut_hour)));
    }

    let (y, m) = if month <= 2 {
        (year as f64 - 1.0, month as f64 + 12.0)
    } else {
        (year as f64, month as f64)
    };
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    Ok((365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day as f64 + b
        - 1524.5
        + ut_hour / 24.0)
}

pub fn julian_day_for(birth: &BirthData) -> Result<f64, DeriveError> {
    julian_day(birth.year, birth.month, birth.day, ut_hour(birth))
}
