use crate::chart::julian_day;
use crate::ephemeris::{AyanamsaSource, EphemerisError};

const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Lahiri definitional epoch, 1956-03-21 00:00 UT.
const LAHIRI_EPOCH_JD: f64 = 2_435_553.5;
/// Lahiri ayanamsa at its epoch, degrees.
const LAHIRI_AT_EPOCH: f64 = 23.245524;
/// General precession in longitude, arcseconds per year.
const PRECESSION_ARCSEC_PER_YEAR: f64 = 50.29;

const MIN_YEAR: i32 = -3000;
const MAX_YEAR: i32 = 3000;

/// Linear precession model of the Lahiri ayanamsa.
///
/// Exact at the Lahiri epoch and about 23.857° at J2000. Drifts from the full
/// precession series by arcminutes over historical birth dates, which is below
/// what the chart renderer can draw. Outside years -3000..3000 the lookup
/// fails and the caller falls back to its constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanLahiri;

impl MeanLahiri {
    fn valid_range() -> Result<(f64, f64), EphemerisError> {
        let bound = |year| {
            julian_day(year, 1, 1, 0.0).map_err(|e| EphemerisError::Unavailable(e.to_string()))
        };
        Ok((bound(MIN_YEAR)?, bound(MAX_YEAR)?))
    }
}

impl AyanamsaSource for MeanLahiri {
    fn ayanamsa(&self, jd: f64) -> Result<f64, EphemerisError> {
        let (min, max) = Self::valid_range()?;
        if !(min..=max).contains(&jd) {
            return Err(EphemerisError::OutOfRange { jd, min, max });
        }
        let years = (jd - LAHIRI_EPOCH_JD) / DAYS_PER_JULIAN_YEAR;
        Ok(LAHIRI_AT_EPOCH + years * PRECESSION_ARCSEC_PER_YEAR / 3600.0)
    }
}

/// Constant ayanamsa, for deployments that pin the value in config.
#[derive(Debug, Clone, Copy)]
pub struct FixedAyanamsa(pub f64);

impl AyanamsaSource for FixedAyanamsa {
    fn ayanamsa(&self, _jd: f64) -> Result<f64, EphemerisError> {
        Ok(self.0)
    }
}
