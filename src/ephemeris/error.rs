use thiserror::Error;

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("Julian Day {jd} outside supported range {min}..{max}")]
    OutOfRange { jd: f64, min: f64, max: f64 },
    #[error("ephemeris unavailable: {0}")]
    Unavailable(String),
}
