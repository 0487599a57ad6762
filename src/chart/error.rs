use thiserror::Error;

/// Birth fields missing or malformed. Raised before derivation is attempted.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid date '{0}', expected DD/MM/YYYY")]
    Date(String),
    #[error("invalid time '{0}', expected HH:MM:SS")]
    Time(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
    #[error("house number out of range: {0}")]
    House(u8),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chart parameters could not be produced this time.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("invalid Julian Day input: {0}")]
    InvalidJulianDay(String),
    #[error("ayanamsa is not a finite number: {0}")]
    InvalidAyanamsa(f64),
    #[error("{body} longitude is not a finite number: {value}")]
    InvalidLongitude { body: String, value: f64 },
}
