mod error;
mod lahiri;

pub use error::EphemerisError;
pub use lahiri::{FixedAyanamsa, MeanLahiri};

use std::sync::Arc;

use crate::config::EphemerisConfig;

/// Sidereal-to-tropical offset provider (Lahiri convention).
pub trait AyanamsaSource: Send + Sync {
    /// Ayanamsa in degrees at the given Julian Day (UT).
    fn ayanamsa(&self, jd: f64) -> Result<f64, EphemerisError>;
}

/// The configured source: a pinned value when `fixed_ayanamsa` is set,
/// otherwise the mean Lahiri model.
pub fn from_config(config: &EphemerisConfig) -> Arc<dyn AyanamsaSource> {
    match config.fixed_ayanamsa {
        Some(value) => {
            log::info!("Using fixed ayanamsa {}", value);
            Arc::new(FixedAyanamsa(value))
        }
        None => Arc::new(MeanLahiri),
    }
}
