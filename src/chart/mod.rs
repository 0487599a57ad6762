mod error;
mod julian;
mod params;
mod parsing;
mod types;

pub use error::DeriveError;
pub use julian::{julian_day, julian_day_for};
pub use params::{derive_chart_params, ChartParams, ParamValue};
pub use parsing::{BirthExport, ChartExport};
pub use types::{ChartRecord, HouseCusp, PlanetPosition, Significators};
#[cfg(test)]
pub use types::{BirthData, EphemerisSnapshot, Planet};
