use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use super::parsing::ChartExport;

/// Bodies the chart renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Planet {
    #[strum(serialize = "Asc")]
    Ascendant,
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

pub struct PlanetInfo {
    pub planet: Planet,
    /// Name used by the ephemeris export.
    pub name: &'static str,
    /// Two-letter prefix of the renderer's query parameters.
    pub code: &'static str,
    pub retrograde_eligible: bool,
}

/// Renderer vocabulary. Luminaries, nodes and the ascendant never carry a
/// retrograde parameter.
pub const PLANETS: [PlanetInfo; 10] = [
    PlanetInfo { planet: Planet::Ascendant, name: "Asc", code: "Lg", retrograde_eligible: false },
    PlanetInfo { planet: Planet::Sun, name: "Sun", code: "Su", retrograde_eligible: false },
    PlanetInfo { planet: Planet::Moon, name: "Moon", code: "Mo", retrograde_eligible: false },
    PlanetInfo { planet: Planet::Mars, name: "Mars", code: "Ma", retrograde_eligible: true },
    PlanetInfo { planet: Planet::Mercury, name: "Mercury", code: "Me", retrograde_eligible: true },
    PlanetInfo { planet: Planet::Jupiter, name: "Jupiter", code: "Ju", retrograde_eligible: true },
    PlanetInfo { planet: Planet::Venus, name: "Venus", code: "Ve", retrograde_eligible: true },
    PlanetInfo { planet: Planet::Saturn, name: "Saturn", code: "Sa", retrograde_eligible: true },
    PlanetInfo { planet: Planet::Rahu, name: "Rahu", code: "Ra", retrograde_eligible: false },
    PlanetInfo { planet: Planet::Ketu, name: "Ketu", code: "Ke", retrograde_eligible: false },
];

impl Planet {
    pub const ALL: [Planet; 10] = [
        Planet::Ascendant,
        Planet::Sun,
        Planet::Moon,
        Planet::Mars,
        Planet::Mercury,
        Planet::Jupiter,
        Planet::Venus,
        Planet::Saturn,
        Planet::Rahu,
        Planet::Ketu,
    ];

    pub fn info(self) -> &'static PlanetInfo {
        // PLANETS is laid out in declaration order
        &PLANETS[self as usize]
    }

    pub fn code(self) -> &'static str {
        self.info().code
    }

    pub fn is_retrograde_eligible(self) -> bool {
        self.info().retrograde_eligible
    }

    /// Looks up an ephemeris export name. Returns `None` for bodies outside
    /// the renderer's vocabulary (Uranus, Neptune, ...).
    pub fn from_name(name: &str) -> Option<Planet> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("ascendant") {
            return Some(Planet::Ascendant);
        }
        PLANETS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.planet)
    }
}

/// One row of the ephemeris export for a single body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanetPosition {
    /// Sidereal longitude in degrees.
    #[serde(alias = "LonDecDeg")]
    pub longitude: f64,
    #[serde(default, alias = "isRetroGrade")]
    pub retrograde: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "Rasi")]
    pub rasi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "RasiLord")]
    pub rasi_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "Nakshatra")]
    pub nakshatra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "NakshatraLord")]
    pub nakshatra_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "SubLord")]
    pub sub_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "SubSubLord")]
    pub sub_sub_lord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "SignLonDMS")]
    pub sign_longitude_dms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "LatDMS")]
    pub latitude_dms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "HouseNr")]
    pub house: Option<u8>,
}

#[cfg(test)]
impl PlanetPosition {
    pub fn new(longitude: f64, retrograde: bool) -> Self {
        Self {
            longitude,
            retrograde,
            rasi: None,
            rasi_lord: None,
            nakshatra: None,
            nakshatra_lord: None,
            sub_lord: None,
            sub_sub_lord: None,
            sign_longitude_dms: None,
            latitude_dms: None,
            house: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HouseCusp {
    #[serde(alias = "HouseNr")]
    pub house: u8,
    /// Sidereal longitude in degrees.
    #[serde(alias = "LonDecDeg")]
    pub longitude: f64,
}

/// Positions from one ephemeris evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemerisSnapshot {
    pub planets: BTreeMap<Planet, PlanetPosition>,
    pub houses: Vec<HouseCusp>,
}

impl EphemerisSnapshot {
    /// Renderer bodies the export did not include.
    pub fn missing_planets(&self) -> Vec<Planet> {
        Planet::ALL
            .into_iter()
            .filter(|p| !self.planets.contains_key(p))
            .collect()
    }
}

#[cfg(test)]
impl EphemerisSnapshot {
    pub fn with_planet(mut self, planet: Planet, position: PlanetPosition) -> Self {
        self.planets.insert(planet, position);
        self
    }

    pub fn with_house(mut self, house: u8, longitude: f64) -> Self {
        self.houses.push(HouseCusp { house, longitude });
        self
    }
}

/// Civil birth instant. Built through `BirthData::new`, which validates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthData {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Hours east of UTC, fractional offsets allowed.
    pub utc_offset: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Significators {
    #[serde(default, alias = "A")]
    pub a: Vec<String>,
    #[serde(default, alias = "B")]
    pub b: Vec<String>,
    #[serde(default, alias = "C")]
    pub c: Vec<String>,
    #[serde(default, alias = "D")]
    pub d: Vec<String>,
}

/// Everything the ephemeris exported for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChartExport", into = "ChartExport")]
pub struct ChartRecord {
    pub name: String,
    pub birth: BirthData,
    pub snapshot: EphemerisSnapshot,
    pub house_significators: BTreeMap<String, Significators>,
    pub planet_significators: BTreeMap<String, Significators>,
    pub vimshottari_dasa: serde_json::Value,
}
