use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chart::error::DeriveError;
use crate::chart::julian::julian_day_for;
use crate::chart::types::{BirthData, EphemerisSnapshot};
use crate::ephemeris::AyanamsaSource;

/// Lahiri ayanamsa used when the ephemeris cannot provide one.
pub const FALLBACK_AYANAMSA: f64 = 23.85;

const CHART_WIDTH: i64 = 850;
const CHART_HEIGHT: i64 = 1100;
const CHART_STYLE: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

#[cfg(test)]
impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Query parameters understood by the chart renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ChartParams(BTreeMap<String, ParamValue>);

impl ChartParams {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    fn insert(&mut self, key: String, value: ParamValue) {
        self.0.insert(key, value);
    }
}

/// `(sidereal + ayanamsa) mod 360`, always in [0, 360).
pub fn tropical_longitude(sidereal: f64, ayanamsa: f64) -> f64 {
    let lon = (sidereal + ayanamsa).rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}

/// Renderer sentinel: -1 for retrograde, 0 for direct.
pub fn normalize_retrograde(retrograde: bool) -> i64 {
    if retrograde {
        -1
    } else {
        0
    }
}

/// Builds the renderer parameter set for one chart.
///
/// A failed ayanamsa lookup is recovered with [`FALLBACK_AYANAMSA`]; any other
/// problem yields an error and no parameters at all.
pub fn derive_chart_params(
    snapshot: &EphemerisSnapshot,
    birth: &BirthData,
    ephemeris: &dyn AyanamsaSource,
) -> Result<ChartParams, DeriveError> {
    let jd = julian_day_for(birth)?;

    let ayanamsa = match ephemeris.ayanamsa(jd) {
        Ok(value) => value,
        Err(e) => {
            log::warn!(
                "Ayanamsa lookup failed for JD {}: {}; using {}",
                jd,
                e,
                FALLBACK_AYANAMSA
            );
            FALLBACK_AYANAMSA
        }
    };
    if !ayanamsa.is_finite() {
        return Err(DeriveError::InvalidAyanamsa(ayanamsa));
    }

    let mut params = ChartParams::default();

    for (planet, position) in &snapshot.planets {
        let sidereal = finite_longitude(&planet.to_string(), position.longitude)?;
        let code = planet.code();

        params.insert(
            format!("{}_Full_Degrees", code),
            ParamValue::Float(tropical_longitude(sidereal, ayanamsa)),
        );
        params.insert(
            format!("{}_Full_Degree_Sidereal", code),
            ParamValue::Float(sidereal),
        );
        if planet.is_retrograde_eligible() {
            params.insert(
                format!("{}_Retro", code),
                ParamValue::Int(normalize_retrograde(position.retrograde)),
            );
        }
    }

    for cusp in &snapshot.houses {
        let sidereal = finite_longitude(&format!("House {}", cusp.house), cusp.longitude)?;
        params.insert(
            format!("HouseCusp{}", cusp.house),
            ParamValue::Float(tropical_longitude(sidereal, ayanamsa)),
        );
    }

    params.insert("Width".into(), ParamValue::Int(CHART_WIDTH));
    params.insert("Height".into(), ParamValue::Int(CHART_HEIGHT));
    params.insert("ChartStyle".into(), ParamValue::Int(CHART_STYLE));
    params.insert("birthTimeZone".into(), ParamValue::Float(birth.utc_offset));
    params.insert("birthDST".into(), ParamValue::Int(0));
    params.insert("birthJulDay".into(), ParamValue::Float(jd));

    log::debug!(
        "Derived {} chart parameters (JD {}, ayanamsa {})",
        params.len(),
        jd,
        ayanamsa
    );

    Ok(params)
}

#[cfg(test)]
impl ChartParams {
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn finite_longitude(body: &str, value: f64) -> Result<f64, DeriveError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DeriveError::InvalidLongitude {
            body: body.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::types::{Planet, PlanetPosition};
    use crate::ephemeris::{EphemerisError, FixedAyanamsa};
    use approx::assert_abs_diff_eq;

    struct Unavailable;

    impl AyanamsaSource for Unavailable {
        fn ayanamsa(&self, _jd: f64) -> Result<f64, EphemerisError> {
            Err(EphemerisError::Unavailable("no ephemeris files".into()))
        }
    }

    const LAYOUT_KEYS: [&str; 6] = [
        "Width",
        "Height",
        "ChartStyle",
        "birthTimeZone",
        "birthDST",
        "birthJulDay",
    ];

    fn birth() -> BirthData {
        BirthData::new(2000, 1, 9, 14, 30, 0, 5.5).unwrap()
    }

    fn value(params: &ChartParams, key: &str) -> f64 {
        params
            .get(key)
            .unwrap_or_else(|| panic!("missing {}", key))
            .as_f64()
    }

    fn full_snapshot() -> EphemerisSnapshot {
        Planet::ALL
            .iter()
            .enumerate()
            .fold(EphemerisSnapshot::default(), |snap, (i, planet)| {
                snap.with_planet(*planet, PlanetPosition::new(i as f64 * 33.0, true))
            })
    }

    #[test]
    fn tropical_conversion_wraps() {
        assert_eq!(tropical_longitude(0.0, 0.0), 0.0);
        assert_abs_diff_eq!(tropical_longitude(350.0, 20.0), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tropical_longitude(280.0, 23.85), 303.85, epsilon = 1e-9);
    }

    #[test]
    fn tropical_conversion_is_a_true_modulo() {
        assert_abs_diff_eq!(tropical_longitude(-10.0, 5.0), 355.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tropical_longitude(-360.0, 0.0), 0.0, epsilon = 1e-9);
        assert_eq!(tropical_longitude(-1e-15, 0.0), 0.0);
    }

    #[test]
    fn tropical_conversion_stays_in_range() {
        for s in (-360..360).map(|d| d as f64 + 0.25) {
            for a in (0..360).step_by(7).map(|d| d as f64 + 0.5) {
                let t = tropical_longitude(s, a);
                assert!((0.0..360.0).contains(&t), "{} + {} -> {}", s, a, t);
            }
        }
    }

    #[test]
    fn retrograde_sentinel() {
        assert_eq!(normalize_retrograde(true), -1);
        assert_eq!(normalize_retrograde(false), 0);
    }

    #[test]
    fn sun_at_280_degrees() {
        let snapshot =
            EphemerisSnapshot::default().with_planet(Planet::Sun, PlanetPosition::new(280.0, false));
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(23.85)).unwrap();

        assert_abs_diff_eq!(value(&params, "Su_Full_Degrees"), 303.85, epsilon = 1e-9);
        assert_eq!(value(&params, "Su_Full_Degree_Sidereal"), 280.0);
    }

    #[test]
    fn house_cusp_uses_tropical_longitude() {
        let snapshot = EphemerisSnapshot::default().with_house(1, 10.0);
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(23.85)).unwrap();

        assert_abs_diff_eq!(value(&params, "HouseCusp1"), 33.85, epsilon = 1e-9);
    }

    #[test]
    fn layout_constants() {
        let params =
            derive_chart_params(&EphemerisSnapshot::default(), &birth(), &FixedAyanamsa(24.0))
                .unwrap();

        assert_eq!(params.get("Width"), Some(&ParamValue::Int(850)));
        assert_eq!(params.get("Height"), Some(&ParamValue::Int(1100)));
        assert_eq!(params.get("ChartStyle"), Some(&ParamValue::Int(2)));
        assert_eq!(params.get("birthDST"), Some(&ParamValue::Int(0)));
        assert_eq!(params.get("birthTimeZone"), Some(&ParamValue::Float(5.5)));
        assert_abs_diff_eq!(value(&params, "birthJulDay"), 2_451_552.875, epsilon = 1e-9);
        assert_eq!(params.len(), LAYOUT_KEYS.len());
    }

    #[test]
    fn retrograde_keys_only_for_eligible_planets() {
        let params =
            derive_chart_params(&full_snapshot(), &birth(), &FixedAyanamsa(23.85)).unwrap();

        for planet in Planet::ALL {
            let key = format!("{}_Retro", planet.code());
            match planet {
                Planet::Mars | Planet::Mercury | Planet::Jupiter | Planet::Venus | Planet::Saturn => {
                    assert_eq!(params.get(&key), Some(&ParamValue::Int(-1)), "{}", key)
                }
                _ => assert!(!params.contains_key(&key), "{}", key),
            }
            assert!(params.contains_key(&format!("{}_Full_Degrees", planet.code())));
            assert!(params.contains_key(&format!("{}_Full_Degree_Sidereal", planet.code())));
        }
        // 10 planets x 2 longitudes + 5 retro flags + layout
        assert_eq!(params.len(), 20 + 5 + LAYOUT_KEYS.len());
    }

    #[test]
    fn direct_motion_encodes_as_zero() {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Mercury, PlanetPosition::new(100.0, false));
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(23.85)).unwrap();
        assert_eq!(params.get("Me_Retro"), Some(&ParamValue::Int(0)));
    }

    #[test]
    fn partial_snapshot_degrades_gracefully() {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Sun, PlanetPosition::new(280.0, true))
            .with_planet(Planet::Moon, PlanetPosition::new(15.0, true))
            .with_house(1, 10.0)
            .with_house(7, 190.0);
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(23.85)).unwrap();

        let mut expected: Vec<&str> = vec![
            "Su_Full_Degrees",
            "Su_Full_Degree_Sidereal",
            "Mo_Full_Degrees",
            "Mo_Full_Degree_Sidereal",
            "HouseCusp1",
            "HouseCusp7",
        ];
        expected.extend(LAYOUT_KEYS);
        expected.sort_unstable();

        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn failed_lookup_falls_back_to_constant() {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Jupiter, PlanetPosition::new(350.0, false))
            .with_house(4, 100.0);
        let params = derive_chart_params(&snapshot, &birth(), &Unavailable).unwrap();

        assert_abs_diff_eq!(
            value(&params, "Ju_Full_Degrees"),
            (350.0 + FALLBACK_AYANAMSA) - 360.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(value(&params, "HouseCusp4"), 123.85, epsilon = 1e-9);
    }

    #[test]
    fn negative_sidereal_input_is_kept_raw() {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Rahu, PlanetPosition::new(-10.0, true));
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(5.0)).unwrap();

        assert_abs_diff_eq!(value(&params, "Ra_Full_Degrees"), 355.0, epsilon = 1e-9);
        assert_eq!(value(&params, "Ra_Full_Degree_Sidereal"), -10.0);
        assert!(!params.contains_key("Ra_Retro"));
    }

    #[test]
    fn non_finite_ayanamsa_fails_whole_derivation() {
        let snapshot = EphemerisSnapshot::default().with_planet(Planet::Sun, PlanetPosition::new(1.0, false));
        let result = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(f64::NAN));
        assert!(matches!(result, Err(DeriveError::InvalidAyanamsa(_))));
    }

    #[test]
    fn non_finite_longitude_fails_whole_derivation() {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Sun, PlanetPosition::new(1.0, false))
            .with_house(3, f64::INFINITY);
        let result = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(23.85));
        assert!(matches!(result, Err(DeriveError::InvalidLongitude { .. })));
    }

    #[test]
    fn query_pairs_use_renderer_names() {
        let snapshot =
            EphemerisSnapshot::default().with_planet(Planet::Ascendant, PlanetPosition::new(12.5, false));
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(20.0)).unwrap();
        let pairs = params.to_query_pairs();

        assert!(pairs.contains(&("Lg_Full_Degrees".to_string(), "32.5".to_string())));
        assert!(pairs.contains(&("Width".to_string(), "850".to_string())));
        assert!(pairs.contains(&("birthTimeZone".to_string(), "5.5".to_string())));
    }

    #[test]
    fn serializes_as_flat_object() {
        let snapshot = EphemerisSnapshot::default().with_house(1, 10.0);
        let params = derive_chart_params(&snapshot, &birth(), &FixedAyanamsa(20.0)).unwrap();
        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(json["Width"], 850);
        assert_eq!(json["HouseCusp1"], 30.0);
    }
}
