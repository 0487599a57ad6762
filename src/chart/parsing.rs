use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chart::error::InputError;
use crate::chart::types::{
    BirthData, ChartRecord, EphemerisSnapshot, HouseCusp, Planet, PlanetPosition, Significators,
};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M:%S";
const MAX_UTC_OFFSET_HOURS: f64 = 14.0;

/// Civil date and time fields as typed into the birth form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Parses `DD/MM/YYYY` and `HH:MM:SS`.
pub fn parse_date_time(date: &str, time: &str) -> Result<CivilDateTime, InputError> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| InputError::Date(date.to_string()))?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|_| InputError::Time(time.to_string()))?;

    Ok(CivilDateTime {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour: time.hour(),
        minute: time.minute(),
        // chrono admits a leap second as 60
        second: time.second().min(59),
    })
}

impl BirthData {
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        utc_offset: f64,
    ) -> Result<Self, InputError> {
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(InputError::OutOfRange {
                field: "date",
                value: format!("{:04}-{:02}-{:02}", year, month, day),
            });
        }
        let check = |field: &'static str, value: u32, max: u32| {
            if value > max {
                Err(InputError::OutOfRange {
                    field,
                    value: value.to_string(),
                })
            } else {
                Ok(())
            }
        };
        check("hour", hour, 23)?;
        check("minute", minute, 59)?;
        check("second", second, 59)?;
        if !utc_offset.is_finite() || utc_offset.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(InputError::OutOfRange {
                field: "utc_offset",
                value: utc_offset.to_string(),
            });
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            utc_offset,
        })
    }

    pub fn from_civil(civil: CivilDateTime, utc_offset: f64) -> Result<Self, InputError> {
        Self::new(
            civil.year,
            civil.month,
            civil.day,
            civil.hour,
            civil.minute,
            civil.second,
            utc_offset,
        )
    }

    pub fn date_string(&self) -> String {
        format!("{:02}/{:02}/{:04}", self.day, self.month, self.year)
    }

    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BirthExport {
    /// DD/MM/YYYY
    pub date: String,
    /// HH:MM:SS
    pub time: String,
    /// Hours east of UTC.
    pub utc_offset: f64,
}

/// On-disk and on-the-wire shape of an ephemeris export.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartExport {
    pub name: String,
    pub birth: BirthExport,
    /// Keyed by body name: Asc, Sun, Moon, ... Ketu. Other bodies are ignored.
    #[serde(default)]
    pub planets: BTreeMap<String, PlanetPosition>,
    #[serde(default)]
    pub houses: Vec<HouseCusp>,
    #[serde(default)]
    pub house_significators: BTreeMap<String, Significators>,
    #[serde(default)]
    pub planet_significators: BTreeMap<String, Significators>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub vimshottari_dasa: serde_json::Value,
}

impl TryFrom<ChartExport> for ChartRecord {
    type Error = InputError;

    fn try_from(export: ChartExport) -> Result<Self, Self::Error> {
        let civil = parse_date_time(&export.birth.date, &export.birth.time)?;
        let birth = BirthData::from_civil(civil, export.birth.utc_offset)?;

        let mut snapshot = EphemerisSnapshot::default();
        for (name, position) in export.planets {
            match Planet::from_name(&name) {
                Some(planet) => {
                    snapshot.planets.insert(planet, position);
                }
                None => log::debug!("Skipping body outside the chart vocabulary: {}", name),
            }
        }
        for cusp in &export.houses {
            if !(1..=12).contains(&cusp.house) {
                return Err(InputError::House(cusp.house));
            }
        }
        snapshot.houses = export.houses;

        Ok(ChartRecord {
            name: export.name,
            birth,
            snapshot,
            house_significators: export.house_significators,
            planet_significators: export.planet_significators,
            vimshottari_dasa: export.vimshottari_dasa,
        })
    }
}

impl From<ChartRecord> for ChartExport {
    fn from(record: ChartRecord) -> Self {
        ChartExport {
            birth: BirthExport {
                date: record.birth.date_string(),
                time: record.birth.time_string(),
                utc_offset: record.birth.utc_offset,
            },
            name: record.name,
            planets: record
                .snapshot
                .planets
                .into_iter()
                .map(|(planet, position)| (planet.info().name.to_string(), position))
                .collect(),
            houses: record.snapshot.houses,
            house_significators: record.house_significators,
            planet_significators: record.planet_significators,
            vimshottari_dasa: record.vimshottari_dasa,
        }
    }
}

impl ChartRecord {
    /// Reads an export written as YAML (or JSON, which YAML accepts).
    pub fn from_str(content: &str) -> Result<Self, InputError> {
        let export: ChartExport = serde_yaml::from_str(content)?;
        ChartRecord::try_from(export)
    }

    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"
name: Asha
birth:
  date: 09/01/2000
  time: "14:30:00"
  utc_offset: 5.5
planets:
  Asc: { longitude: 12.5 }
  Sun: { LonDecDeg: 280.0, isRetroGrade: false, Rasi: Capricorn, Nakshatra: Uttara Ashadha, HouseNr: 10 }
  Saturn: { longitude: 16.2, retrograde: true }
  Uranus: { longitude: 290.1, retrograde: false }
houses:
  - { house: 1, longitude: 10.0 }
  - { HouseNr: 2, LonDecDeg: 40.0 }
house_significators:
  I: { A: [Mars], B: [], C: [Sun, Saturn], D: [] }
vimshottari_dasa:
  Moon: { start: 1995-02-01, end: 2005-02-01 }
"#;

    #[test]
    fn parses_form_fields() {
        let civil = parse_date_time("09/01/2000", "14:30:00").unwrap();
        assert_eq!(
            civil,
            CivilDateTime {
                year: 2000,
                month: 1,
                day: 9,
                hour: 14,
                minute: 30,
                second: 0
            }
        );
    }

    #[test]
    fn rejects_malformed_form_fields() {
        assert!(matches!(
            parse_date_time("2000-01-09", "14:30:00"),
            Err(InputError::Date(_))
        ));
        assert!(matches!(
            parse_date_time("31/02/2000", "14:30:00"),
            Err(InputError::Date(_))
        ));
        assert!(matches!(
            parse_date_time("09/01/2000", "2:30 PM"),
            Err(InputError::Time(_))
        ));
    }

    #[test]
    fn validates_birth_fields() {
        assert!(BirthData::new(2000, 1, 9, 14, 30, 0, 5.5).is_ok());
        assert!(BirthData::new(2000, 1, 9, 24, 0, 0, 0.0).is_err());
        assert!(BirthData::new(2001, 2, 29, 0, 0, 0, 0.0).is_err());
        assert!(BirthData::new(2000, 1, 9, 0, 0, 0, 15.0).is_err());
        assert!(BirthData::new(2000, 1, 9, 0, 0, 0, f64::NAN).is_err());
    }

    #[test]
    fn loads_export_and_drops_unknown_bodies() {
        let record = ChartRecord::from_str(EXPORT).unwrap();
        assert_eq!(record.name, "Asha");
        assert_eq!(record.birth.utc_offset, 5.5);
        assert_eq!(record.birth.day, 9);

        let planets: Vec<_> = record.snapshot.planets.keys().copied().collect();
        assert_eq!(planets, vec![Planet::Ascendant, Planet::Sun, Planet::Saturn]);

        let sun = &record.snapshot.planets[&Planet::Sun];
        assert_eq!(sun.longitude, 280.0);
        assert_eq!(sun.rasi.as_deref(), Some("Capricorn"));
        assert_eq!(sun.house, Some(10));
        assert!(record.snapshot.planets[&Planet::Saturn].retrograde);

        assert_eq!(record.snapshot.houses.len(), 2);
        assert_eq!(record.snapshot.houses[1].house, 2);
        assert_eq!(record.house_significators["I"].c, vec!["Sun", "Saturn"]);
        assert!(record.vimshottari_dasa.get("Moon").is_some());
    }

    #[test]
    fn rejects_house_numbers_outside_the_wheel() {
        let yaml = EXPORT.replace("house: 1,", "house: 13,");
        assert!(matches!(
            ChartRecord::from_str(&yaml),
            Err(InputError::House(13))
        ));
    }

    #[test]
    fn json_wire_format_matches_export() {
        let record = ChartRecord::from_str(EXPORT).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["birth"]["date"], "09/01/2000");
        assert_eq!(json["birth"]["time"], "14:30:00");
        assert_eq!(json["planets"]["Asc"]["longitude"], 12.5);

        let back: ChartRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asha.yaml");
        std::fs::write(&path, EXPORT).unwrap();
        assert_eq!(ChartRecord::from_file(&path).unwrap().name, "Asha");

        assert!(matches!(
            ChartRecord::from_file(&dir.path().join("missing.yaml")),
            Err(InputError::Io(_))
        ));
    }
}
