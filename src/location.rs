use nom::{
    character::complete::{char, one_of, space0},
    combinator::{all_consuming, opt},
    number::complete::double,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use phf::phf_set;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::calendar::MonthKey;
use crate::error::{Error, ErrorKind, Result};
use crate::l10n::Language;

pub const LOCATION_FILE: &str = "README.md";

/// Unfilled template values that must never reach a printed page.
static PLACEHOLDERS: phf::Set<&'static str> = phf_set! {
    "[Location needed]",
    "[Stadt benötigt]",
    "[Ubicación necesaria]",
    "[Coordinates needed]",
};

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| value.contains(p))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    fn component(input: &str) -> IResult<&str, (f64, Option<char>)> {
        let (input, degrees) = double(input)?;
        let (input, _) = opt(char('°'))(input)?;
        let (input, minutes) = opt(terminated(double, one_of("′'")))(input)?;
        let (input, seconds) = opt(terminated(double, one_of("″\"")))(input)?;
        let (input, hemisphere) = preceded(space0, opt(one_of("NSEW")))(input)?;

        let magnitude = degrees.abs() + minutes.unwrap_or(0.0) / 60.0 + seconds.unwrap_or(0.0) / 3600.0;
        let value = match hemisphere {
            Some('S') | Some('W') => -magnitude,
            Some(_) => magnitude,
            None => degrees.signum() * magnitude,
        };

        Ok((input, (value, hemisphere)))
    }

    fn pair(input: &str) -> IResult<&str, ((f64, Option<char>), (f64, Option<char>))> {
        all_consuming(tuple((
            Self::component,
            preceded(tuple((space0, opt(char(',')), space0)), Self::component),
        )))(input)
    }
}

impl FromStr for Coordinates {
    type Err = Error;

    /// Accepts `4.25°S, 79.23°W`, `8°17′3″S 115°35′21″E` and plain signed
    /// decimals `-8.28, 115.59`. Latitude comes first.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            Error::new(
                ErrorKind::MissingLocationData,
                &format!("Could not parse coordinates '{}': {}", s, reason),
            )
        };

        let (_, ((latitude, lat_hemi), (longitude, lon_hemi))) =
            Self::pair(s.trim()).map_err(|_| invalid("unrecognized format"))?;

        if matches!(lat_hemi, Some('E') | Some('W')) || matches!(lon_hemi, Some('N') | Some('S')) {
            return Err(invalid("latitude must come before longitude"));
        }
        if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
            return Err(invalid("out of range"));
        }

        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}°{}, {:.2}°{}",
            self.latitude.abs(),
            if self.latitude < 0.0 { 'S' } else { 'N' },
            self.longitude.abs(),
            if self.longitude < 0.0 { 'W' } else { 'E' }
        )
    }
}

/// Raw `+ key: value` entries of one month's location file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationFile {
    fields: BTreeMap<String, String>,
}

impl LocationFile {
    pub fn parse(content: &str) -> Self {
        let fields = content
            .lines()
            .filter_map(|line| line.trim().strip_prefix('+'))
            .filter_map(|entry| {
                let (key, value) = entry.split_once(':')?;
                Some((key.trim().to_lowercase(), value.trim().to_owned()))
            })
            .collect();

        LocationFile { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationRecord {
    pub month_key: MonthKey,
    pub language: Language,
    pub display_text: String,
    pub coordinates_text: String,
    pub coordinates: Coordinates,
    pub validated: bool,
}

/// Location files of every month directory found under the photo root.
#[derive(Clone, Debug, Default)]
pub struct LocationTable {
    photos_dir: PathBuf,
    files: BTreeMap<MonthKey, LocationFile>,
}

impl LocationTable {
    pub fn new(photos_dir: &Path) -> Self {
        LocationTable {
            photos_dir: photos_dir.to_path_buf(),
            files: BTreeMap::new(),
        }
    }

    /// Reads `<photos_dir>/<YYYY>/<MM>/README.md` for every month directory.
    /// Unreadable files are left out so only the months needing them fail.
    pub fn scan(photos_dir: &Path) -> Result<Self> {
        let mut table = LocationTable::new(photos_dir);

        if !photos_dir.is_dir() {
            log::warn!("Photo directory '{}' does not exist", photos_dir.display());
            return Ok(table);
        }

        for year_entry in fs::read_dir(photos_dir)?.filter_map(|e| e.ok()) {
            let year = match year_entry.file_name().to_str().and_then(|n| n.parse::<i32>().ok()) {
                Some(year) if year_entry.path().is_dir() => year,
                _ => continue,
            };

            for month_entry in fs::read_dir(year_entry.path())?.filter_map(|e| e.ok()) {
                let month = match month_entry
                    .file_name()
                    .to_str()
                    .filter(|n| n.len() == 2)
                    .and_then(|n| n.parse::<u32>().ok())
                {
                    Some(month) if (1..=12).contains(&month) => month,
                    _ => continue,
                };

                let path = month_entry.path().join(LOCATION_FILE);
                match fs::read_to_string(&path) {
                    Ok(content) => {
                        table.insert(MonthKey::year_bound(year, month), LocationFile::parse(&content));
                    }
                    Err(err) => log::debug!("No location file '{}': {}", path.display(), err),
                }
            }
        }

        log::info!("Loaded {} location files", table.files.len());
        Ok(table)
    }

    pub fn insert(&mut self, key: MonthKey, file: LocationFile) {
        self.files.insert(key, file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn file_path(&self, key: &MonthKey) -> PathBuf {
        let mut path = self.photos_dir.clone();
        if let Some(year) = key.year() {
            path.push(format!("{:04}", year));
        }
        path.push(format!("{:02}", key.month()));
        path.push(LOCATION_FILE);
        path
    }

    /// Location of one month in one language. Every field must be given
    /// explicitly for that language, there is no fallback to another one.
    pub fn resolve(&self, key: &MonthKey, language: Language) -> Result<LocationRecord> {
        let path = self.file_path(key);
        let file = self.files.get(key).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingLocationData,
                &format!("'{}' not found", path.display()),
            )
        })?;

        let location_key = format!("location_{}", language.code());
        let mut missing = Vec::new();
        let mut placeholders = Vec::new();

        let mut required = |field: &str| -> Option<String> {
            match file.get(field).filter(|v| !v.is_empty()) {
                None => {
                    missing.push(field.to_owned());
                    None
                }
                Some(value) if is_placeholder(value) => {
                    placeholders.push(field.to_owned());
                    None
                }
                Some(value) => Some(value.to_owned()),
            }
        };

        let display_text = required(&location_key);
        let coordinates_text = required("coordinates");
        let year = required("year");

        if !missing.is_empty() || !placeholders.is_empty() {
            let mut reasons = Vec::new();
            if !missing.is_empty() {
                reasons.push(format!("missing: {}", missing.join(", ")));
            }
            if !placeholders.is_empty() {
                reasons.push(format!("has placeholders: {}", placeholders.join(", ")));
            }
            return Err(Error::new(
                ErrorKind::MissingLocationData,
                &format!("'{}' {}", path.display(), reasons.join("; ")),
            ));
        }

        // all three are present past this point
        let (display_text, coordinates_text, year) = match (display_text, coordinates_text, year) {
            (Some(d), Some(c), Some(y)) => (d, c, y),
            _ => return Err(Error::from(ErrorKind::MissingLocationData)),
        };

        if let Some(expected) = key.year() {
            if year.parse::<i32>().ok() != Some(expected) {
                return Err(Error::new(
                    ErrorKind::MissingLocationData,
                    &format!("'{}' has year '{}', expected {}", path.display(), year, expected),
                ));
            }
        }

        let coordinates = coordinates_text.parse::<Coordinates>().map_err(|err| {
            err.with_msg(&format!(
                "'{}' has unreadable coordinates '{}'",
                path.display(),
                coordinates_text
            ))
        })?;

        Ok(LocationRecord {
            month_key: *key,
            language,
            display_text,
            coordinates_text,
            coordinates,
            validated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "# February 2026\n\
        + location_en: Bali, Indonesia\n\
        + location_de: Bali, Indonesien\n\
        + coordinates: 8°17′3″S 115°35′21″E\n\
        + year: 2026\n";

    fn table_with(key: MonthKey, content: &str) -> LocationTable {
        let mut table = LocationTable::new(Path::new("photos"));
        table.insert(key, LocationFile::parse(content));
        table
    }

    #[test]
    fn parses_coordinate_formats() {
        let c: Coordinates = "4.25°S, 79.23°W".parse().unwrap();
        assert!((c.latitude + 4.25).abs() < 1e-9);
        assert!((c.longitude + 79.23).abs() < 1e-9);

        let c: Coordinates = "8°17′3″S 115°35′21″E".parse().unwrap();
        assert!((c.latitude + (8.0 + 17.0 / 60.0 + 3.0 / 3600.0)).abs() < 1e-9);
        assert!((c.longitude - (115.0 + 35.0 / 60.0 + 21.0 / 3600.0)).abs() < 1e-9);

        let c: Coordinates = "-8.28, 115.59".parse().unwrap();
        assert!(c.latitude < 0.0 && c.longitude > 0.0);

        assert!("115°E, 8°S".parse::<Coordinates>().is_err());
        assert!("95°N, 10°E".parse::<Coordinates>().is_err());
        assert!("somewhere".parse::<Coordinates>().is_err());
    }

    #[test]
    fn resolves_explicit_language() {
        let key = MonthKey::year_bound(2026, 2);
        let table = table_with(key, README);

        let record = table.resolve(&key, Language::De).unwrap();
        assert_eq!(record.display_text, "Bali, Indonesien");
        assert!(record.validated);
        assert_eq!(record.coordinates.to_string(), "8.28°S, 115.59°E");
    }

    #[test]
    fn no_fallback_to_other_language() {
        let key = MonthKey::year_bound(2026, 2);
        let table = table_with(key, README);

        let err = table.resolve(&key, Language::Es).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingLocationData));
        assert!(err.to_string().contains("location_es"));
        // the other languages of the same month are unaffected
        assert!(table.resolve(&key, Language::En).is_ok());
    }

    #[test]
    fn rejects_placeholders() {
        let key = MonthKey::year_bound(2026, 3);
        let table = table_with(
            key,
            "+ location_en: [Location needed]\n+ coordinates: [Coordinates needed]\n+ year: 2026\n",
        );
        let err = table.resolve(&key, Language::En).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("has placeholders: location_en, coordinates"));
    }

    #[test]
    fn rejects_wrong_year_and_missing_file() {
        let key = MonthKey::year_bound(2027, 2);
        let table = table_with(key, README);
        assert!(table.resolve(&key, Language::En).is_err());

        let err = table
            .resolve(&MonthKey::year_bound(2026, 5), Language::En)
            .unwrap_err();
        assert!(err.to_string().contains("README.md"));
    }

    #[test]
    fn scans_month_directories() {
        let dir = tempfile::tempdir().unwrap();
        let month_dir = dir.path().join("2026").join("02");
        fs::create_dir_all(&month_dir).unwrap();
        fs::write(month_dir.join(LOCATION_FILE), README).unwrap();
        fs::create_dir_all(dir.path().join("2026").join("03")).unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();

        let table = LocationTable::scan(dir.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table
            .resolve(&MonthKey::year_bound(2026, 2), Language::En)
            .is_ok());
        assert!(table
            .resolve(&MonthKey::year_bound(2026, 3), Language::En)
            .is_err());
    }
}
