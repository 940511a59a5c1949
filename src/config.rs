use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::DEFAULT_SOURCE_YEAR;
use crate::calendar::WeekStart;
use crate::error::{Error, ErrorKind, Result};
use crate::l10n::Language;
use crate::layout::LayoutConfig;

const CONFIG_PATH_ENV_VAR: &str = "PHOTOCAL_CONFIG_FILE";

pub(crate) fn find_configfile_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR) {
        locations.push(PathBuf::from(path));
    }

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("photocal").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".photocal.toml"));
    }

    locations
}

/// Loads the config given on the command line or the first one found in the
/// default locations. Without any config file the defaults are used.
pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path);
    }

    match find_configfile_locations().into_iter().find(|p| p.is_file()) {
        Some(path) => Config::from_file(&path),
        None => {
            log::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub week_start: WeekStart,
    pub languages: Vec<Language>,
    pub source_year: i32,
    pub base_url: Option<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            week_start: WeekStart::default(),
            languages: Language::ALL.to_vec(),
            source_year: DEFAULT_SOURCE_YEAR,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub photos_dir: PathBuf,
    pub photo_table: PathBuf,
    pub output_dir: PathBuf,
    pub web_optimized: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            photos_dir: PathBuf::from("photos"),
            photo_table: PathBuf::from("photos/photo_information.txt"),
            output_dir: PathBuf::from("output"),
            web_optimized: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calendar: CalendarConfig,
    pub paths: PathConfig,
    pub layout: LayoutConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::from(e).with_msg(&format!("Could not read config '{}'", path.display()))
        })?;
        let config = Self::parse(&content).map_err(|e| {
            let reason = format!("'{}': {}", path.display(), e.message.as_deref().unwrap_or_default());
            e.with_msg(&reason)
        })?;
        log::info!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;

        if config.calendar.languages.is_empty() {
            return Err(Error::new(
                ErrorKind::ConfigParse,
                "At least one language must be configured",
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.calendar.languages, Language::ALL.to_vec());
        assert_eq!(config.layout.printable_height_mm, 237.0);
        assert_eq!(config.paths.photos_dir, PathBuf::from("photos"));
    }

    #[test]
    fn reads_all_sections() {
        let config = Config::parse(
            r#"
            [calendar]
            week_start = "sunday"
            languages = ["de", "es"]
            base_url = "https://example.org/calendar/"

            [paths]
            photos_dir = "/srv/photos"
            web_optimized = true

            [layout]
            printable_height_mm = 250.0
            spacing_mm = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.calendar.week_start, WeekStart::Sunday);
        assert_eq!(config.calendar.languages, vec![Language::De, Language::Es]);
        assert_eq!(config.calendar.source_year, DEFAULT_SOURCE_YEAR);
        assert_eq!(config.paths.photos_dir, PathBuf::from("/srv/photos"));
        assert_eq!(config.paths.output_dir, PathBuf::from("output"));
        assert!(config.paths.web_optimized);
        assert_eq!(config.layout.printable_height_mm, 250.0);
        assert_eq!(config.layout.printable_width_mm, 400.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("[calendar]\nweek_start = \"friday\"\n").is_err());
        assert!(Config::parse("[calendar]\nlanguages = [\"fr\"]\n").is_err());
        let err = Config::parse("[calendar]\nlanguages = []\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ConfigParse));
    }

    #[test]
    fn explicit_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[calendar]\nsource_year = 2025").unwrap();

        let config = load_suitable_config(Some(file.path())).unwrap();
        assert_eq!(config.calendar.source_year, 2025);

        assert!(load_suitable_config(Some(Path::new("/nonexistent/photocal.toml"))).is_err());
    }
}
