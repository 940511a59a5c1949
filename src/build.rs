use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::{CalendarAssembler, CalendarPage, CalendarRequest, PhotoState};
use crate::calendar::{month_from_number, MonthKey, WeekStart};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::l10n::Language;
use crate::layout::LayoutSizer;
use crate::location::LocationTable;
use crate::photos::{PhotoLocator, PhotoTable};

pub const REPORT_FILE: &str = "build_report.json";
const PERPETUAL_DIR: &str = "perpetual";

/// Photo and location tables of one run. Loaded once, then only borrowed.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub photos: PhotoTable,
    pub locations: LocationTable,
}

impl Snapshot {
    pub fn new(photos: PhotoTable, locations: LocationTable) -> Self {
        Snapshot { photos, locations }
    }

    pub fn load(config: &Config) -> Result<Self> {
        let photos = PhotoTable::from_file(&config.paths.photo_table)?;
        let locations = LocationTable::scan(&config.paths.photos_dir)?;
        Ok(Snapshot::new(photos, locations))
    }

    pub fn assembler(&self, config: &Config) -> CalendarAssembler<'_> {
        CalendarAssembler::new(
            &self.photos,
            &self.locations,
            PhotoLocator::new(&config.paths.photos_dir, config.paths.web_optimized),
        )
        .with_layout(LayoutSizer::new(config.layout))
        .with_source_year(config.calendar.source_year)
        .with_base_url(config.calendar.base_url.clone())
    }
}

/// Every (month, language) unit of one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildPlan {
    units: Vec<CalendarRequest>,
}

impl BuildPlan {
    pub fn year_bound(
        year: i32,
        months: &[u32],
        languages: &[Language],
        week_start: WeekStart,
    ) -> Result<Self> {
        Self::validate(months)?;
        let units = months
            .iter()
            .flat_map(|&month| {
                languages
                    .iter()
                    .map(move |&language| CalendarRequest::year_bound(year, month, language, week_start))
            })
            .collect();
        Ok(BuildPlan { units })
    }

    pub fn perpetual(months: &[u32], languages: &[Language]) -> Result<Self> {
        Self::validate(months)?;
        let units = months
            .iter()
            .flat_map(|&month| {
                languages
                    .iter()
                    .map(move |&language| CalendarRequest::perpetual(month, language))
            })
            .collect();
        Ok(BuildPlan { units })
    }

    fn validate(months: &[u32]) -> Result<()> {
        months.iter().try_for_each(|&m| month_from_number(m).map(|_| ()))
    }

    pub fn units(&self) -> &[CalendarRequest] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

pub trait PageRenderer {
    /// Writes one page and returns where it went.
    fn render(&mut self, page: &CalendarPage) -> Result<PathBuf>;
}

/// Writes each page tree as JSON to `<output>/<year|perpetual>/<lang>/<key>.json`.
#[derive(Clone, Debug)]
pub struct JsonRenderer {
    output_dir: PathBuf,
}

impl JsonRenderer {
    pub fn new(output_dir: &Path) -> Self {
        JsonRenderer {
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn page_path(&self, key: &MonthKey, language: Language) -> PathBuf {
        let group = match key.year() {
            Some(year) => format!("{:04}", year),
            None => PERPETUAL_DIR.to_owned(),
        };
        self.output_dir
            .join(group)
            .join(language.code())
            .join(format!("{}.json", key))
    }
}

impl PageRenderer for JsonRenderer {
    fn render(&mut self, page: &CalendarPage) -> Result<PathBuf> {
        let path = self.page_path(&page.month_key, page.language);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, serde_json::to_string_pretty(page)?)?;
        Ok(path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitSuccess {
    pub month_key: MonthKey,
    pub language: Language,
    pub output: PathBuf,
    pub empty_frames: usize,
    pub placeholders: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitFailure {
    pub month_key: MonthKey,
    pub language: Language,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub succeeded: Vec<UnitSuccess>,
    pub failed: Vec<UnitFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn fail(&mut self, request: &CalendarRequest, err: Error) {
        log::error!("{} ({}): {}", request.month_key(), request.language, err);
        self.failed.push(UnitFailure {
            month_key: request.month_key(),
            language: request.language,
            reason: err.to_string(),
        });
    }
}

/// Builds every unit of the plan. A failing unit is recorded in the report
/// and the remaining units are built regardless.
pub fn run(
    plan: &BuildPlan,
    assembler: &CalendarAssembler<'_>,
    renderer: &mut dyn PageRenderer,
) -> BuildReport {
    let mut report = BuildReport::default();

    for request in plan.units() {
        let page = match assembler.assemble(request) {
            Ok(page) => page,
            Err(err) => {
                report.fail(request, err);
                continue;
            }
        };

        match renderer.render(&page) {
            Ok(output) => report.succeeded.push(UnitSuccess {
                month_key: page.month_key,
                language: page.language,
                output,
                empty_frames: page.count(PhotoState::EmptyFrame),
                placeholders: page.count(PhotoState::Placeholder),
            }),
            Err(err) => report.fail(request, err),
        }
    }

    log::info!(
        "Built {} of {} pages, {} failed",
        report.succeeded.len(),
        plan.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::location::LocationFile;

    #[derive(Default)]
    struct Collect {
        pages: Vec<CalendarPage>,
    }

    impl PageRenderer for Collect {
        fn render(&mut self, page: &CalendarPage) -> Result<PathBuf> {
            self.pages.push(page.clone());
            Ok(PathBuf::from(page.month_key.to_string()))
        }
    }

    fn snapshot() -> Snapshot {
        let photos = PhotoTable::parse("h\n202603\tmar-a\t7\n202604\tapr-a\t8\n");
        let mut locations = LocationTable::new(Path::new("photos"));
        locations.insert(
            MonthKey::year_bound(2026, 3),
            LocationFile::parse("+ location_en: Quito\n+ location_de: Quito\n+ coordinates: 0.18°S, 78.47°W\n+ year: 2026\n"),
        );
        locations.insert(
            MonthKey::year_bound(2026, 4),
            LocationFile::parse("+ location_en: Lima\n+ coordinates: 12.05°S, 77.04°W\n+ year: 2026\n"),
        );
        Snapshot::new(photos, locations)
    }

    #[test]
    fn plan_covers_months_and_languages() {
        let plan =
            BuildPlan::year_bound(2026, &[3, 4], &[Language::En, Language::De], WeekStart::Monday)
                .unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.units()[1].language, Language::De);
        assert_eq!(plan.units()[2].month, 4);

        let perpetual = BuildPlan::perpetual(&[2], &Language::ALL).unwrap();
        assert!(perpetual.units().iter().all(CalendarRequest::is_perpetual));

        let err = BuildPlan::perpetual(&[0], &[Language::En]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidRequest));
    }

    #[test]
    fn failing_unit_does_not_stop_siblings() {
        let snapshot = snapshot();
        let config = Config::default();
        let plan =
            BuildPlan::year_bound(2026, &[3, 4], &[Language::En, Language::De], WeekStart::Monday)
                .unwrap();
        let mut renderer = Collect::default();

        let report = run(&plan, &snapshot.assembler(&config), &mut renderer);

        assert_eq!(report.succeeded.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failed[0].month_key, MonthKey::year_bound(2026, 4));
        assert_eq!(report.failed[0].language, Language::De);
        assert!(report.failed[0].reason.contains("location_de"));
        assert_eq!(renderer.pages.len(), 3);
        assert!(report.to_json().unwrap().contains("\"month_key\": \"202604\""));
    }

    #[test]
    fn json_renderer_layout() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot();
        let config = Config::default();
        let plan = BuildPlan::year_bound(2026, &[3], &[Language::En], WeekStart::Monday).unwrap();
        let mut renderer = JsonRenderer::new(dir.path());

        let report = run(&plan, &snapshot.assembler(&config), &mut renderer);
        assert!(report.is_success());

        let path = dir.path().join("2026").join("en").join("202603.json");
        assert_eq!(report.succeeded[0].output, path);
        let page: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(page["location"]["display_text"], "Quito");
        assert_eq!(page["rows"][0]["cells"][6]["photo"], "assigned");

        assert_eq!(
            renderer.page_path(&MonthKey::perpetual(2), Language::Es),
            dir.path().join("perpetual").join("es").join("02.json")
        );

        let report_path = dir.path().join(REPORT_FILE);
        report.write(&report_path).unwrap();
        assert!(report_path.is_file());
    }
}
