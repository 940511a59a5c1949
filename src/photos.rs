use chrono::NaiveDate;
use phf::phf_set;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::calendar::{is_leap_year, previous_leap_year, MonthKey, YearMonth};
use crate::error::{Error, ErrorKind, Result};
use crate::grid::{GridDay, Membership};

const OBSERVATION_URL: &str = "https://www.inaturalist.org/observations/";
const PHOTO_EXT: &str = "jpg";
const WEB_DIR: &str = "web";

static COVER_MARKERS: phf::Set<&'static str> = phf_set! {
    "cover", "x", "*", "1", "yes", "true",
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoRecord {
    pub month_key: MonthKey,
    pub ordering_index: u32,
    pub filename: String,
    pub observation_id: Option<String>,
    pub is_cover: bool,
}

impl PhotoRecord {
    pub fn external_url(&self) -> Option<String> {
        self.observation_id
            .as_ref()
            .map(|id| format!("{}{}", OBSERVATION_URL, id))
    }

    /// Calendar date this record is shown on, if its key is year-bound.
    pub fn date(&self) -> Option<NaiveDate> {
        self.month_key.year().and_then(|year| {
            NaiveDate::from_ymd_opt(year, self.month_key.month(), self.ordering_index)
        })
    }
}

/// Anything photos can be looked up in by (month key, day of month).
pub trait PhotoSource {
    fn photo(&self, key: &MonthKey, day: u32) -> Option<&PhotoRecord>;
}

/// Ordered photo table. Loaded once per run and only read afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoTable {
    months: BTreeMap<MonthKey, Vec<PhotoRecord>>,
}

impl PhotoTable {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::from(e).with_msg(&format!("Could not read photo table '{}'", path.display()))
        })?;
        let table = Self::parse(&content);
        log::info!(
            "Loaded {} photo records for {} months from '{}'",
            table.len(),
            table.months.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses the tab separated table. The first line is a header. Lines with
    /// an unreadable month key are skipped with a warning.
    pub fn parse(content: &str) -> Self {
        let mut months: BTreeMap<MonthKey, Vec<PhotoRecord>> = BTreeMap::new();

        for (line_num, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
            let filename = parts.get(1).copied().unwrap_or_default();
            if filename.is_empty() {
                continue;
            }

            let month_key = match parts[0].parse::<MonthKey>() {
                Ok(key) => key,
                Err(err) => {
                    log::warn!("Photo table line {}: {}", line_num + 1, err);
                    continue;
                }
            };

            let observation_id = parts
                .get(2)
                .copied()
                .filter(|id| !id.is_empty() && *id != "0")
                .map(str::to_owned);
            let is_cover = parts
                .get(3)
                .map(|marker| COVER_MARKERS.contains(marker.to_lowercase().as_str()))
                .unwrap_or(false);

            let sequence = months.entry(month_key).or_default();
            sequence.push(PhotoRecord {
                month_key,
                ordering_index: sequence.len() as u32 + 1,
                filename: filename.to_owned(),
                observation_id,
                is_cover,
            });
        }

        PhotoTable { months }
    }

    pub fn len(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn month_keys(&self) -> impl Iterator<Item = &MonthKey> {
        self.months.keys()
    }

    pub fn month(&self, key: &MonthKey) -> &[PhotoRecord] {
        self.months.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_month(&self, key: &MonthKey) -> bool {
        self.months.contains_key(key)
    }

    pub fn cover(&self, key: &MonthKey) -> Option<&PhotoRecord> {
        self.month(key).iter().find(|r| r.is_cover)
    }

    pub fn perpetual_view(&self, source_year: i32) -> PerpetualView<'_> {
        PerpetualView {
            table: self,
            source_year,
        }
    }

    pub fn observations(&self) -> ObservationIndex {
        let entries = self
            .months
            .values()
            .flatten()
            .filter_map(|r| Some((r.date()?, r.observation_id.clone()?)))
            .collect();
        ObservationIndex { entries }
    }

    pub fn coverage(&self, month: YearMonth) -> MonthCoverage {
        let expected = month.num_days() as usize;
        let found = self.month(&month.key()).len();
        MonthCoverage {
            month_key: month.key().to_string(),
            expected,
            found,
            status: match found {
                0 => CoverageStatus::Missing,
                n if n < expected => CoverageStatus::Short,
                _ => CoverageStatus::Complete,
            },
        }
    }
}

impl PhotoSource for PhotoTable {
    fn photo(&self, key: &MonthKey, day: u32) -> Option<&PhotoRecord> {
        let index = (day as usize).checked_sub(1)?;
        self.months.get(key)?.get(index)
    }
}

/// Perpetual lookups over one canonical year of the year-bound table. The
/// year is dropped from the key on every lookup, nothing is copied.
#[derive(Clone, Copy, Debug)]
pub struct PerpetualView<'a> {
    table: &'a PhotoTable,
    source_year: i32,
}

impl<'a> PerpetualView<'a> {
    pub fn source_year(&self) -> i32 {
        self.source_year
    }

    fn source_key(&self, key: &MonthKey, day: u32) -> MonthKey {
        // February 29 comes from the last leap year when the source year has none.
        if key.month() == 2 && day == 29 && !is_leap_year(self.source_year) {
            let leap = MonthKey::year_bound(previous_leap_year(self.source_year), 2);
            if self.table.has_month(&leap) {
                return leap;
            }
        }

        let year_bound = MonthKey::year_bound(self.source_year, key.month());
        if self.table.has_month(&year_bound) {
            year_bound
        } else {
            key.project()
        }
    }
}

impl<'a> PhotoSource for PerpetualView<'a> {
    fn photo(&self, key: &MonthKey, day: u32) -> Option<&PhotoRecord> {
        self.table.photo(&self.source_key(key, day), day)
    }
}

/// Result of assigning a photo to one grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellPhoto<'a> {
    Assigned(&'a PhotoRecord),
    /// Same-month day without a record, rendered as an empty frame.
    EmptyFrame,
    /// Overflow day whose month has no record for it, rendered with reduced emphasis.
    OverflowPlaceholder,
}

impl<'a> CellPhoto<'a> {
    pub fn record(&self) -> Option<&'a PhotoRecord> {
        match self {
            CellPhoto::Assigned(record) => Some(*record),
            _ => None,
        }
    }
}

pub struct PhotoResolver<'a, S: PhotoSource> {
    source: &'a S,
}

impl<'a, S: PhotoSource> PhotoResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        PhotoResolver { source }
    }

    pub fn lookup(&self, key: &MonthKey, day: u32) -> Result<&'a PhotoRecord> {
        self.source.photo(key, day).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingPhotoRecord,
                &format!("{} day {}", key, day),
            )
        })
    }

    /// Year-bound cells resolve against the month they actually belong to,
    /// so overflow days use the neighbouring month's sequence.
    pub fn resolve_day(&self, day: &GridDay) -> Result<&'a PhotoRecord> {
        let key = day.year_month().key();
        match self.lookup(&key, day.day()) {
            Err(err) if day.membership.is_overflow() => Err(Error::new(
                ErrorKind::CrossYearPhotoGap,
                err.message.as_deref().unwrap_or_default(),
            )),
            other => other,
        }
    }

    pub fn assign_day(&self, day: &GridDay) -> CellPhoto<'a> {
        match self.resolve_day(day) {
            Ok(record) => CellPhoto::Assigned(record),
            Err(err) => {
                log::debug!("{}", err);
                match (err.kind, day.membership) {
                    (ErrorKind::CrossYearPhotoGap, _) => CellPhoto::OverflowPlaceholder,
                    (_, Membership::Current) => CellPhoto::EmptyFrame,
                    _ => CellPhoto::OverflowPlaceholder,
                }
            }
        }
    }

    pub fn assign(&self, key: &MonthKey, day: u32) -> CellPhoto<'a> {
        match self.lookup(key, day) {
            Ok(record) => CellPhoto::Assigned(record),
            Err(err) => {
                log::debug!("{}", err);
                CellPhoto::EmptyFrame
            }
        }
    }
}

/// Maps photo locations on disk for records of the table.
#[derive(Clone, Debug)]
pub struct PhotoLocator {
    photos_dir: PathBuf,
    web_optimized: bool,
}

impl PhotoLocator {
    pub fn new(photos_dir: &Path, web_optimized: bool) -> Self {
        PhotoLocator {
            photos_dir: photos_dir.to_path_buf(),
            web_optimized,
        }
    }

    pub fn month_dir(&self, key: &MonthKey) -> PathBuf {
        match key.year() {
            Some(year) => self
                .photos_dir
                .join(format!("{:04}", year))
                .join(format!("{:02}", key.month())),
            None => self.photos_dir.join(format!("{:02}", key.month())),
        }
    }

    pub fn path(&self, record: &PhotoRecord) -> PathBuf {
        let dir = self.month_dir(&record.month_key);
        let file = format!("{}.{}", record.filename, PHOTO_EXT);

        if self.web_optimized {
            dir.join(WEB_DIR).join(file)
        } else {
            dir.join(file)
        }
    }
}

/// Date to observation id for every year-bound record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservationIndex {
    entries: BTreeMap<NaiveDate, String>,
}

impl ObservationIndex {
    pub fn get(&self, date: &NaiveDate) -> Option<&str> {
        self.entries.get(date).map(String::as_str)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.entries.contains_key(date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        let keyed: BTreeMap<String, &str> = self
            .entries
            .iter()
            .map(|(date, id)| (date.format("%Y-%m-%d").to_string(), id.as_str()))
            .collect();
        Ok(serde_json::to_string_pretty(&keyed)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Complete,
    Short,
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthCoverage {
    pub month_key: String,
    pub expected: usize,
    pub found: usize,
    pub status: CoverageStatus,
}
