use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{month_from_number, MonthKey, WeekStart};
use crate::error::Result;
use crate::fragment::Fragment;
use crate::grid::{GridDay, Membership, PerpetualGrid, PerpetualSlot, WeekGrid};
use crate::l10n::Language;
use crate::layout::{CellLayout, LayoutSizer};
use crate::location::{LocationRecord, LocationTable};
use crate::photos::{CellPhoto, PhotoLocator, PhotoRecord, PhotoResolver, PhotoTable};

pub const DEFAULT_SOURCE_YEAR: i32 = 2026;

/// One page to assemble. Perpetual requests carry no year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarRequest {
    pub year: Option<i32>,
    pub month: u32,
    pub language: Language,
    pub week_start: WeekStart,
}

impl CalendarRequest {
    pub fn year_bound(year: i32, month: u32, language: Language, week_start: WeekStart) -> Self {
        CalendarRequest {
            year: Some(year),
            month,
            language,
            week_start,
        }
    }

    pub fn perpetual(month: u32, language: Language) -> Self {
        CalendarRequest {
            year: None,
            month,
            language,
            week_start: WeekStart::default(),
        }
    }

    pub fn is_perpetual(&self) -> bool {
        self.year.is_none()
    }

    pub fn month_key(&self) -> MonthKey {
        match self.year {
            Some(year) => MonthKey::year_bound(year, self.month),
            None => MonthKey::perpetual(self.month),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoState {
    Assigned,
    /// Day of the displayed month without a record.
    EmptyFrame,
    /// Overflow day without a record in its own month, drawn with less emphasis.
    Placeholder,
    /// Perpetual slot past the month's last day: no border, no image.
    Blank,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayCell {
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<Membership>,
    pub photo: PhotoState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl DayCell {
    fn blank() -> Self {
        DayCell {
            day: None,
            date: None,
            membership: None,
            photo: PhotoState::Blank,
            photo_path: None,
            external_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,
    pub cells: Vec<DayCell>,
}

/// Populated grid of one (month, language), handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalendarPage {
    pub month_key: MonthKey,
    pub language: Language,
    pub perpetual: bool,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weekday_headers: Vec<&'static str>,
    pub layout: CellLayout,
    pub location: LocationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub rows: Vec<PageRow>,
}

impl CalendarPage {
    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    pub fn count(&self, state: PhotoState) -> usize {
        self.cells().filter(|cell| cell.photo == state).count()
    }
}

/// Combines grid, layout, photo and location lookups into pages. Borrows the
/// tables read-only, so one assembler serves every unit of a run.
#[derive(Clone, Debug)]
pub struct CalendarAssembler<'a> {
    photos: &'a PhotoTable,
    locations: &'a LocationTable,
    locator: PhotoLocator,
    sizer: LayoutSizer,
    source_year: i32,
    base_url: Option<String>,
}

impl<'a> CalendarAssembler<'a> {
    pub fn new(photos: &'a PhotoTable, locations: &'a LocationTable, locator: PhotoLocator) -> Self {
        CalendarAssembler {
            photos,
            locations,
            locator,
            sizer: LayoutSizer::default(),
            source_year: DEFAULT_SOURCE_YEAR,
            base_url: None,
        }
    }

    pub fn with_layout(mut self, sizer: LayoutSizer) -> Self {
        self.sizer = sizer;
        self
    }

    pub fn with_source_year(mut self, source_year: i32) -> Self {
        self.source_year = source_year;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn assemble(&self, request: &CalendarRequest) -> Result<CalendarPage> {
        let month = month_from_number(request.month)?;
        let language = request.language;

        // Perpetual pages show the locations of the year their photos come from.
        let source_key = match request.year {
            Some(year) => MonthKey::year_bound(year, request.month),
            None => MonthKey::year_bound(self.source_year, request.month),
        };
        let location = self.locations.resolve(&source_key, language)?;

        let month_name = language.month_name(request.month);
        let (title, weekday_headers, layout, rows, fragment) = match request.year {
            Some(year) => {
                let grid = WeekGrid::new(year, request.month, request.week_start)?;
                let layout = self.sizer.year_bound(grid.num_rows())?;
                let resolver = PhotoResolver::new(self.photos);
                let rows: Vec<PageRow> = grid
                    .rows()
                    .iter()
                    .map(|row| PageRow {
                        week_number: Some(row.week_number),
                        cells: row
                            .days
                            .iter()
                            .map(|day| self.week_cell(day, resolver.assign_day(day)))
                            .collect(),
                    })
                    .collect();
                let fragment = Fragment::month(grid.month()).with_language(language);

                (
                    format!("{} {}", month_name, year),
                    language.weekday_headers(request.week_start, false),
                    layout,
                    rows,
                    fragment,
                )
            }
            None => {
                let grid = PerpetualGrid::new(request.month)?;
                let layout = self.sizer.perpetual(grid.columns())?;
                let view = self.photos.perpetual_view(self.source_year);
                let resolver = PhotoResolver::new(&view);
                let key = request.month_key();
                let rows: Vec<PageRow> = grid
                    .rows()
                    .iter()
                    .map(|row| PageRow {
                        week_number: None,
                        cells: row
                            .iter()
                            .map(|slot| match slot {
                                PerpetualSlot::Day(day) => {
                                    self.perpetual_cell(*day, resolver.assign(&key, *day))
                                }
                                PerpetualSlot::Empty => DayCell::blank(),
                            })
                            .collect(),
                    })
                    .collect();
                let fragment = Fragment::perpetual(month).with_language(language);

                (month_name.to_owned(), Vec::new(), layout, rows, fragment)
            }
        };

        let cover_path = self
            .photos
            .cover(&source_key)
            .or_else(|| self.photos.cover(&source_key.project()))
            .map(|record| self.path_of(record));

        let page = CalendarPage {
            month_key: request.month_key(),
            language,
            perpetual: request.is_perpetual(),
            title,
            weekday_headers,
            layout,
            location,
            cover_path,
            link: self.base_url.as_deref().map(|url| fragment.link(url)),
            rows,
        };
        log::debug!(
            "Assembled {} ({}): {} rows, {} empty frames",
            page.month_key,
            language,
            page.rows.len(),
            page.count(PhotoState::EmptyFrame)
        );

        Ok(page)
    }

    fn path_of(&self, record: &PhotoRecord) -> String {
        self.locator.path(record).display().to_string()
    }

    fn week_cell(&self, day: &GridDay, photo: CellPhoto<'_>) -> DayCell {
        let mut cell = self.photo_cell(photo);
        cell.day = Some(day.day());
        cell.date = Some(day.date);
        cell.membership = Some(day.membership);
        cell
    }

    fn perpetual_cell(&self, day: u32, photo: CellPhoto<'_>) -> DayCell {
        let mut cell = self.photo_cell(photo);
        cell.day = Some(day);
        cell
    }

    fn photo_cell(&self, photo: CellPhoto<'_>) -> DayCell {
        let state = match photo {
            CellPhoto::Assigned(_) => PhotoState::Assigned,
            CellPhoto::EmptyFrame => PhotoState::EmptyFrame,
            CellPhoto::OverflowPlaceholder => PhotoState::Placeholder,
        };
        let record = photo.record();

        DayCell {
            photo: state,
            photo_path: record.map(|r| self.path_of(r)),
            external_url: record.and_then(PhotoRecord::external_url),
            ..DayCell::blank()
        }
    }
}
