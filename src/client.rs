use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::YearMonth;
use crate::fragment::{self, ResolvedDate};
use crate::l10n::{DateStyle, Language};
use crate::photos::PhotoSource;

/// What the companion page currently shows. Every change produces a new
/// value, the previous one is never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub date: NaiveDate,
    pub language: Language,
}

impl DisplayState {
    pub fn new(date: NaiveDate, language: Language) -> Self {
        DisplayState { date, language }
    }

    /// Applies a fragment change. A fragment that does not resolve leaves the
    /// state untouched.
    pub fn on_fragment(self, today: NaiveDate, fragment: &str) -> Self {
        match fragment::resolve(today, fragment) {
            Ok(resolved) => self.apply(resolved),
            Err(err) => {
                log::debug!("Keeping {}: {}", self.date, err);
                self
            }
        }
    }

    pub fn apply(self, resolved: ResolvedDate) -> Self {
        DisplayState {
            date: resolved.date,
            language: resolved.language.unwrap_or(self.language),
        }
    }

    pub fn with_language(self, language: Language) -> Self {
        DisplayState { language, ..self }
    }

    pub fn title(&self) -> String {
        self.language.format_date(self.date, DateStyle::Long)
    }

    /// Soft notice shown when the displayed date has no photo record.
    pub fn notice<S: PhotoSource>(&self, photos: &S) -> Option<&'static str> {
        let key = YearMonth::from(self.date).key();
        match photos.photo(&key, self.date.day()) {
            Some(_) => None,
            None => self.language.message("no_photo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photos::PhotoTable;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unmatched_fragment_keeps_state() {
        let today = date(2026, 10, 18);
        let state = DisplayState::new(date(2026, 3, 15), Language::De);

        assert_eq!(state.on_fragment(today, "13"), state);
        assert_eq!(state.on_fragment(today, "20260229&lang=es"), state);
        assert_eq!(state.on_fragment(today, "13").on_fragment(today, "13"), state);
    }

    #[test]
    fn last_fragment_wins() {
        let today = date(2026, 10, 18);
        let state = DisplayState::new(today, Language::En)
            .on_fragment(today, "202603&lang=de")
            .on_fragment(today, "20260704");

        assert_eq!(state.date, date(2026, 7, 4));
        // the language sticks until another one is requested
        assert_eq!(state.language, Language::De);
        assert_eq!(state.with_language(Language::Es).date, state.date);
        assert_eq!(state.title(), "4. Juli 2026");
    }

    #[test]
    fn notice_only_without_photo() {
        let table = PhotoTable::parse("h\n202603\tmar-a\t42\n");

        let with_photo = DisplayState::new(date(2026, 3, 1), Language::Es);
        assert_eq!(with_photo.notice(&table), None);

        let without = with_photo.on_fragment(date(2026, 10, 18), "20260302");
        assert_eq!(
            without.notice(&table),
            Some("Todavía no hay foto para esta fecha.")
        );
    }

    #[test]
    fn photo_without_observation_has_no_notice() {
        let table = PhotoTable::parse("h\n202603\tmar-a\t0\n");
        let state = DisplayState::new(date(2026, 3, 1), Language::En);

        assert!(table.observations().is_empty());
        assert_eq!(state.notice(&table), None);
    }
}
