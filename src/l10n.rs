use chrono::{Datelike, NaiveDate, Weekday};
use phf::phf_map;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

use crate::calendar::WeekStart;
use crate::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub enum Language {
    En,
    De,
    Es,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::De, Language::Es];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            "es" => Some(Language::Es),
            _ => None,
        }
    }

    pub fn month_name(&self, month: u32) -> &'static str {
        let names = match self {
            Language::En => &EN_MONTHS,
            Language::De => &DE_MONTHS,
            Language::Es => &ES_MONTHS,
        };
        names[(month.clamp(1, 12) - 1) as usize]
    }

    pub fn weekday_name(&self, weekday: Weekday) -> &'static str {
        let names = match self {
            Language::En => &EN_WEEKDAYS,
            Language::De => &DE_WEEKDAYS,
            Language::Es => &ES_WEEKDAYS,
        };
        names[weekday.num_days_from_monday() as usize]
    }

    pub fn weekday_short(&self, weekday: Weekday) -> &'static str {
        let names = match self {
            Language::En => &EN_WEEKDAYS_SHORT,
            Language::De => &DE_WEEKDAYS_SHORT,
            Language::Es => &ES_WEEKDAYS_SHORT,
        };
        names[weekday.num_days_from_monday() as usize]
    }

    /// Column headers in grid order for the given week start.
    pub fn weekday_headers(&self, week_start: WeekStart, short: bool) -> Vec<&'static str> {
        let first = week_start.weekday();
        (0..7)
            .map(|offset| {
                let mut day = first;
                for _ in 0..offset {
                    day = day.succ();
                }
                if short {
                    self.weekday_short(day)
                } else {
                    self.weekday_name(day)
                }
            })
            .collect()
    }

    /// Looks up a message by id. Missing translations fall back to English,
    /// unknown ids yield `None`.
    pub fn message(&self, id: &str) -> Option<&'static str> {
        let entry = MESSAGES.get(id)?;
        let translated = match self {
            Language::En => Some(entry.en),
            Language::De => entry.de,
            Language::Es => entry.es,
        };
        Some(translated.unwrap_or(entry.en))
    }

    pub fn format_date(&self, date: NaiveDate, style: DateStyle) -> String {
        let (year, month, day) = (date.year(), date.month(), date.day());
        match style {
            DateStyle::Long => {
                let month_name = self.month_name(month);
                match self {
                    Language::De => format!("{}. {} {}", day, month_name, year),
                    Language::Es => {
                        format!("{} de {} de {}", day, month_name.to_lowercase(), year)
                    }
                    Language::En => format!("{} {}, {}", month_name, day, year),
                }
            }
            DateStyle::Short => match self {
                Language::De => format!("{:02}.{:02}.{}", day, month, year),
                Language::Es => format!("{:02}/{:02}/{}", day, month, year),
                Language::En => format!("{:02}/{:02}/{}", month, day, year),
            },
            DateStyle::Numeric => format!("{}-{:02}-{:02}", year, month, day),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s.trim().to_lowercase().as_str()).ok_or_else(|| {
            Error::new(
                ErrorKind::ParseError,
                &format!("Language '{}' is not supported (en, de, es)", s),
            )
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateStyle {
    Long,
    Short,
    Numeric,
}

pub struct Translations {
    en: &'static str,
    de: Option<&'static str>,
    es: Option<&'static str>,
}

static MESSAGES: phf::Map<&'static str, Translations> = phf_map! {
    "no_photo" => Translations {
        en: "No photo for this date yet.",
        de: Some("Für dieses Datum gibt es noch kein Foto."),
        es: Some("Todavía no hay foto para esta fecha."),
    },
    "week" => Translations {
        en: "Week",
        de: Some("KW"),
        es: Some("Semana"),
    },
    "perpetual" => Translations {
        en: "Perpetual calendar",
        de: Some("Immerwährender Kalender"),
        es: Some("Calendario perpetuo"),
    },
    "observation" => Translations {
        en: "View observation",
        de: Some("Beobachtung ansehen"),
        es: None,
    },
};

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const DE_MONTHS: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];
const ES_MONTHS: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
    "Octubre", "Noviembre", "Diciembre",
];

const EN_WEEKDAYS: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];
const DE_WEEKDAYS: [&str; 7] = [
    "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag",
];
const ES_WEEKDAYS: [&str; 7] = [
    "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado", "Domingo",
];

const EN_WEEKDAYS_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const DE_WEEKDAYS_SHORT: [&str; 7] = ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"];
const ES_WEEKDAYS_SHORT: [&str; 7] = ["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"];
