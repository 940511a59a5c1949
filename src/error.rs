use std::convert::From;
use std::error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ErrorKind {
    MissingPhotoRecord,
    MissingLocationData,
    InvalidDateFragment,
    CrossYearPhotoGap,
    InvalidRequest,
    PhotoTableParse,
    ConfigParse,
    Render,
    ParseError,
    IOError(io::Error),
}

impl Error {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        Error {
            kind,
            message: Some(msg.to_owned()),
        }
    }

    pub fn with_msg(mut self, message: &str) -> Self {
        self.message = Some(message.to_owned());
        self
    }

    /// Errors of these kinds only degrade a single day cell or a lookup,
    /// they never abort a unit of work.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingPhotoRecord
                | ErrorKind::CrossYearPhotoGap
                | ErrorKind::InvalidDateFragment
        )
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            message: None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::from(ErrorKind::IOError(io_error))
    }
}

impl From<toml::de::Error> for Error {
    fn from(toml_error: toml::de::Error) -> Error {
        Error::new(
            ErrorKind::ConfigParse,
            format!("Could not parse config: {}", toml_error).as_str(),
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(json_error: serde_json::Error) -> Error {
        Error::new(
            ErrorKind::Render,
            format!("Could not serialize: {}", json_error).as_str(),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind.as_str(), msg),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl error::Error for Error {}

impl ErrorKind {
    pub fn as_str(&self) -> String {
        match self {
            ErrorKind::MissingPhotoRecord => "no photo record for day".to_owned(),
            ErrorKind::MissingLocationData => "missing location data".to_owned(),
            ErrorKind::InvalidDateFragment => "invalid date fragment".to_owned(),
            ErrorKind::CrossYearPhotoGap => "no photo record for overflow day".to_owned(),
            ErrorKind::InvalidRequest => "invalid calendar request".to_owned(),
            ErrorKind::PhotoTableParse => "invalid photo table format".to_owned(),
            ErrorKind::ConfigParse => "invalid config".to_owned(),
            ErrorKind::Render => "could not render page".to_owned(),
            ErrorKind::ParseError => "invalid format".to_owned(),
            ErrorKind::IOError(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = Error::new(ErrorKind::MissingLocationData, "photos/2026/02/README.md");
        assert_eq!(
            err.to_string(),
            "missing location data: photos/2026/02/README.md"
        );
    }

    #[test]
    fn gaps_are_recoverable() {
        assert!(Error::from(ErrorKind::MissingPhotoRecord).is_recoverable());
        assert!(Error::from(ErrorKind::CrossYearPhotoGap).is_recoverable());
        assert!(!Error::from(ErrorKind::MissingLocationData).is_recoverable());
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "photo_information.txt"))
            .with_msg("Could not read photo table");
        assert!(matches!(&err.kind, ErrorKind::IOError(e) if e.kind() == io::ErrorKind::NotFound));
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "photo_information.txt: Could not read photo table"
        );
    }
}
