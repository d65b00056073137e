use chrono::NaiveDate;

use crate::parse;
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum Error {
    /// The cafeteria published no menu (or not this meal) for the date.
    MenuNotFound(NaiveDate),
    Parse(parse::Error),
    Request(reqwest::Error),
    Api { status: u16, body: String },
    Auth(String),
    InvalidArgument(String),
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<parse::Error> for Error {
    fn from(e: parse::Error) -> Self {
        Error::Parse(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MenuNotFound(date) => write!(f, "No menu published for {date}"),
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::Request(e) => write!(f, "Request error: {}", e),
            Error::Api { status, body } => write!(f, "Calendar API error ({status}): {body}"),
            Error::Auth(msg) => write!(f, "Authentication error: {msg}"),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Error::Config(msg) => write!(f, "Config error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Json(e) => write!(f, "Json error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
