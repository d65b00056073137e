use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    TextNodeParse(String),
}

impl Error {
    pub fn html_parse_error(msg: &str) -> Self {
        Self::HtmlParse(msg.to_string())
    }
    pub fn text_node_parse_error(msg: &str) -> Self {
        Self::TextNodeParse(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "HTML Parse Error: {}", msg),
            Self::TextNodeParse(msg) => write!(f, "Text Node Parse Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
