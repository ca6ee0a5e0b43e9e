use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt;

/// A run of highlighted or plain text inside a search hit.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextPart {
    pub content: String,
    pub bold: bool,
}

impl TextPart {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
        }
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Document,
    Message,
    Comment,
    Person,
    Issue,
    GitPr,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Docx,
    Pptx,
    #[serde(rename = "doc")]
    GoogleDoc,
    Pdf,
    #[serde(other)]
    Other,
}

/// Connector that produced a hit. Unknown connectors keep their raw name so
/// they survive a serialize/deserialize cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSource {
    GoogleDrive,
    Slack,
    Other(String),
}

impl DataSource {
    pub const GOOGLE_DRIVE: &'static str = "google_drive";
    pub const SLACK: &'static str = "slack";

    pub fn as_str(&self) -> &str {
        match self {
            Self::GoogleDrive => Self::GOOGLE_DRIVE,
            Self::Slack => Self::SLACK,
            Self::Other(name) => name,
        }
    }
}

impl From<String> for DataSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::GOOGLE_DRIVE => Self::GoogleDrive,
            Self::SLACK => Self::Slack,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DataSource {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DataSource> for String {
    fn from(value: DataSource) -> Self {
        match value {
            DataSource::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked hit returned by `GET /search`.
///
/// The server does not guarantee a stable id; identity is derived from the
/// descriptive fields instead (see the bundling pass in `precept-core`).
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResultDetails {
    #[serde(rename = "type", default)]
    pub kind: ResultType,
    pub data_source: DataSource,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_image_url: Option<String>,
    #[serde(default)]
    pub author_image_data: Option<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub content: Vec<TextPart>,
    /// Relevance in `0..=100`, computed by the server.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub file_type: Option<FileType>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub child: Option<Box<SearchResultDetails>>,
}

impl SearchResultDetails {
    pub fn new(
        kind: ResultType,
        data_source: impl Into<DataSource>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            data_source: data_source.into(),
            title: title.into(),
            author: String::new(),
            author_image_url: None,
            author_image_data: None,
            time: String::new(),
            content: Vec::new(),
            score: 0.0,
            location: String::new(),
            platform: None,
            file_type: None,
            status: None,
            is_active: None,
            url: String::new(),
            child: None,
        }
    }

    /// First content fragment, which the server always fills with the best
    /// matching snippet.
    pub fn snippet(&self) -> Option<&TextPart> {
        self.content.first()
    }
}
