use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;

/// Connector kind the server can attach, as listed by `GET /data-sources/types`.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataSourceType {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub config_fields: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
}

/// A connector instance the user already attached (`GET /data-sources/connected`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectedDataSource {
    pub id: i64,
    pub name: String,
}
