use serde::{Deserialize, Serialize};

pub const QUERY_PATH: &str = "/v1/query";
pub const EXEC_PATH: &str = "/v1/exec";

#[derive(Debug, Serialize)]
pub struct RequestEnvelope {
    pub database: String,
    pub query: String,
    pub args: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<ResultData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub affected_rows: Option<i64>,
    #[serde(default)]
    pub last_insert_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Row {
    Positional(Vec<serde_json::Value>),
    Keyed(serde_json::Map<String, serde_json::Value>),
}
