use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Row of the accounts table. Not serializable: the hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: Option<String>,
    #[sqlx(rename = "senha")]
    pub pwd_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct Register {
    #[serde(default, alias = "nome")]
    pub name: String,
    #[serde(alias = "usuario")]
    pub login: String,
    #[serde(alias = "senha")]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    #[serde(alias = "usuario")]
    pub login: String,
    #[serde(alias = "senha")]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub account_id: i64,
    pub name: Option<String>,
    pub message: String,
}

/// A tenant-scoped row as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: i64,
    pub usuario_id: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub status: Option<String>,
}
