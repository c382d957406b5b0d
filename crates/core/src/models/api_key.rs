use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "created_at_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "last_used_at_utc", skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateApiKeyRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateApiKeyResponse {
    pub api_key: String,
    pub email: String,
    #[serde(rename = "created_at_utc")]
    pub created_at: DateTime<Utc>,
    pub uuid: Uuid,
}
