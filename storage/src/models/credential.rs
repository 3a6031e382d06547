//! Per-user API key for one provider. Maps to the `credentials` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserCredential {
    pub user_id: i64,
    pub provider: String,
    pub api_key: String,
    pub updated_at: DateTime<Utc>,
}
