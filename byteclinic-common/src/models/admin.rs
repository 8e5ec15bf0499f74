use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Existence of a row == the user is an admin. `granted_by` equals
/// `user_id` for self-service promotion via the master key.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct AdminGrant {
    pub user_id: Uuid,
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl AdminGrant {
    pub fn new(user_id: Uuid, granted_by: Uuid) -> Self {
        Self {
            user_id,
            granted_by,
            created_at: Utc::now(),
        }
    }
}
