use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Company;

/// User assumed when a request names none; there is no authentication layer.
pub const DEFAULT_USER_ID: i32 = 1;

/// A company bookmarked by a user, with free-form notes.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SavedCompany {
    pub id: i32,
    pub company_id: i32,
    pub user_id: i32,
    pub notes: Option<String>,
    /// The bookmarked row, attached after loading.
    #[sqlx(skip)]
    pub company: Option<Company>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
