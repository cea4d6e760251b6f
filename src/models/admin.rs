use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::admin_users;

/// Administrator identity without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<admin_users::Model> for AdminUser {
    fn from(model: admin_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Outcome of checking a username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialCheck {
    UnknownUser,
    WrongPassword,
    Valid(AdminUser),
}
