use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const EMAIL_MAX_LEN: usize = 120;
pub const ALIAS_MAX_LEN: usize = 80;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub alias: String,
    pub password: String,
    pub salt: String,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub email: String,
    pub alias: String,
    pub password: String,
    pub salt: String,
}

#[derive(Debug, Default)]
pub struct Patch {
    pub alias: Option<String>,
    pub password: Option<String>,
    pub salt: Option<String>,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Register {
    pub email: Option<String>,
    pub alias: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub alias: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: i32,
    pub email: String,
    pub alias: String,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            alias: user.alias,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}
