use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::{enums::Role, schema};

/// Account row. Secrets never leave the process through `Serialize`.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::user_account)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub activation_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub activation_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::user_account)]
pub struct NewUser<'a> {
    pub id: uuid::Uuid,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub password_hash: Option<&'a str>,
    pub is_active: bool,
    pub activation_token_hash: Option<&'a str>,
    pub activation_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::user_account)]
pub struct UserChangeset {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
