//! User model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// User entity as stored by the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub job_position: Option<String>,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the password is already hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub job_position: Option<String>,
    pub mobile: Option<String>,
}

impl NewUser {
    /// Build an insert payload from an interchange record and the hash of its password
    pub fn from_record(record: UserRecord, password_hash: String) -> Self {
        Self {
            username: record.username,
            email: record.email,
            password_hash,
            role: record.role,
            first_name: record.first_name,
            last_name: record.last_name,
            birth_date: record.birth_date,
            city: record.city,
            country: record.country,
            avatar: record.avatar,
            company: record.company,
            job_position: record.job_position,
            mobile: record.mobile,
        }
    }
}

/// Outward projection of a user, never carrying the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub job_position: Option<String>,
    pub mobile: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            city: user.city.clone(),
            country: user.country.clone(),
            avatar: user.avatar.clone(),
            company: user.company.clone(),
            job_position: user.job_position.clone(),
            mobile: user.mobile.clone(),
        }
    }
}

/// Interchange shape for generated, imported and registered users.
///
/// Missing `username` or `password` deserialize as empty strings so that a
/// single incomplete element fails on its own instead of failing the whole
/// payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// User login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}
