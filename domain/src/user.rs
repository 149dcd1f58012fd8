//! The user entity and the auth request/response payloads.

use crate::error::{Error, Result};
use crate::schema::{ColumnDef, ColumnDefault, ColumnType, Entity, IndexDef, TableSchema};
use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Table name for [`User`].
pub const USERS_TABLE: &str = "users";

/// Role granted to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Moderator => "moderator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// A registered user.
///
/// The password hash never leaves the process through serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    fn table_schema() -> TableSchema {
        TableSchema::new(
            USERS_TABLE,
            vec![
                ColumnDef::primary_key("id"),
                ColumnDef::required("email", ColumnType::Text { max_len: 255 }),
                ColumnDef::required("password", ColumnType::Text { max_len: 255 }),
                ColumnDef::required("first_name", ColumnType::Text { max_len: 100 }),
                ColumnDef::required("last_name", ColumnType::Text { max_len: 100 }),
                ColumnDef::required("role", ColumnType::Text { max_len: 20 })
                    .with_default(ColumnDefault::Text(Role::User.as_str().to_string())),
                ColumnDef::required("is_active", ColumnType::Bool)
                    .with_default(ColumnDefault::Bool(true)),
                ColumnDef::required("created_at", ColumnType::Timestamp)
                    .with_default(ColumnDefault::Now),
                ColumnDef::required("updated_at", ColumnType::Timestamp)
                    .with_default(ColumnDefault::Now),
            ],
        )
        .with_index(IndexDef::unique(USERS_TABLE, &["email"]))
    }
}

/// Login request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Check the payload before it reaches the auth service.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Self-service registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    /// Check the payload before it reaches the auth service.
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)
    }
}

/// Registration payload used by administrators; the role is explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl AdminRegisterRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)
    }
}

/// Successful login: a signed token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::MissingRequiredField(field.to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    require("email", email)?;
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(Error::InvalidEmail(email.to_string()))
    }
}

fn validate_password(password: &str) -> Result<()> {
    require("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Structural check: one `@`, a non-empty local part, and a dotted domain
/// whose labels are non-empty.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}
