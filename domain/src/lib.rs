//! # Storefront Domain
//!
//! Entities, table declarations and service ports shared by the Storefront
//! API. This crate performs no IO: storage, configuration and transport live
//! in `storefront-server`.
//!
//! ## Contents
//!
//! - [`User`] and [`Role`], plus the login and registration payloads with
//!   their `validate()` checks
//! - [`Entity`] and [`TableSchema`], the relational shape each persisted type
//!   declares; the server reconciles the database against these at startup
//! - [`AuthService`], the port implemented by authentication adapters
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_domain::{Entity, RegisterRequest, User};
//!
//! let request = RegisterRequest {
//!     email: "alice@example.com".into(),
//!     password: "hunter22".into(),
//!     first_name: "Alice".into(),
//!     last_name: "Liddell".into(),
//! };
//! assert!(request.validate().is_ok());
//!
//! let table = User::table_schema();
//! assert_eq!(table.name, "users");
//! ```

pub mod auth;
pub mod error;
pub mod schema;
pub mod user;

// Re-export main types at crate root
pub use auth::AuthService;
pub use error::{Error, Result};
pub use schema::{ColumnDef, ColumnDefault, ColumnType, Entity, IndexDef, TableSchema};
pub use user::{
    AdminRegisterRequest, LoginRequest, LoginResponse, RegisterRequest, Role, User,
    MIN_PASSWORD_LEN, USERS_TABLE,
};

/// Primary key of a [`User`].
pub type UserId = i64;
