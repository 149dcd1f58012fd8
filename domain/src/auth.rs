//! The authentication service port.
//!
//! Adapters (a database-backed implementation, a test double) implement
//! [`AuthService`]; HTTP handlers depend only on the trait.

use crate::error::Result;
use crate::user::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::UserId;
use std::future::Future;

/// Registration, login and profile access for [`User`]s.
pub trait AuthService: Send + Sync {
    /// Create a new user with the default role.
    ///
    /// Fails with [`Error::EmailTaken`](crate::Error::EmailTaken) if the email
    /// is already registered.
    fn register(&self, req: RegisterRequest) -> impl Future<Output = Result<User>> + Send;

    /// Check credentials and issue a token.
    ///
    /// Unknown emails and wrong passwords both yield
    /// [`Error::InvalidCredentials`](crate::Error::InvalidCredentials).
    fn login(&self, req: LoginRequest) -> impl Future<Output = Result<LoginResponse>> + Send;

    fn get_user_by_id(&self, id: UserId) -> impl Future<Output = Result<User>> + Send;

    /// Persist changes to an existing user.
    fn update_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;
}
