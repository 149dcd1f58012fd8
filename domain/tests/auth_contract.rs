//! Contract tests for the auth service port.
//!
//! An in-memory adapter shows the behaviour every implementation of
//! `AuthService` is expected to provide.

use chrono::Utc;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use storefront_domain::{
    AuthService, Error, LoginRequest, LoginResponse, RegisterRequest, Result, Role, User, UserId,
};

#[derive(Default)]
struct InMemoryAuth {
    users: Mutex<HashMap<UserId, User>>,
}

impl AuthService for InMemoryAuth {
    async fn register(&self, req: RegisterRequest) -> Result<User> {
        req.validate()?;

        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == req.email) {
            return Err(Error::EmailTaken(req.email));
        }

        let now = Utc::now();
        let user = User {
            id: users.len() as UserId + 1,
            email: req.email,
            password: format!("hashed:{}", req.password),
            first_name: req.first_name,
            last_name: req.last_name,
            role: Role::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        req.validate()?;

        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.email == req.email && u.password == format!("hashed:{}", req.password))
            .ok_or(Error::InvalidCredentials)?;
        if !user.is_active {
            return Err(Error::InactiveUser);
        }

        Ok(LoginResponse {
            token: format!("token-{}", user.id),
            user: user.clone(),
        })
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::UserNotFound(id))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let stored = users
            .get_mut(&user.id)
            .ok_or(Error::UserNotFound(user.id))?;
        *stored = User {
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(())
    }
}

fn alice() -> RegisterRequest {
    RegisterRequest {
        email: "alice@example.com".into(),
        password: "hunter22".into(),
        first_name: "Alice".into(),
        last_name: "Liddell".into(),
    }
}

#[tokio::test]
async fn register_then_login() {
    let auth = InMemoryAuth::default();

    let user = auth.register(alice()).await.unwrap();
    assert_eq!(user.role, Role::User);
    assert!(user.is_active);

    let response = auth
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "hunter22".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.user.id, user.id);
    assert!(!response.token.is_empty());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let auth = InMemoryAuth::default();
    auth.register(alice()).await.unwrap();

    let err = auth.register(alice()).await.unwrap_err();
    assert_eq!(err, Error::EmailTaken("alice@example.com".into()));
}

#[tokio::test]
async fn invalid_payload_never_reaches_storage() {
    let auth = InMemoryAuth::default();
    let request = RegisterRequest {
        password: "123".into(),
        ..alice()
    };

    assert_eq!(
        auth.register(request).await,
        Err(Error::PasswordTooShort { min: 6 })
    );
    assert!(auth.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_and_inactive_user() {
    let auth = InMemoryAuth::default();
    let mut user = auth.register(alice()).await.unwrap();

    let err = auth
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "wrong-password".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::InvalidCredentials);

    user.is_active = false;
    auth.update_user(&user).await.unwrap();

    let err = auth
        .login(LoginRequest {
            email: "alice@example.com".into(),
            password: "hunter22".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::InactiveUser);
}

#[tokio::test]
async fn fetch_and_update_by_id() {
    let auth = InMemoryAuth::default();
    let mut user = auth.register(alice()).await.unwrap();

    user.first_name = "Alicia".into();
    user.role = Role::Moderator;
    auth.update_user(&user).await.unwrap();

    let fetched = auth.get_user_by_id(user.id).await.unwrap();
    assert_eq!(fetched.first_name, "Alicia");
    assert_eq!(fetched.role, Role::Moderator);

    assert_eq!(
        auth.get_user_by_id(999).await,
        Err(Error::UserNotFound(999))
    );
}

proptest! {
    #[test]
    fn emails_without_at_sign_are_rejected(email in "[a-z0-9.]{1,30}") {
        let request = LoginRequest { email: email.clone(), password: "hunter22".into() };
        prop_assert_eq!(request.validate(), Err(Error::InvalidEmail(email)));
    }

    #[test]
    fn well_formed_emails_are_accepted(
        local in "[a-z0-9]{1,12}",
        domain in "[a-z]{1,12}",
        tld in "[a-z]{2,6}",
    ) {
        let request = LoginRequest {
            email: format!("{local}@{domain}.{tld}"),
            password: "hunter22".into(),
        };
        prop_assert!(request.validate().is_ok());
    }
}
