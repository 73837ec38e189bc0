//! User management and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserShort},
    repository::Repository,
};

use super::parse_id;

/// Message for every failed login
pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List library members (role `user`)
    pub async fn list_members(&self) -> AppResult<Vec<UserShort>> {
        self.repository.users.list_by_role(Role::User).await
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        let Some(id) = parse_id(id) else {
            return Err(user_not_found());
        };

        self.repository
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            password: hash_password(&user.password)?,
            role: user.role,
            name: user.name,
            email: user.email,
            created_at: Utc::now(),
        };

        let created = self.repository.users.create(&record).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "User created");

        Ok(created)
    }

    /// Update an existing user; absent fields are kept
    pub async fn update_user(&self, id: &str, update: UpdateUser) -> AppResult<User> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let Some(id) = parse_id(id) else {
            return Err(user_not_found());
        };

        let password = match update.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository
            .users
            .update(id, &update, password)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Delete a user. Unknown IDs are not an error.
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        let Some(uuid) = parse_id(id) else {
            tracing::debug!(id, "Delete requested for malformed user id");
            return Ok(());
        };

        if self.repository.users.delete(uuid).await? {
            tracing::info!(user_id = %uuid, "Usuario eliminado");
        } else {
            tracing::debug!(user_id = %uuid, "Delete requested for unknown user");
        }

        Ok(())
    }

    /// Check that the user store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.users.ping().await
    }

    /// Authenticate a user by exact username and password
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&user.password, password) {
            tracing::warn!(username, "Failed login attempt");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("Usuario no encontrado".to_string())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against the stored value.
///
/// Values that are not PHC strings predate hashing and are compared as-is.
fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => !stored.is_empty() && stored == password,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::{
        books::MockBooksStore, loans::MockLoansStore, users::MockUsersStore, Repository,
    };

    fn service(users: MockUsersStore) -> UsersService {
        UsersService::new(Repository::from_stores(
            Arc::new(users),
            Arc::new(MockBooksStore::new()),
            Arc::new(MockLoansStore::new()),
        ))
    }

    fn stored_user(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: "lucia".to_string(),
            password: password.to_string(),
            role: Role::User,
            name: "Lucía Pérez".to_string(),
            email: "lucia@example.org".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn test_verify_legacy_plaintext() {
        assert!(verify_password("plain", "plain"));
        assert!(!verify_password("plain", "Plain"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let user = stored_user(&hash_password("s3cret").unwrap());
        let expected_id = user.id;

        let mut users = MockUsersStore::new();
        users
            .expect_get_by_username()
            .withf(|username| username == "lucia")
            .returning(move |_| Ok(Some(user.clone())));

        let authenticated = service(users).authenticate("lucia", "s3cret").await.unwrap();
        assert_eq!(authenticated.id, expected_id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = stored_user(&hash_password("s3cret").unwrap());

        let mut users = MockUsersStore::new();
        users
            .expect_get_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let err = service(users).authenticate("lucia", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let mut users = MockUsersStore::new();
        users.expect_get_by_username().returning(|_| Ok(None));

        let err = service(users).authenticate("ghost", "x").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut users = MockUsersStore::new();
        users
            .expect_create()
            .withf(|user: &User| user.password != "s3cret" && user.password.starts_with("$argon2"))
            .times(1)
            .returning(|user| Ok(user.clone()));

        let created = service(users)
            .create_user(CreateUser {
                username: "lucia".to_string(),
                password: "s3cret".to_string(),
                role: Role::User,
                name: "Lucía Pérez".to_string(),
                email: "lucia@example.org".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.username, "lucia");
        assert_eq!(created.role, Role::User);
    }

    #[tokio::test]
    async fn test_create_user_validation_failure_skips_store() {
        let mut users = MockUsersStore::new();
        users.expect_create().times(0);

        let err = service(users)
            .create_user(CreateUser {
                username: "".to_string(),
                password: "s3cret".to_string(),
                role: Role::User,
                name: "Lucía".to_string(),
                email: "lucia@example.org".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let mut users = MockUsersStore::new();
        users.expect_update().returning(|_, _, _| Ok(None));

        let err = service(users)
            .update_user(&Uuid::new_v4().to_string(), UpdateUser::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_unconditional() {
        let mut users = MockUsersStore::new();
        users.expect_delete().times(1).returning(|_| Ok(false));

        let service = service(users);
        assert!(service.delete_user(&Uuid::new_v4().to_string()).await.is_ok());
        assert!(service.delete_user("not-an-id").await.is_ok());
    }
}
