//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UpdateUser, User, UserRow, UserShort},
};

/// Message returned when a username or email is already taken
pub const DUPLICATE_USER_MESSAGE: &str = "El username o email ya existe.";

/// Persistence operations on the users collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    /// List users having the given role
    async fn list_by_role(&self, role: Role) -> AppResult<Vec<UserShort>>;

    /// Get user by ID
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Get user by exact username
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a new user (password already hashed)
    async fn create(&self, user: &User) -> AppResult<User>;

    /// Apply a partial update; `None` when the user does not exist
    async fn update(
        &self,
        id: Uuid,
        user: &UpdateUser,
        password_hash: Option<String>,
    ) -> AppResult<Option<User>>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Check that the users table is reachable
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersStore for UsersRepository {
    async fn list_by_role(&self, role: Role) -> AppResult<Vec<UserShort>> {
        let users = sqlx::query_as::<_, UserShort>(
            "SELECT id, name, username, email FROM users WHERE role = $1 ORDER BY created_at",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password, role, name, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_USER_MESSAGE))?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: Uuid,
        user: &UpdateUser,
        password_hash: Option<String>,
    ) -> AppResult<Option<User>> {
        if user.is_empty() && password_hash.is_none() {
            return self.get_by_id(id).await;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(user.username, "username");
        add_field!(password_hash, "password");
        add_field!(user.role, "role");
        add_field!(user.name, "name");
        add_field!(user.email, "email");

        let query = format!("UPDATE users SET {} WHERE id = $1 RETURNING *", sets.join(", "));

        let mut builder = sqlx::query_as::<_, UserRow>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.username);
        bind_field!(password_hash);
        if let Some(role) = user.role {
            builder = builder.bind(role.as_str());
        }
        bind_field!(user.name);
        bind_field!(user.email);

        let row = builder
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_USER_MESSAGE))?;

        Ok(row.map(User::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1 FROM users LIMIT 1").execute(&self.pool).await?;
        Ok(())
    }
}
