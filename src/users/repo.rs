use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{DuplicateIdentity, NewUser, User};

/// Persistence for user records.
///
/// Every mutation touches a single row. Writes that would break username or
/// email uniqueness fail with [`DuplicateIdentity`] inside the `anyhow` error.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Matches a user whose username equals `username` OR whose email equals `email`.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>>;

    async fn create(&self, new: &NewUser) -> anyhow::Result<User>;

    /// Overwrites (or clears, with `None`) the persisted refresh token.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;

    async fn update_details(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>>;

    async fn update_avatar(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>>;

    async fn update_cover_image(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique(e: sqlx::Error) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &e {
        // 23505: unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return anyhow::Error::new(DuplicateIdentity);
        }
    }
    anyhow::Error::new(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, full_name, avatar, cover_image,
                   password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, full_name, avatar, cover_image,
                   password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by username or email")?;
        Ok(user)
    }

    async fn create(&self, new: &NewUser) -> anyhow::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, full_name, avatar, cover_image,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(&new.avatar)
        .bind(&new.cover_image)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1"#)
            .bind(id)
            .bind(token)
            .execute(&self.db)
            .await
            .context("set refresh token")?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("update password")?;
        Ok(())
    }

    async fn update_details(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET full_name = $2, email = $3, updated_at = now()
             WHERE id = $1
            RETURNING id, username, email, full_name, avatar, cover_image,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique)
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET avatar = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, username, email, full_name, avatar, cover_image,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.db)
        .await
        .context("update avatar")?;
        Ok(user)
    }

    async fn update_cover_image(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET cover_image = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, username, email, full_name, avatar, cover_image,
                      password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.db)
        .await
        .context("update cover image")?;
        Ok(user)
    }
}
