use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::{eyre::OptionExt, Result};
use ulid::Ulid;

use super::models::{AuthUser, TokenPair};
use super::Db;
use crate::models::{AccountUpdateInput, RegisterInput};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

impl Db {
    /// Insert a new account. Returns `None` when the username is already taken.
    pub async fn create_user(&self, input: &RegisterInput) -> Result<Option<i64>> {
        let password_hash = hash_password(&input.password)?;

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        let user_id = match inserted {
            Ok(user_id) => user_id,
            Err(e) if is_unique_violation(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("new user created: id={user_id}, username={}", input.username);
        Ok(Some(user_id))
    }

    /// Whether `username` is taken by anyone other than `except_user_id`.
    pub async fn username_exists(&self, username: &str, except_user_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id IS NOT ?)",
        )
        .bind(username)
        .bind(except_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Check credentials of an active account. Returns the user id on success.
    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<i64>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, password_hash FROM users WHERE username = ? AND is_active = 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((id, stored_hash)) if verify_password(password, &stored_hash) => Ok(Some(id)),
            _ => Ok(None),
        }
    }

    pub async fn create_token_pair(
        &self,
        user_id: i64,
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> Result<TokenPair> {
        let mut tx = self.pool.begin().await?;
        let refresh = insert_token(&mut *tx, user_id, REFRESH, refresh_ttl_minutes).await?;
        let access = insert_token(&mut *tx, user_id, ACCESS, access_ttl_minutes).await?;
        tx.commit().await?;

        tracing::info!("new token pair issued for user_id={user_id}");
        Ok(TokenPair { refresh, access })
    }

    /// Exchange a live refresh token for a new access token.
    pub async fn refresh_access_token(
        &self,
        refresh: &str,
        access_ttl_minutes: i64,
    ) -> Result<Option<String>> {
        let mut tx = self.pool.begin().await?;

        // Touch the row first so the transaction holds the write lock.
        let user_id: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE user_tokens SET expires_at = expires_at
            WHERE id = ? AND kind = ? AND expires_at > datetime('now')
              AND user_id IN (SELECT id FROM users WHERE is_active = 1)
            RETURNING user_id
            "#,
        )
        .bind(refresh)
        .bind(REFRESH)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let access = insert_token(&mut *tx, user_id, ACCESS, access_ttl_minutes).await?;
        tx.commit().await?;

        Ok(Some(access))
    }

    pub async fn get_user_by_access_token(&self, token: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email
            FROM user_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = ? AND t.kind = ? AND t.expires_at > datetime('now')
              AND u.is_active = 1
            "#,
        )
        .bind(token)
        .bind(ACCESS)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Apply a partial account update. Absent fields keep their value.
    /// Returns `None` when the new username belongs to another account.
    pub async fn update_user(
        &self,
        user_id: i64,
        input: &AccountUpdateInput,
    ) -> Result<Option<AuthUser>> {
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        let updated = sqlx::query_as::<_, AuthUser>(
            r#"
            UPDATE users SET
              username = COALESCE(?, username),
              first_name = COALESCE(?, first_name),
              last_name = COALESCE(?, last_name),
              email = COALESCE(?, email),
              password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            RETURNING id, username, first_name, last_name, email
            "#,
        )
        .bind(input.username.as_deref())
        .bind(input.first_name.as_deref())
        .bind(input.last_name.as_deref())
        .bind(input.email.as_deref())
        .bind(password_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        let user = match updated {
            Ok(user) => user.ok_or_eyre("could not update user")?,
            Err(e) if is_unique_violation(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("user updated: id={user_id}");
        Ok(Some(user))
    }

    /// Soft-disable an account and revoke every token it holds.
    pub async fn deactivate_user(&self, user_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("user deactivated: id={user_id}");
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn insert_token(
    conn: &mut sqlx::SqliteConnection,
    user_id: i64,
    kind: &str,
    ttl_minutes: i64,
) -> Result<String> {
    let token = Ulid::new().to_string();

    sqlx::query(
        "INSERT INTO user_tokens (id, user_id, kind, expires_at) VALUES (?, ?, ?, datetime('now', ?))",
    )
    .bind(&token)
    .bind(user_id)
    .bind(kind)
    .bind(format!("{ttl_minutes:+} minutes"))
    .execute(&mut *conn)
    .await?;

    Ok(token)
}

/// Run argon2 hashing on a dedicated thread with a large stack to avoid
/// stack overflow in debug builds.
fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024) // 4 MB stack
        .spawn(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| color_eyre::eyre::eyre!("failed to hash password: {e}"))
        })?
        .join()
        .map_err(|_| color_eyre::eyre::eyre!("hash thread panicked"))?
}

fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .map(|h| h.join().unwrap_or(false))
        .unwrap_or(false)
}
