use color_eyre::Result;

use crate::db::models::{AuthUser, TokenPair};
use crate::db::Db;
use crate::models::{AccountUpdateInput, RegisterInput};
use crate::names;
use crate::rejections::FieldErrors;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn username_exists(
        &self,
        username: &str,
        except_user_id: Option<i64>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        input: &RegisterInput,
    ) -> impl std::future::Future<Output = Result<Option<i64>>> + Send;

    fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>>> + Send;

    fn create_token_pair(
        &self,
        user_id: i64,
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> impl std::future::Future<Output = Result<TokenPair>> + Send;

    fn refresh_access_token(
        &self,
        refresh: &str,
        access_ttl_minutes: i64,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    fn update_user(
        &self,
        user_id: i64,
        input: &AccountUpdateInput,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn deactivate_user(&self, user_id: i64) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    async fn username_exists(&self, username: &str, except_user_id: Option<i64>) -> Result<bool> {
        Db::username_exists(self, username, except_user_id).await
    }

    async fn create_user(&self, input: &RegisterInput) -> Result<Option<i64>> {
        Db::create_user(self, input).await
    }

    async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<i64>> {
        Db::verify_user_password(self, username, password).await
    }

    async fn create_token_pair(
        &self,
        user_id: i64,
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> Result<TokenPair> {
        Db::create_token_pair(self, user_id, access_ttl_minutes, refresh_ttl_minutes).await
    }

    async fn refresh_access_token(
        &self,
        refresh: &str,
        access_ttl_minutes: i64,
    ) -> Result<Option<String>> {
        Db::refresh_access_token(self, refresh, access_ttl_minutes).await
    }

    async fn update_user(
        &self,
        user_id: i64,
        input: &AccountUpdateInput,
    ) -> Result<Option<AuthUser>> {
        Db::update_user(self, user_id, input).await
    }

    async fn deactivate_user(&self, user_id: i64) -> Result<()> {
        Db::deactivate_user(self, user_id).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum RegisterOutcome {
    /// Account created; the caller is handed a fresh token pair.
    Created(TokenPair),
    Invalid(FieldErrors),
}

pub enum LoginOutcome {
    Success(TokenPair),
    /// Wrong password, unknown username or deactivated account.
    InvalidCredentials,
}

pub enum RefreshOutcome {
    Success(String),
    InvalidToken,
}

pub enum UpdateAccountOutcome {
    Updated(AuthUser),
    Invalid(FieldErrors),
}

/// Token lifetimes, in minutes.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtl {
    pub access_minutes: i64,
    pub refresh_minutes: i64,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self {
            access_minutes: names::DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            refresh_minutes: names::DEFAULT_REFRESH_TOKEN_TTL_MINUTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

const USERNAME_TAKEN: &str = "Username already exists.";

fn username_taken() -> FieldErrors {
    let mut errors = FieldErrors::new();
    push(&mut errors, "username", USERNAME_TAKEN);
    errors
}

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        push(errors, "username", "This field may not be blank.");
    } else if username.chars().count() > names::MAX_USERNAME_LEN {
        push(
            errors,
            "username",
            "Ensure this field has no more than 150 characters.",
        );
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        push(
            errors,
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn validate_password(password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        push(errors, "password", "This field may not be blank.");
    } else if password.chars().count() < names::MIN_PASSWORD_LENGTH {
        push(
            errors,
            "password",
            "This password is too short. It must contain at least 8 characters.",
        );
    }
}

fn validate_email(email: &str, errors: &mut FieldErrors) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !email.is_empty() && !valid {
        push(errors, "email", "Enter a valid email address.");
    }
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
    ttl: TokenTtl,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            ttl: self.ttl,
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R, ttl: TokenTtl) -> Self {
        Self { repo, ttl }
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<RegisterOutcome> {
        let mut errors = FieldErrors::new();
        validate_username(&input.username, &mut errors);
        validate_password(&input.password, &mut errors);
        validate_email(&input.email, &mut errors);

        if !errors.contains_key("username") && self.repo.username_exists(&input.username, None).await? {
            push(&mut errors, "username", USERNAME_TAKEN);
        }

        if !errors.is_empty() {
            return Ok(RegisterOutcome::Invalid(errors));
        }

        // Lost a race with a concurrent registration of the same name.
        let Some(user_id) = self.repo.create_user(input).await? else {
            return Ok(RegisterOutcome::Invalid(username_taken()));
        };
        let tokens = self
            .repo
            .create_token_pair(user_id, self.ttl.access_minutes, self.ttl.refresh_minutes)
            .await?;

        Ok(RegisterOutcome::Created(tokens))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let Some(user_id) = self.repo.verify_user_password(username, password).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let tokens = self
            .repo
            .create_token_pair(user_id, self.ttl.access_minutes, self.ttl.refresh_minutes)
            .await?;

        Ok(LoginOutcome::Success(tokens))
    }

    pub async fn refresh(&self, refresh: &str) -> Result<RefreshOutcome> {
        if refresh.is_empty() {
            return Ok(RefreshOutcome::InvalidToken);
        }

        match self
            .repo
            .refresh_access_token(refresh, self.ttl.access_minutes)
            .await?
        {
            Some(access) => Ok(RefreshOutcome::Success(access)),
            None => Ok(RefreshOutcome::InvalidToken),
        }
    }

    pub async fn update_account(
        &self,
        user_id: i64,
        input: &AccountUpdateInput,
    ) -> Result<UpdateAccountOutcome> {
        let mut errors = FieldErrors::new();
        if let Some(username) = &input.username {
            validate_username(username, &mut errors);
            if !errors.contains_key("username")
                && self.repo.username_exists(username, Some(user_id)).await?
            {
                push(&mut errors, "username", USERNAME_TAKEN);
            }
        }
        if let Some(password) = &input.password {
            validate_password(password, &mut errors);
        }
        if let Some(email) = &input.email {
            validate_email(email, &mut errors);
        }

        if !errors.is_empty() {
            return Ok(UpdateAccountOutcome::Invalid(errors));
        }

        match self.repo.update_user(user_id, input).await? {
            Some(user) => Ok(UpdateAccountOutcome::Updated(user)),
            None => Ok(UpdateAccountOutcome::Invalid(username_taken())),
        }
    }

    pub async fn deactivate(&self, user_id: i64) -> Result<()> {
        self.repo.deactivate_user(user_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
