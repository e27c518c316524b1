use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use error_common::{ErrorKind, ValidationErrors};
use logger_redacted::redact_login;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::{CreateUserRequest, Group, User, UserKind, UserStatus};
use crate::repository::PrincipalRepository;
use crate::validation::{self, PasswordInput};

const RANDOM_PASSWORD_LENGTH: usize = 40;

pub struct IdentityService {
    repo: Arc<dyn PrincipalRepository>,
    config: IdentityConfig,
    argon2: Argon2<'static>,
}

impl IdentityService {
    pub fn new(repo: Arc<dyn PrincipalRepository>, config: IdentityConfig) -> Self {
        Self {
            repo,
            config,
            argon2: Argon2::default(),
        }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn PrincipalRepository> {
        &self.repo
    }

    /// Create an account on behalf of an administrator
    pub async fn register_user(&self, request: CreateUserRequest) -> Result<User> {
        let status = request.status.unwrap_or(UserStatus::Active);
        self.create_user(request, status).await
    }

    /// Create an account through the public registration form
    pub async fn self_register(&self, mut request: CreateUserRequest) -> Result<User> {
        let status = self
            .config
            .self_registration
            .initial_status()
            .ok_or(IdentityError::RegistrationDisabled)?;
        request.admin = false;
        self.create_user(request, status).await
    }

    async fn create_user(&self, request: CreateUserRequest, status: UserStatus) -> Result<User> {
        let mut user = User::new(
            &request.login,
            &request.firstname,
            &request.lastname,
            &request.mail,
        );
        user.admin = request.admin;
        user.status = status;
        user.language = request.language.clone();

        let mut errors = ValidationErrors::new();
        match validation::parse_mail_notification(request.mail_notification.as_deref()) {
            Ok(option) => {
                user.mail_notification =
                    Some(option.unwrap_or(self.config.default_notification_option))
            }
            Err(parse_errors) => errors.merge(parse_errors),
        }

        let password = request.password.as_deref().map(|password| PasswordInput {
            password,
            confirmation: request.password_confirmation.as_deref(),
        });
        errors.merge(validation::validate_user(
            &user,
            password,
            self.config.password_min_length,
        ));
        errors.merge(self.uniqueness_errors(&user).await?);
        errors.into_result()?;

        if let Some(password) = request.password.as_deref() {
            user.hashed_password = self.hash_password(password)?;
        }

        let user = self.repo.insert_user(user).await?;
        info!(user_id = %user.id, login = %redact_login(&user.login), "User created");
        Ok(user)
    }

    /// Validate and persist changes to an existing user
    pub async fn save_user(&self, mut user: User) -> Result<User> {
        let mut errors = validation::validate_user(&user, None, self.config.password_min_length);
        errors.merge(self.uniqueness_errors(&user).await?);
        errors.into_result()?;

        user.updated_on = Utc::now();
        self.repo.update_user(user).await
    }

    async fn uniqueness_errors(&self, user: &User) -> Result<ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if user.is_sentinel() {
            return Ok(errors);
        }
        if !user.login.is_empty() {
            if let Some(existing) = self.repo.find_by_login(&user.login).await? {
                if existing.id != user.id && existing.login.eq_ignore_ascii_case(&user.login) {
                    errors.add("login", ErrorKind::Taken);
                }
            }
        }
        if !user.raw_mail().is_empty() {
            if let Some(existing) = self.repo.find_by_mail(user.raw_mail()).await? {
                if existing.id != user.id {
                    errors.add("mail", ErrorKind::Taken);
                }
            }
        }
        Ok(errors)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<User> {
        self.repo.find_user(id).await?.ok_or(IdentityError::UserNotFound)
    }

    /// The anonymous sentinel, created on first use
    pub async fn anonymous(&self) -> Result<User> {
        self.sentinel(UserKind::Anonymous).await
    }

    /// The deleted-user sentinel, created on first use
    pub async fn deleted_user(&self) -> Result<User> {
        self.sentinel(UserKind::Deleted).await
    }

    async fn sentinel(&self, kind: UserKind) -> Result<User> {
        match self.repo.find_sentinel(kind).await? {
            Some(user) => Ok(user),
            None => self.create_sentinel(kind).await,
        }
    }

    /// Store a new sentinel; fails on `base` when one already exists
    pub async fn create_sentinel(&self, kind: UserKind) -> Result<User> {
        let duplicate_message = kind.traits().duplicate_message.ok_or_else(|| {
            IdentityError::InternalError(anyhow::anyhow!("{:?} is not a sentinel kind", kind))
        })?;

        if self.repo.find_sentinel(kind).await?.is_some() {
            let mut errors = ValidationErrors::new();
            errors.add_base(duplicate_message);
            return Err(IdentityError::Validation(errors));
        }

        let user = self.repo.insert_user(User::sentinel(kind)).await?;
        info!(user_id = %user.id, kind = ?kind, "Built-in user created");
        Ok(user)
    }

    /// Authenticate by login and password; `None` on any mismatch
    pub async fn try_to_login(&self, login: &str, password: &str) -> Result<Option<User>> {
        if password.is_empty() {
            return Ok(None);
        }
        let mut user = match self.repo.find_by_login(login).await? {
            Some(user) => user,
            None => {
                debug!(login = %redact_login(login), "Login failed: unknown user");
                return Ok(None);
            }
        };
        if !user.is_active() {
            debug!(user_id = %user.id, "Login failed: account not active");
            return Ok(None);
        }
        if !self.check_password(&user, password) {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Ok(None);
        }

        user.last_login_on = Some(Utc::now());
        let user = self.repo.update_user(user).await?;
        info!(user_id = %user.id, login = %redact_login(&user.login), "Successful authentication");
        Ok(Some(user))
    }

    pub fn check_password(&self, user: &User, password: &str) -> bool {
        if user.hashed_password.is_empty() {
            return false;
        }
        match PasswordHash::new(&user.hashed_password) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        password: &str,
        confirmation: Option<&str>,
    ) -> Result<User> {
        let mut user = self.find_user(user_id).await?;
        if user.is_sentinel() {
            return Err(IdentityError::SentinelProtected);
        }

        validation::validate_user(
            &user,
            Some(PasswordInput { password, confirmation }),
            self.config.password_min_length,
        )
        .into_result()?;

        user.hashed_password = self.hash_password(password)?;
        user.updated_on = Utc::now();
        let user = self.repo.update_user(user).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(user)
    }

    /// 40 random alphanumeric characters
    pub fn random_password() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_PASSWORD_LENGTH)
            .map(char::from)
            .collect()
    }

    pub async fn activate(&self, user_id: Uuid) -> Result<User> {
        self.set_status(user_id, UserStatus::Active).await
    }

    pub async fn lock(&self, user_id: Uuid) -> Result<User> {
        self.set_status(user_id, UserStatus::Locked).await
    }

    pub async fn register(&self, user_id: Uuid) -> Result<User> {
        self.set_status(user_id, UserStatus::Registered).await
    }

    async fn set_status(&self, user_id: Uuid, status: UserStatus) -> Result<User> {
        let mut user = self.find_user(user_id).await?;
        if user.is_sentinel() {
            return Err(IdentityError::SentinelProtected);
        }
        match status {
            UserStatus::Active => user.activate(),
            UserStatus::Locked => user.lock(),
            UserStatus::Registered => user.register(),
            UserStatus::Builtin => return Err(IdentityError::SentinelProtected),
        }
        user.updated_on = Utc::now();
        let user = self.repo.update_user(user).await?;
        info!(user_id = %user.id, status = ?status, "User status changed");
        Ok(user)
    }

    pub async fn create_group(&self, name: &str) -> Result<Group> {
        let group = Group::new(name.trim());
        let mut errors = validation::validate_group(&group);
        if !group.name.is_empty() && self.repo.find_group_by_name(&group.name).await?.is_some() {
            errors.add("name", ErrorKind::Taken);
        }
        errors.into_result()?;

        let group = self.repo.insert_group(group).await?;
        info!(group_id = %group.id, name = %group.name, "Group created");
        Ok(group)
    }

    pub async fn add_user_to_group(&self, group_id: Uuid, user_id: Uuid) -> Result<Group> {
        let user = self.find_user(user_id).await?;
        if user.is_sentinel() {
            return Err(IdentityError::SentinelProtected);
        }
        let mut group = self
            .repo
            .find_group(group_id)
            .await?
            .ok_or(IdentityError::GroupNotFound)?;
        group.user_ids.insert(user.id);
        self.repo.update_group(group).await
    }

    pub async fn remove_user_from_group(&self, group_id: Uuid, user_id: Uuid) -> Result<Group> {
        let mut group = self
            .repo
            .find_group(group_id)
            .await?
            .ok_or(IdentityError::GroupNotFound)?;
        group.user_ids.remove(&user_id);
        self.repo.update_group(group).await
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| IdentityError::HashingError)
    }
}
