use std::sync::Arc;

use configs::AuthConfig;
use tracing::{debug, error, info, instrument};

use super::domain::{
    AccessGrant, AuthSession, AuthUser, LoginInput, NewUser, RefreshInput, RegisterInput, Role, TokenPair, UserView,
};
use super::errors::AuthError;
use super::password::PasswordHasher;
use super::repository::CredentialStore;
use super::token::{TokenError, TokenIssuer};

/// Auth business service independent of web framework
pub struct AuthService<R: CredentialStore + ?Sized> {
    repo: Arc<R>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl<R: CredentialStore + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self { repo, hasher: PasswordHasher::new(&cfg.password)?, tokens: TokenIssuer::new(cfg) })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new user and open a session for it.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, repository::memory::InMemoryCredentialStore};
    /// use service::auth::domain::{RegisterInput, Role};
    /// use std::sync::Arc;
    /// let cfg = configs::AuthConfig {
    ///     access_secret: "access".into(),
    ///     refresh_secret: "refresh".into(),
    ///     password: configs::PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 },
    ///     ..Default::default()
    /// };
    /// let svc = AuthService::new(Arc::new(InMemoryCredentialStore::default()), &cfg).unwrap();
    /// let input = RegisterInput { name: "Ann".into(), email: "Ann@X.com".into(), password: "secret123".into(), role: None };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.email, "ann@x.com");
    /// assert_eq!(session.user.role, Role::Employee);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        if input.name.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("name, email and password are required".into()));
        }
        let email = models::user::normalize_email(&input.email);
        models::user::validate_email(&email)?;
        models::user::validate_name(&input.name)?;
        let role = match input.role.as_deref() {
            None => Role::default(),
            Some(raw) if raw.trim().is_empty() => Role::default(),
            Some(raw) => raw.parse::<Role>().map_err(AuthError::Validation)?,
        };

        if self.store(self.repo.find_by_email(&email).await)?.is_some() {
            debug!("email already registered");
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = self
            .store(
                self.repo
                    .create(NewUser { name: input.name.trim().to_string(), email, password_hash, role })
                    .await,
            )?;

        let tokens = self.issue_pair(&user)?;
        info!(user_id = %user.id, role = %user.role, "user_registered");
        Ok(AuthSession { tokens, user: UserView::from(&user) })
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password fail identically, and both paths run
    /// one password verification.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, repository::memory::InMemoryCredentialStore};
    /// use service::auth::domain::{LoginInput, RegisterInput};
    /// use std::sync::Arc;
    /// let cfg = configs::AuthConfig {
    ///     access_secret: "access".into(),
    ///     refresh_secret: "refresh".into(),
    ///     password: configs::PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 },
    ///     ..Default::default()
    /// };
    /// let svc = AuthService::new(Arc::new(InMemoryCredentialStore::default()), &cfg).unwrap();
    /// let reg = RegisterInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into(), role: None };
    /// let registered = tokio_test::block_on(svc.register(reg)).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.id, registered.user.id);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }
        let email = models::user::normalize_email(&input.email);

        let Some(creds) = self.store(self.repo.find_by_email_with_secret(&email).await)? else {
            self.hasher.verify_dummy(&input.password)?;
            debug!(reason = "unknown_email", "login_rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self.hasher.verify(&input.password, &creds.password_hash).map_err(|e| {
            error!(user_id = %creds.user.id, error = %e, "stored password hash unreadable");
            AuthError::from(e)
        })?;
        if !matches {
            debug!(reason = "password_mismatch", "login_rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&creds.user)?;
        info!(user_id = %creds.user.id, "user_logged_in");
        Ok(AuthSession { tokens, user: UserView::from(&creds.user) })
    }

    /// Trade a refresh token for a new access token. The refresh token is not rotated.
    #[instrument(skip(self, input))]
    pub async fn refresh(&self, input: RefreshInput) -> Result<AccessGrant, AuthError> {
        let token = input.refresh_token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("refresh_token is required".into()));
        }
        let user_id = self.tokens.verify_refresh(token)?;
        let access_token = self.tokens.issue_access(user_id)?;
        info!(%user_id, "access_token_refreshed");
        Ok(AccessGrant { access_token })
    }

    /// Resolve an access token to the current stored user.
    ///
    /// The role comes from the store on every call, never from the token.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let user_id = self.tokens.verify_access(access_token.trim())?;
        self.store(self.repo.find_by_id(user_id).await)?
            .ok_or(AuthError::Unauthorized(TokenError::SubjectNotFound))
    }

    fn issue_pair(&self, user: &AuthUser) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(user.id)?,
            refresh_token: self.tokens.issue_refresh(user.id)?,
        })
    }

    fn store<T>(&self, res: Result<T, AuthError>) -> Result<T, AuthError> {
        if let Err(AuthError::StoreUnavailable(detail)) = &res {
            error!(error = %detail, "credential store failure");
        }
        res
    }
}
