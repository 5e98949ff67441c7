use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    Claims, PasswordError, PasswordService, Role, StoredHash, TokenError, TokenIdentity, TokenService,
};
use crate::config::SecurityConfig;
use crate::database::models::{NewUser, User, UserProfile};
use crate::database::{DatabaseError, Store};
use crate::services::error::{
    ConflictKind, FieldErrors, Resource, ServiceError, ServiceResult,
};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 50;
const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "specialPassword")]
    pub special_password: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user: UserProfile,
}

/// Login, registration and token checks over the user store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    passwords: PasswordService,
    admin_secret: Option<String>,
    editor_secret: Option<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, security: &SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            passwords: PasswordService::new(),
            admin_secret: security.admin_secret.clone(),
            editor_secret: security.editor_secret.clone(),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.tokens.verify(token)
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginSession> {
        let mut errors = FieldErrors::new();
        let username = required(&mut errors, "username", request.username, "Username is required");
        let password = required(&mut errors, "password", request.password, "Password is required");
        errors.into_result("Validation failed")?;

        let Some(user) = self.store.find_user_by_username(&username).await? else {
            warn!(username = %username, "Login failed: unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        let stored = match StoredHash::parse(&user.password_hash) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(username = %username, user_id = user.id, "Login failed: stored hash unusable: {}", e);
                return Err(ServiceError::InvalidCredentials);
            }
        };
        if !self.verify_password(&password, &stored).await? {
            warn!(username = %username, user_id = user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if stored.needs_upgrade() {
            self.upgrade_hash(&user, password).await;
        }

        let identity = TokenIdentity {
            id: user.id,
            role: user.role,
            username: user.username.clone(),
        };
        let token = self.tokens.issue(&identity)?;
        info!(username = %user.username, role = %user.role, "User logged in");

        Ok(LoginSession {
            token,
            user: UserProfile::from(&user),
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<UserProfile> {
        let (username, password, role) = validate_registration(&request)?;

        if role != Role::User && !self.special_password_matches(role, request.special_password.as_deref()) {
            warn!(username = %username, role = %role, "Registration rejected: special password");
            return Err(ServiceError::SpecialPasswordRejected(role));
        }

        let user = self.create_user(&username, &password, role).await?;
        info!(username = %user.username, role = %user.role, "Registered user {}", user.id);
        Ok(user)
    }

    /// Inserts an account without the self-registration checks. Used by
    /// `register` after validation and by the admin CLI.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> ServiceResult<UserProfile> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(ServiceError::Conflict(ConflictKind::UserExists));
        }

        let password_hash = self.hash_password(password.to_string()).await?;
        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
            role,
        };

        match self.store.insert_user(&new_user).await {
            Ok(user) => Ok(UserProfile::from(&user)),
            Err(DatabaseError::UniqueViolation(_)) => Err(ServiceError::Conflict(ConflictKind::UserExists)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn current_user(&self, id: i64) -> ServiceResult<UserProfile> {
        self.store
            .find_user_by_id(id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(ServiceError::NotFound(Resource::User))
    }

    fn special_password_matches(&self, role: Role, supplied: Option<&str>) -> bool {
        let expected = match role {
            Role::Admin => self.admin_secret.as_deref(),
            Role::Editor => self.editor_secret.as_deref(),
            Role::User => return true,
        };
        matches!((expected, supplied), (Some(expected), Some(supplied)) if expected == supplied)
    }

    async fn hash_password(&self, plaintext: String) -> ServiceResult<String> {
        let passwords = self.passwords.clone();
        let digest = tokio::task::spawn_blocking(move || passwords.hash(&plaintext)).await??;
        Ok(digest)
    }

    async fn verify_password(&self, plaintext: &str, stored: &StoredHash) -> ServiceResult<bool> {
        let passwords = self.passwords.clone();
        let plaintext = plaintext.to_string();
        let stored = stored.clone();
        match tokio::task::spawn_blocking(move || passwords.verify(&plaintext, &stored)).await? {
            Ok(matches) => Ok(matches),
            Err(PasswordError::UnrecognizedFormat) => {
                warn!("Stored password hash failed to decode; treating as mismatch");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best effort: the login has already succeeded.
    async fn upgrade_hash(&self, user: &User, plaintext: String) {
        let digest = match self.hash_password(plaintext).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(user_id = user.id, "Password hash upgrade failed: {}", e);
                return;
            }
        };

        match self.store.update_password_hash(user.id, &digest).await {
            Ok(()) => info!(user_id = user.id, "Upgraded password hash to argon2"),
            Err(e) => warn!(user_id = user.id, "Password hash upgrade failed: {}", e),
        }
    }
}

fn required(errors: &mut FieldErrors, field: &str, value: Option<String>, message: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => {
            errors.add(field, message);
            String::new()
        }
    }
}

fn validate_registration(request: &RegisterRequest) -> ServiceResult<(String, String, Role)> {
    let mut errors = FieldErrors::new();

    let username = request.username.clone().unwrap_or_default();
    if let Err(message) = check_username(&username) {
        errors.add("username", message);
    }

    let password = request.password.clone().unwrap_or_default();
    if let Err(message) = check_password(&password) {
        errors.add("password", message);
    }

    let role = match request.role.as_deref() {
        None | Some("") => Ok(Role::User),
        Some(role) => role.parse::<Role>(),
    };
    if role.is_err() {
        errors.add("role", "Role must be one of admin, editor, user");
    }

    errors.into_result("Validation failed")?;
    let role = role.map_err(|e| ServiceError::invalid_field("role", e.to_string()))?;
    Ok((username, password, role))
}

pub fn check_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required");
    }
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err("Username must be between 3 and 50 characters");
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Username may only contain letters, digits and underscores");
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err("Password must be at least 8 characters");
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err("Password must contain a lowercase letter, an uppercase letter and a digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::legacy_digest;
    use crate::config::AppConfig;
    use crate::database::{MemoryStore, UserStore};

    fn service_with(store: Arc<MemoryStore>) -> AuthService {
        let config = AppConfig::development();
        let tokens = TokenService::new(&config.security.jwt_secret, 1).unwrap();
        AuthService::new(store, tokens, &config.security)
    }

    fn register_request(username: &str, role: &str, special: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            password: Some("Secret123".to_string()),
            role: Some(role.to_string()),
            special_password: special.map(str::to_string),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn username_rules() {
        assert!(check_username("alice_01").is_ok());
        assert!(check_username("al").is_err());
        assert!(check_username("alice smith").is_err());
        assert!(check_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn password_rules() {
        assert!(check_password("Secret123").is_ok());
        assert!(check_password("Sec123").is_err());
        assert!(check_password("secret123").is_err());
        assert!(check_password("SecretPass").is_err());
    }

    #[tokio::test]
    async fn registered_role_is_carried_in_token() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let profile = service
            .register(register_request("alice", "editor", Some("editorsecret")))
            .await
            .unwrap();
        assert_eq!(profile.role, Role::Editor);

        let session = service.login(login_request("alice", "Secret123")).await.unwrap();
        let claims = service.verify_token(&session.token).unwrap();
        assert_eq!(claims.role, Role::Editor);
        assert_eq!(claims.id, profile.id);
    }

    #[tokio::test]
    async fn privileged_role_needs_matching_special_password() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let err = service
            .register(register_request("mallory", "admin", Some("wrong")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SpecialPasswordRejected(Role::Admin)));

        let err = service
            .register(register_request("mallory", "editor", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SpecialPasswordRejected(Role::Editor)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.register(register_request("bob", "user", None)).await.unwrap();
        let err = service.register(register_request("bob", "user", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ConflictKind::UserExists)));
    }

    #[tokio::test]
    async fn invalid_registration_reports_every_field() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let request = RegisterRequest {
            username: Some("x".to_string()),
            password: Some("short".to_string()),
            role: Some("superuser".to_string()),
            special_password: None,
        };
        match service.register(request).await {
            Err(ServiceError::Validation { field_errors, .. }) => {
                assert!(field_errors.contains_key("username"));
                assert!(field_errors.contains_key("password"));
                assert!(field_errors.contains_key("role"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn legacy_hash_is_upgraded_on_login() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_user(&NewUser {
                username: "legacy".to_string(),
                password_hash: legacy_digest("OldPass1"),
                role: Role::User,
            })
            .await
            .unwrap();
        let service = service_with(store.clone());

        let err = service.login(login_request("legacy", "WrongPass1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        service.login(login_request("legacy", "OldPass1")).await.unwrap();
        let user = store.find_user_by_username("legacy").await.unwrap().unwrap();
        assert!(!StoredHash::parse(&user.password_hash).unwrap().needs_upgrade());

        // Still works against the upgraded hash
        service.login(login_request("legacy", "OldPass1")).await.unwrap();
        let err = service.login(login_request("legacy", "WrongPass1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let err = service.login(LoginRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let err = service.login(login_request("nobody", "Secret123")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }
}
