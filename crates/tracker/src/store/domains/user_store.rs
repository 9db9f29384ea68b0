use log::debug;
use sha2::{Digest, Sha256};
use shared::models::user::{LoginRequest, RegisterRequest, User};
use shared::security::bearer_auth_middleware::TokenResolver;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use subtle::ConstantTimeEq;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("User already exists")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

struct Account {
    user: User,
    salt: String,
    password_hash: String,
}

#[derive(Default)]
struct Accounts {
    accounts: Vec<Account>,
    // token -> user id
    tokens: HashMap<String, String>,
}

/// In-memory accounts and the bearer tokens issued to them.
#[derive(Default)]
pub struct UserStore {
    inner: Mutex<Accounts>,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Accounts> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an account and returns it together with a fresh token.
    pub fn register(&self, request: RegisterRequest) -> Result<(User, String), UserStoreError> {
        let (Some(email), Some(password)) = (non_empty(request.email), non_empty(request.password))
        else {
            return Err(UserStoreError::MissingCredentials);
        };
        let email = email.trim().to_lowercase();

        let mut inner = self.inner();
        if inner.accounts.iter().any(|a| a.user.email == email) {
            return Err(UserStoreError::AlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            name: non_empty(request.name),
        };
        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&salt, &password);
        inner.accounts.push(Account {
            user: user.clone(),
            salt,
            password_hash,
        });

        let token = Uuid::new_v4().to_string();
        inner.tokens.insert(token.clone(), user.id.clone());
        debug!("Registered user {} ({} accounts)", user.id, inner.accounts.len());
        Ok((user, token))
    }

    /// Checks the password and issues an additional token. Tokens handed out
    /// earlier stay valid.
    pub fn login(&self, request: LoginRequest) -> Result<(User, String), UserStoreError> {
        let (Some(email), Some(password)) = (non_empty(request.email), non_empty(request.password))
        else {
            return Err(UserStoreError::MissingCredentials);
        };
        let email = email.trim().to_lowercase();

        let mut inner = self.inner();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.user.email == email)
            .ok_or(UserStoreError::InvalidCredentials)?;

        let provided = hash_password(&account.salt, &password);
        if !bool::from(provided.as_bytes().ct_eq(account.password_hash.as_bytes())) {
            return Err(UserStoreError::InvalidCredentials);
        }

        let user = account.user.clone();
        // No logout or expiry, so the token map only grows.
        let token = Uuid::new_v4().to_string();
        inner.tokens.insert(token.clone(), user.id.clone());
        Ok((user, token))
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.inner()
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
    }
}

impl TokenResolver for UserStore {
    fn resolve(&self, token: &str) -> Option<String> {
        self.inner().tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            name: Some("Test User".to_string()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_register_issues_resolvable_token() {
        let store = UserStore::new();
        let (user, token) = store
            .register(register_request("test@example.com", "password123"))
            .unwrap();
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.name.as_deref(), Some("Test User"));
        assert_eq!(store.resolve(&token), Some(user.id.clone()));
        assert_eq!(store.get_user(&user.id), Some(user));
        assert_eq!(store.resolve("not-a-token"), None);
    }

    #[test]
    fn test_register_requires_email_and_password() {
        let store = UserStore::new();
        assert_eq!(
            store.register(RegisterRequest::default()),
            Err(UserStoreError::MissingCredentials)
        );
        assert_eq!(
            store.register(register_request("a@b.c", "")),
            Err(UserStoreError::MissingCredentials)
        );
    }

    #[test]
    fn test_duplicate_email_ignores_case() {
        let store = UserStore::new();
        store.register(register_request("Dup@Example.com", "pw")).unwrap();
        assert_eq!(
            store.register(register_request("dup@example.com", "other")),
            Err(UserStoreError::AlreadyExists)
        );
    }

    #[test]
    fn test_login() {
        let store = UserStore::new();
        let (user, first_token) = store.register(register_request("me@x.io", "secret")).unwrap();

        let (logged_in, second_token) = store.login(login_request("ME@x.io", "secret")).unwrap();
        assert_eq!(logged_in, user);
        assert_ne!(first_token, second_token);
        assert_eq!(store.resolve(&first_token), Some(user.id.clone()));
        assert_eq!(store.resolve(&second_token), Some(user.id));

        assert_eq!(
            store.login(login_request("me@x.io", "wrong")),
            Err(UserStoreError::InvalidCredentials)
        );
        assert_eq!(
            store.login(login_request("nobody@x.io", "secret")),
            Err(UserStoreError::InvalidCredentials)
        );
        assert_eq!(
            store.login(LoginRequest::default()),
            Err(UserStoreError::MissingCredentials)
        );
    }

    #[test]
    fn test_salts_differ() {
        let store = UserStore::new();
        store.register(register_request("a@x.io", "same")).unwrap();
        store.register(register_request("b@x.io", "same")).unwrap();
        let inner = store.inner();
        assert_ne!(
            inner.accounts[0].password_hash,
            inner.accounts[1].password_hash
        );
    }
}
