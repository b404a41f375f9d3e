//! Process-local credential provider
//!
//! Accounts are kept in memory keyed by normalized email. Sign-in issues a
//! signed JWT; sign-out records the token id so the token stops verifying
//! before it expires. Registration also writes the `users/{uid}` profile
//! document that the access guard reads roles from.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::domain::{
    collections, CredentialProvider, DocumentStore, DomainError, DomainResult, Identity, Session,
};
use crate::infrastructure::crypto::{
    create_token, hash_password_with_cost, verify_password, verify_token, Claims, JwtConfig,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    display_name: Option<String>,
    password_hash: String,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

pub struct LocalCredentialProvider {
    accounts: DashMap<String, Account>,
    /// Revoked token ids mapped to their expiry (unix seconds)
    revoked: DashMap<String, i64>,
    store: Arc<dyn DocumentStore>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl LocalCredentialProvider {
    pub fn new(store: Arc<dyn DocumentStore>, jwt: JwtConfig) -> Self {
        Self {
            accounts: DashMap::new(),
            revoked: DashMap::new(),
            store,
            jwt,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor (4..=31).
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost.clamp(4, 31);
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt
    }

    pub fn account_exists(&self, email: &str) -> bool {
        self.accounts.contains_key(&normalize(email))
    }

    /// Register an account and mark its profile document as admin.
    /// Existing accounts only get their role refreshed.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> DomainResult<Identity> {
        let existing = self.accounts.get(&normalize(email)).map(|a| a.identity());
        let identity = match existing {
            Some(identity) => identity,
            None => self.register(email, password, display_name).await?,
        };

        let mut profile = self
            .store
            .get(collections::USERS, &identity.uid)
            .await?
            .map(|doc| doc.data)
            .unwrap_or_else(|| profile_data(&identity));
        profile.insert("role".into(), json!(collections::ADMIN_ROLE));
        self.store
            .set(collections::USERS, &identity.uid, profile)
            .await?;

        info!(email = %identity.email, uid = %identity.uid, "Admin account ready");
        Ok(identity)
    }

    fn purge_expired_revocations(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp >= now);
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn profile_data(identity: &Identity) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("uid".into(), json!(identity.uid));
    data.insert("email".into(), json!(identity.email));
    data.insert("creation_time".into(), json!(Utc::now().timestamp_millis()));
    if let Some(name) = &identity.display_name {
        data.insert("displayName".into(), json!(name));
    }
    data
}

#[async_trait]
impl CredentialProvider for LocalCredentialProvider {
    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let account = self
            .accounts
            .get(&normalize(email))
            .map(|a| a.value().clone())
            .ok_or_else(|| DomainError::Auth(INVALID_CREDENTIALS.into()))?;

        let matches = verify_password(password, &account.password_hash)
            .map_err(|e| DomainError::Internal(format!("password verification failed: {}", e)))?;
        if !matches {
            debug!(email = %account.email, "Password mismatch");
            return Err(DomainError::Auth(INVALID_CREDENTIALS.into()));
        }

        let claims = Claims::new(
            &account.uid,
            &account.email,
            account.display_name.as_deref(),
            &self.jwt,
        );
        let token = create_token(&claims, &self.jwt)
            .map_err(|e| DomainError::Internal(format!("token signing failed: {}", e)))?;

        Ok(Session {
            identity: account.identity(),
            token,
            expires_in: self.jwt.expiration_hours * 3600,
        })
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> DomainResult<Identity> {
        let key = normalize(email);
        if self.accounts.contains_key(&key) {
            return Err(DomainError::Conflict(format!(
                "Email '{}' is already registered",
                email.trim()
            )));
        }

        let password_hash = hash_password_with_cost(password, self.bcrypt_cost)
            .map_err(|e| DomainError::Internal(format!("password hashing failed: {}", e)))?;
        let account = Account {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: email.trim().to_string(),
            display_name: display_name.map(String::from),
            password_hash,
        };
        let identity = account.identity();

        // Re-check under the shard lock; hashing ran unlocked
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!(
                    "Email '{}' is already registered",
                    email.trim()
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(account);
            }
        }

        self.store
            .set(collections::USERS, &identity.uid, profile_data(&identity))
            .await?;

        info!(email = %identity.email, uid = %identity.uid, "User registered");
        Ok(identity)
    }

    async fn verify(&self, token: &str) -> DomainResult<Identity> {
        let claims = verify_token(token, &self.jwt).map_err(|e| {
            debug!(error = %e, "Token rejected");
            DomainError::Auth("Invalid or expired token".into())
        })?;

        if self.revoked.contains_key(&claims.jti) {
            return Err(DomainError::Auth("Token has been revoked".into()));
        }

        Ok(Identity {
            uid: claims.sub,
            email: claims.email,
            display_name: claims.name,
        })
    }

    async fn sign_out(&self, token: &str) -> DomainResult<()> {
        match verify_token(token, &self.jwt) {
            Ok(claims) => {
                self.purge_expired_revocations();
                self.revoked.insert(claims.jti, claims.exp);
                debug!(uid = %claims.sub, "Token revoked");
            }
            // Nothing to revoke for a token that no longer verifies
            Err(e) => warn!(error = %e, "Sign-out with an unverifiable token"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryDocumentStore;
    use crate::domain::{FromDocument, UserRecord};

    fn provider() -> (Arc<InMemoryDocumentStore>, LocalCredentialProvider) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let jwt = JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "admin-dashboard".into(),
        };
        let provider = LocalCredentialProvider::new(store.clone(), jwt).with_bcrypt_cost(4);
        (store, provider)
    }

    #[tokio::test]
    async fn register_sign_in_verify() {
        let (store, provider) = provider();
        let identity = provider
            .register("Ada@Example.com", "secret1", Some("Ada"))
            .await
            .unwrap();

        let session = provider.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(session.identity, identity);
        assert_eq!(session.expires_in, 3600);

        let verified = provider.verify(&session.token).await.unwrap();
        assert_eq!(verified.uid, identity.uid);

        let profile = store
            .get(collections::USERS, &identity.uid)
            .await
            .unwrap()
            .unwrap();
        let user = UserRecord::from_document(&profile);
        assert_eq!(user.email, "Ada@Example.com");
        assert!(user.creation_time.is_some());
        assert!(!user.is_admin());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_auth_errors() {
        let (_, provider) = provider();
        provider.register("a@b.io", "secret1", None).await.unwrap();

        assert!(matches!(
            provider.sign_in("a@b.io", "nope-nope").await,
            Err(DomainError::Auth(_))
        ));
        assert!(matches!(
            provider.sign_in("x@b.io", "secret1").await,
            Err(DomainError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (_, provider) = provider();
        provider.register("a@b.io", "secret1", None).await.unwrap();
        let err = provider.register(" A@B.io ", "secret2", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn sign_out_revokes_token() {
        let (_, provider) = provider();
        provider.register("a@b.io", "secret1", None).await.unwrap();
        let session = provider.sign_in("a@b.io", "secret1").await.unwrap();

        provider.sign_out(&session.token).await.unwrap();
        assert!(matches!(
            provider.verify(&session.token).await,
            Err(DomainError::Auth(_))
        ));

        // a fresh sign-in gets a fresh token id
        let again = provider.sign_in("a@b.io", "secret1").await.unwrap();
        assert!(provider.verify(&again.token).await.is_ok());
    }

    #[tokio::test]
    async fn ensure_admin_sets_role_once() {
        let (store, provider) = provider();
        let first = provider
            .ensure_admin("root@example.com", "secret1", Some("Root"))
            .await
            .unwrap();
        let second = provider
            .ensure_admin("root@example.com", "ignored", None)
            .await
            .unwrap();
        assert_eq!(first.uid, second.uid);

        let doc = store
            .get(collections::USERS, &first.uid)
            .await
            .unwrap()
            .unwrap();
        assert!(UserRecord::from_document(&doc).is_admin());
    }
}
