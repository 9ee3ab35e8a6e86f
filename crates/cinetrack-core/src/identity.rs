use chrono::{Duration, Utc};
use cinetrack_models::{NewUser, UserProfile};
use cinetrack_sources::{PersistenceStore, StoreError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const SESSION_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("sign-in failed: {0}")]
    Store(#[from] StoreError),
    #[error("invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("email is required to sign in")]
    MissingEmail,
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // store user id
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub exp: usize,
}

/// The signed-in viewer as carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            image: claims.image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: UserProfile,
    pub token: String,
}

/// Find or provision the user for a verified identity, then issue a session
///
/// `store` must carry the privileged key: provisioning runs before any
/// viewer-scoped policy can match.
pub async fn sign_in(
    store: &dyn PersistenceStore,
    secret: &str,
    email: &str,
    name: Option<String>,
    image: Option<String>,
) -> Result<SignedIn, IdentityError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(IdentityError::MissingEmail);
    }

    let user = match store.find_user_by_email(email).await? {
        Some(user) => user,
        None => {
            let user = store
                .insert_user(&NewUser {
                    email: email.to_string(),
                    name,
                    image,
                })
                .await?;
            info!("Created user {} on first sign-in", user.id);
            user
        }
    };

    let token = issue_token(&user, secret)?;
    Ok(SignedIn { user, token })
}

pub fn issue_token(user: &UserProfile, secret: &str) -> Result<String, IdentityError> {
    let expiration = (Utc::now() + Duration::days(SESSION_DAYS)).timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        image: user.image.clone(),
        exp: expiration as usize,
    };
    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))?)
}

pub fn verify_session(token: &str, secret: &str) -> Result<Session, IdentityError> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())?;
    Ok(data.claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinetrack_sources::MemoryStore;

    const SECRET: &str = "test-session-secret";

    #[tokio::test]
    async fn test_first_sign_in_provisions_user_once() {
        let store = MemoryStore::new();

        let first = sign_in(&store, SECRET, "ann@example.com", Some("Ann".to_string()), None)
            .await
            .unwrap();
        let second = sign_in(&store, SECRET, " ann@example.com ", None, None).await.unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(second.user.name.as_deref(), Some("Ann"));

        let session = verify_session(&second.token, SECRET).unwrap();
        assert_eq!(session.user_id, first.user.id);
        assert_eq!(session.email, "ann@example.com");
        assert_eq!(session.name.as_deref(), Some("Ann"));
        assert_eq!(session.image, None);
    }

    #[tokio::test]
    async fn test_store_failure_fails_sign_in() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = sign_in(&store, SECRET, "ann@example.com", None, None).await.unwrap_err();
        assert!(matches!(err, IdentityError::Store(_)));
    }

    #[tokio::test]
    async fn test_empty_email_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            sign_in(&store, SECRET, "  ", None, None).await,
            Err(IdentityError::MissingEmail)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let user = UserProfile {
            id: "u1".to_string(),
            email: "ann@example.com".to_string(),
            name: None,
            image: None,
        };
        let token = issue_token(&user, "other-secret").unwrap();
        assert!(matches!(verify_session(&token, SECRET), Err(IdentityError::Token(_))));
    }
}
