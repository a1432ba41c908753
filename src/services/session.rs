use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;

use crate::{
    config::AuthConfig,
    dto::auth::{Claims, SessionUser, SessionView, SignedInUser},
    error::{AppError, AppResult},
};

/// Signs and verifies stateless session tokens. Nothing is stored server side.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
}

impl SessionKeys {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.session_secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            max_age: Duration::days(config.session_max_age_days),
        }
    }

    /// Issue a token for a freshly authenticated user.
    pub fn mint(&self, user: &SignedInUser) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            role: if user.role.is_empty() {
                "user".into()
            } else {
                user.role.clone()
            },
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.image.clone(),
            iat: now.timestamp(),
            exp: Some((now + self.max_age).timestamp()),
        };
        self.sign(&claims)
    }

    /// Extend an existing session. Identity claims are copied as they are.
    pub fn refresh(&self, claims: &Claims) -> AppResult<String> {
        let now = Utc::now();
        let refreshed = Claims {
            iat: now.timestamp(),
            exp: Some((now + self.max_age).timestamp()),
            ..claims.clone()
        };
        self.sign(&refreshed)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        let decoded = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AppError::Unauthenticated)?;
        Ok(decoded.claims)
    }

    /// Public view of a session, with the expiry as an absolute timestamp.
    pub fn materialize(&self, claims: &Claims) -> SessionView {
        let expires = claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
            .unwrap_or_else(|| Utc::now() + self.max_age);

        SessionView {
            user: SessionUser {
                id: claims.sub.clone(),
                role: claims.role.clone(),
                name: non_empty(&claims.name),
                email: claims.email.clone(),
                image: non_empty(&claims.picture),
            },
            expires,
        }
    }

    fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::new(&AuthConfig {
            admin_emails: vec![],
            session_secret: SecretString::from(secret.to_string()),
            session_max_age_days: 30,
            google_client_id: String::new(),
        })
    }

    fn user() -> SignedInUser {
        SignedInUser {
            id: Uuid::new_v4(),
            email: "ana@shop.com".into(),
            name: "Ana".into(),
            role: "admin".into(),
            image: String::new(),
        }
    }

    #[test]
    fn minted_token_round_trips_identity() {
        let keys = keys("s3cr3t-value");
        let user = user();
        let token = keys.mint(&user).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.email, "ana@shop.com");
        let exp = claims.exp.unwrap();
        let expected = (Utc::now() + Duration::days(30)).timestamp();
        assert!((exp - expected).abs() < 5);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = keys("first-secret").mint(&user()).unwrap();
        assert!(matches!(
            keys("second-secret").verify(&token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("s3cr3t-value");
        let mut claims = keys.verify(&keys.mint(&user()).unwrap()).unwrap();
        claims.exp = Some((Utc::now() - Duration::days(1)).timestamp());
        let token = keys.sign(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn refresh_keeps_identity_claims() {
        let keys = keys("s3cr3t-value");
        let mut claims = keys.verify(&keys.mint(&user()).unwrap()).unwrap();
        // a stale role stays stale: refresh never consults the store
        claims.role = "user".into();
        claims.exp = Some(Utc::now().timestamp() + 60);

        let refreshed = keys.verify(&keys.refresh(&claims).unwrap()).unwrap();
        assert_eq!(refreshed.sub, claims.sub);
        assert_eq!(refreshed.role, "user");
        assert_eq!(refreshed.name, claims.name);
        assert!(refreshed.exp.unwrap() > claims.exp.unwrap());
    }

    #[test]
    fn materialize_defaults_expiry_and_drops_empty_fields() {
        let keys = keys("s3cr3t-value");
        let claims = Claims {
            sub: "abc".into(),
            role: "user".into(),
            name: String::new(),
            email: "bo@shop.com".into(),
            picture: String::new(),
            iat: Utc::now().timestamp(),
            exp: None,
        };
        let view = keys.materialize(&claims);
        assert_eq!(view.user.name, None);
        assert_eq!(view.user.image, None);
        let expected = Utc::now() + Duration::days(30);
        assert!((view.expires - expected).num_seconds().abs() < 5);
    }

    #[test]
    fn materialize_uses_embedded_expiry() {
        let keys = keys("s3cr3t-value");
        let claims = Claims {
            sub: "abc".into(),
            role: "user".into(),
            name: "Bo".into(),
            email: "bo@shop.com".into(),
            picture: "https://cdn/bo.png".into(),
            iat: 0,
            exp: Some(1_700_000_000),
        };
        let view = keys.materialize(&claims);
        assert_eq!(view.expires.timestamp(), 1_700_000_000);
        assert_eq!(view.user.name.as_deref(), Some("Bo"));
        assert_eq!(view.user.image.as_deref(), Some("https://cdn/bo.png"));
    }
}
