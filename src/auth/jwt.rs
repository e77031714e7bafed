use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{
        claims::{Claims, TokenKind},
        repo_types::{Role, User},
    },
    config::JwtConfig,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("wrong token type")]
    WrongType,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Identity proven by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Identity proven by a QR token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrIdentity {
    pub user_id: Uuid,
}

/// A verified token of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Session(SessionIdentity),
    Qr(QrIdentity),
}

/// Signs and verifies both token kinds with one process-wide secret.
///
/// There is no revocation list. A leaked QR token stays valid until it expires
/// and rotating `JWT_SECRET` invalidates every outstanding token at once.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    session_ttl: Duration,
    qr_ttl: Duration,
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl: Duration::days(cfg.session_ttl_days),
            qr_ttl: Duration::days(cfg.qr_ttl_days),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(user_id = %claims.sub, kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    fn claims_for(&self, user_id: Uuid, kind: TokenKind) -> Claims {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Session => self.session_ttl,
            TokenKind::Qr => self.qr_ttl,
        };
        Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            email: None,
            role: None,
        }
    }

    pub fn issue_session(&self, user: &User) -> Result<String, TokenError> {
        let claims = Claims {
            email: Some(user.email.clone()),
            role: Some(user.role),
            ..self.claims_for(user.id, TokenKind::Session)
        };
        self.sign(&claims)
    }

    pub fn issue_qr(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.sign(&self.claims_for(user_id, TokenKind::Qr))
    }

    /// Decodes a token of either kind.
    pub fn verify(&self, token: &str) -> Result<Token, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        let claims = data.claims;
        debug!(user_id = %claims.sub, kind = ?claims.kind, "jwt verified");

        match claims.kind {
            TokenKind::Session => match (claims.email, claims.role) {
                (Some(email), Some(role)) => Ok(Token::Session(SessionIdentity {
                    user_id: claims.sub,
                    email,
                    role,
                })),
                _ => Err(TokenError::Invalid),
            },
            TokenKind::Qr => Ok(Token::Qr(QrIdentity {
                user_id: claims.sub,
            })),
        }
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionIdentity, TokenError> {
        match self.verify(token)? {
            Token::Session(identity) => Ok(identity),
            Token::Qr(_) => Err(TokenError::WrongType),
        }
    }

    pub fn verify_qr(&self, token: &str) -> Result<QrIdentity, TokenError> {
        match self.verify(token)? {
            Token::Qr(identity) => Ok(identity),
            Token::Session(_) => Err(TokenError::WrongType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn make_issuer(secret: &str, issuer: &str, audience: &str) -> TokenIssuer {
        let mut cfg = AppConfig::with_secret(secret).jwt;
        cfg.issuer = issuer.into();
        cfg.audience = audience.into();
        TokenIssuer::new(&cfg)
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: None,
            username: "a".into(),
            role,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn session_token_carries_identity_and_role() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let admin = user(Role::Admin);
        let token = issuer.issue_session(&admin).expect("sign session");
        let identity = issuer.verify_session(&token).expect("verify session");
        assert_eq!(identity.user_id, admin.id);
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn qr_token_roundtrip() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let user_id = Uuid::new_v4();
        let token = issuer.issue_qr(user_id).expect("sign qr");
        assert_eq!(issuer.verify_qr(&token).expect("verify qr").user_id, user_id);
        assert_eq!(
            issuer.verify(&token).expect("verify"),
            Token::Qr(QrIdentity { user_id })
        );
    }

    #[test]
    fn session_token_is_not_a_qr_token() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let token = issuer.issue_session(&user(Role::Client)).expect("sign session");
        assert!(matches!(issuer.verify_qr(&token), Err(TokenError::WrongType)));
    }

    #[test]
    fn qr_token_is_not_a_session_token() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let token = issuer.issue_qr(Uuid::new_v4()).expect("sign qr");
        assert!(matches!(
            issuer.verify_session(&token),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let mut claims = issuer.claims_for(Uuid::new_v4(), TokenKind::Qr);
        claims.iat -= 3600 * 24;
        claims.exp = claims.iat + 60;
        let token = issuer.sign(&claims).expect("sign");
        assert!(matches!(issuer.verify_qr(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn rejects_wrong_secret_issuer_or_audience() {
        let good = make_issuer("same-secret", "good-iss", "good-aud");
        let token = good.issue_qr(Uuid::new_v4()).expect("sign qr");

        let other_secret = make_issuer("other-secret", "good-iss", "good-aud");
        assert!(matches!(other_secret.verify(&token), Err(TokenError::Invalid)));

        let other_claims = make_issuer("same-secret", "bad-iss", "bad-aud");
        assert!(matches!(other_claims.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn session_claims_without_identity_are_invalid() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let claims = issuer.claims_for(Uuid::new_v4(), TokenKind::Session);
        let token = issuer.sign(&claims).expect("sign");
        assert!(matches!(issuer.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Invalid)));
    }
}
