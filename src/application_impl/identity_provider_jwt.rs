use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityClaims {
    sub: String, // user id
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

fn encode_claims(claims: &IdentityClaims, cfg: &JwtConfig) -> Result<String, IdentityError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| IdentityError::Internal(e.to_string()))
}

fn decode_claims(token: &str, cfg: &JwtConfig) -> Result<IdentityClaims, IdentityError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<IdentityClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
            _ => IdentityError::TokenInvalid,
        })?;
    Ok(data.claims)
}

/// HS256 bearer-token identity. The held token is re-validated on every
/// lookup, so an expired session stops yielding an actor on its own.
pub struct JwtIdentityProvider {
    cfg: JwtConfig,
    token: RwLock<Option<String>>,
}

impl JwtIdentityProvider {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtIdentityProvider {
            cfg,
            token: RwLock::new(None),
        }
    }

    pub fn issue_token(&self, user: &UserId) -> Result<(String, DateTime<Utc>), IdentityError> {
        let ttl = chrono::Duration::from_std(self.cfg.token_ttl)
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        let iat_dt = Utc::now();
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| IdentityError::Internal("token expiry out of range".to_string()))?;
        let claims = IdentityClaims {
            sub: user.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let token = encode_claims(&claims, &self.cfg)?;
        Ok((token, exp_dt))
    }

    pub fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        let claims = decode_claims(token, &self.cfg)?;
        let user = UserId(claims.sub);
        if user.is_blank() {
            return Err(IdentityError::TokenInvalid);
        }
        Ok(user)
    }

    pub fn sign_in_with_token(&self, token: &str) -> Result<UserId, IdentityError> {
        let user = self.verify(token)?;
        let mut held = self
            .token
            .write()
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        *held = Some(token.to_owned());
        Ok(user)
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn current_actor_id(&self) -> Option<UserId> {
        let held = self.token.read().ok()?;
        let token = held.as_deref()?;
        match self.verify(token) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("session token rejected: {e}");
                None
            }
        }
    }
}

impl Session for JwtIdentityProvider {
    fn sign_in(&self, user: &UserId) -> Result<(), IdentityError> {
        let (token, _) = self.issue_token(user)?;
        self.sign_in_with_token(&token)?;
        Ok(())
    }

    fn sign_out(&self) {
        if let Ok(mut held) = self.token.write() {
            *held = None;
        }
    }
}
