use axum::http::HeaderMap;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// How long a fetched JWK set is trusted before it is fetched again.
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid JWK certs url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("missing Authorization header")]
    MissingToken,

    #[error("invalid Authorization header")]
    MalformedHeader,

    #[error("JWT header missing kid")]
    MissingKeyId,

    #[error("no matching JWK for kid '{0}'")]
    UnknownKey(String),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("can't fetch JWK set: {0}")]
    KeySet(#[from] reqwest::Error),
}

impl AuthError {
    /// Whether the error comes from the request rather than from the key
    /// endpoint.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::KeySet(_) | AuthError::InvalidUrl { .. })
    }
}

/// Claims of a validated access token, kept in the request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Validates bearer tokens against the keys published at a JWK endpoint.
///
/// The key set is cached for `key_set_ttl`. A token whose `kid` is not in the
/// cached set forces a refetch, so rotated keys are picked up right away.
#[derive(Clone)]
pub struct AuthService {
    jwk_certs_url: Url,
    client: Client,
    key_set: Arc<RwLock<Option<CachedKeySet>>>,
    key_set_ttl: Duration,
}

impl AuthService {
    pub fn new(jwk_certs_url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(jwk_certs_url).map_err(|source| AuthError::InvalidUrl {
            url: jwk_certs_url.to_string(),
            source,
        })?;

        Ok(Self {
            jwk_certs_url: url,
            client: Client::new(),
            key_set: Arc::new(RwLock::new(None)),
            key_set_ttl: DEFAULT_KEY_SET_TTL,
        })
    }

    pub fn with_key_set_ttl(mut self, ttl: Duration) -> Self {
        self.key_set_ttl = ttl;
        self
    }

    pub fn jwk_certs_url(&self) -> &Url {
        &self.jwk_certs_url
    }

    pub async fn fetch_key_set(&self) -> Result<JwkSet, AuthError> {
        let key_set = self
            .client
            .get(self.jwk_certs_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(key_set)
    }

    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let decoding_key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        // Audience differs between issuers (string, array or "account")
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        tracing::debug!("JWT claims validated: sub={:?}", token_data.claims.sub);

        Ok(token_data.claims)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(cached) = self.key_set.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.key_set_ttl {
                if let Some(jwk) = cached.keys.find(kid) {
                    return Ok(DecodingKey::from_jwk(jwk)?);
                }
            }
        }

        tracing::debug!("Fetching JWK set for kid '{}'", kid);
        let keys = self.fetch_key_set().await?;
        let key = match keys.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk).map_err(AuthError::from),
            None => Err(AuthError::UnknownKey(kid.to_string())),
        };

        *self.key_set.write().await = Some(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
        });
        key
    }

    pub fn extract_token_from_headers(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let auth_header = headers
            .get("Authorization")
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        Ok(token.to_string())
    }
}
