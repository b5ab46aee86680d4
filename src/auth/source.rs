//! IAM data source
//!
//! [`IamSource`] abstracts the four IAM endpoints the validator depends on
//! so tests can substitute canned data. [`HttpIamSource`] is the production
//! implementation over reqwest; it keeps the client-credentials token it
//! was granted and attaches it as a bearer to the authenticated endpoints.

use crate::config::IamConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Response body of the client-credentials grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientTokenGrant {
    pub access_token: String,

    #[serde(default)]
    pub expires_in: u64,
}

/// Bloom filter parameters for the revoked-token set, as published by IAM.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevokedTokenFilter {
    #[serde(default)]
    pub bits: Vec<u64>,

    #[serde(default)]
    pub k: u32,

    #[serde(default)]
    pub m: u64,
}

/// A user whose tokens issued before `revoked_at` are invalid.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokedUser {
    pub id: String,

    /// RFC 3339 timestamp, possibly with nanosecond precision
    pub revoked_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevocationList {
    #[serde(default)]
    pub revoked_tokens: RevokedTokenFilter,

    #[serde(default)]
    pub revoked_users: Vec<RevokedUser>,
}

/// An IAM role with the permissions it grants.
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    #[serde(alias = "roleId", default)]
    pub role_id: String,

    #[serde(default)]
    pub permissions: Vec<crate::auth::Permission>,
}

/// The IAM endpoints the token validator consumes.
#[async_trait]
pub trait IamSource: Send + Sync {
    /// Perform the client-credentials grant and retain the token for
    /// subsequent authenticated fetches.
    async fn grant_client_token(&self) -> Result<(), FetchError>;

    async fn fetch_jwks(&self) -> Result<JwkSet, FetchError>;

    async fn fetch_revocation_list(&self) -> Result<RevocationList, FetchError>;

    async fn fetch_role(&self, role_id: &str) -> Result<Role, FetchError>;
}

/// HTTP-backed [`IamSource`].
pub struct HttpIamSource {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<String>>,
}

impl HttpIamSource {
    pub fn new(config: &IamConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            token: RwLock::new(None),
        })
    }

    async fn bearer(&self) -> Result<String, FetchError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| FetchError::TokenGrant("no client token granted yet".to_string()))
    }
}

#[async_trait]
impl IamSource for HttpIamSource {
    async fn grant_client_token(&self) -> Result<(), FetchError> {
        let response = self
            .client
            .post(format!("{}/v3/oauth/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| FetchError::TokenGrant(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::TokenGrant(format!(
                "IAM returned {}",
                response.status()
            )));
        }

        let grant: ClientTokenGrant = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidTokenGrant(e.to_string()))?;
        if grant.access_token.is_empty() {
            return Err(FetchError::InvalidTokenGrant(
                "empty access token".to_string(),
            ));
        }

        debug!(expires_in = grant.expires_in, "client token granted");
        *self.token.write().await = Some(grant.access_token);
        Ok(())
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, FetchError> {
        let token = self.bearer().await?;
        let response = self
            .client
            .get(format!("{}/v3/oauth/jwks", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::Jwks(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Jwks(format!(
                "IAM returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Jwks(e.to_string()))
    }

    async fn fetch_revocation_list(&self) -> Result<RevocationList, FetchError> {
        let response = self
            .client
            .get(format!("{}/v3/admin/oauth/revocations", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .send()
            .await
            .map_err(|e| FetchError::RevocationList(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::RevocationList(format!(
                "IAM returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::RevocationList(e.to_string()))
    }

    async fn fetch_role(&self, role_id: &str) -> Result<Role, FetchError> {
        let token = self.bearer().await.map_err(|e| FetchError::Role {
            role_id: role_id.to_string(),
            reason: e.to_string(),
        })?;
        let response = self
            .client
            .get(format!("{}/v3/admin/roles/{}", self.base_url, role_id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::Role {
                role_id: role_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Role {
                role_id: role_id.to_string(),
                reason: format!("IAM returned {}", response.status()),
            });
        }

        response.json().await.map_err(|e| FetchError::Role {
            role_id: role_id.to_string(),
            reason: e.to_string(),
        })
    }
}
