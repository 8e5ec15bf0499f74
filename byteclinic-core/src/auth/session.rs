// byteclinic-core/src/auth/session.rs
//
// Session verification against the hosted auth provider. The provider
// issues opaque bearer tokens; all we consume is "is there a valid
// session and which user is it for".

use std::time::Duration;

use async_trait::async_trait;
use byteclinic_common::models::Caller;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::Error;

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Resolve a bearer token to a caller identity. An invalid or expired
    /// token is `Caller::Anonymous`, not an error; transport failures to
    /// the auth host are errors.
    async fn verify(&self, bearer_token: &str) -> Result<Caller, Error>;
}

/// Shape of the auth host's `GET /auth/v1/user` response; everything
/// beyond the user id is ignored.
#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: Uuid,
}

pub struct HostedAuthVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HostedAuthVerifier {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SessionVerifier for HostedAuthVerifier {
    async fn verify(&self, bearer_token: &str) -> Result<Caller, Error> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .header("apikey", &self.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            debug!("auth host rejected bearer token");
            return Ok(Caller::Anonymous);
        }

        let response = response.error_for_status()?;
        let user: AuthUserResponse = response.json().await?;
        Ok(Caller::Authenticated { user_id: user.id })
    }
}
