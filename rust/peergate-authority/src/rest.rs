//! HTTP client for a remote signing authority.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::VerifyingKey;
use peergate_condition::{AccessControlCondition, Chain, ResourceDescriptor};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    AuthSignature, AuthorityError, SignedToken, SigningAuthority, TokenVerification, Wallet,
    unix_now,
};

/// Credential presented to the authority on every call.
#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// Anonymous access
    None,

    /// Sent as an `Authorization: Bearer` header
    Bearer(String),
}

/// Where and how [`RestAuthority`] reaches the signing authority
#[derive(Clone, Debug)]
pub struct RestAuthorityConfig {
    /// Root the `public-key`, `conditions` and `tokens` routes hang off
    pub endpoint: String,

    /// Credential presented with each call
    pub auth_method: AuthMethod,

    /// Per-call deadline in seconds, `None` for no deadline (default: 30)
    pub timeout_seconds: Option<u64>,

    /// Extra headers sent on each call, e.g. an API version
    pub headers: Vec<(String, String)>,
}

impl Default for RestAuthorityConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            auth_method: AuthMethod::None,
            timeout_seconds: Some(30),
            headers: Vec::new(),
        }
    }
}

impl RestAuthorityConfig {
    /// Talk to the authority rooted at `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Present `auth_method` on every call
    pub fn with_auth(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Give up on a call after `seconds`
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Send `key: value` on every call
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConditionRequest<'a> {
    access_control_conditions: &'a AccessControlCondition,
    chain: &'a Chain,
    auth_sig: &'a AuthSignature,
    resource_id: &'a ResourceDescriptor,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyResponse {
    public_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    jwt: String,
}

/// Signing authority reached over HTTP.
///
/// - `GET {endpoint}/public-key` - key tokens are signed with (fetched by `connect`)
/// - `POST {endpoint}/conditions` - register a condition for a resource
/// - `POST {endpoint}/tokens` - request a token for a resource
///
/// Auth messages are signed locally by the configured [`Wallet`] and tokens
/// are verified locally with the key fetched on connect.
///
/// ```no_run
/// use peergate_authority::{AuthMethod, Ed25519Wallet, RestAuthority, RestAuthorityConfig, SigningAuthority};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RestAuthorityConfig::new("https://authority.example.com/v1")
///     .with_auth(AuthMethod::Bearer("my-token".to_string()))
///     .with_timeout(10);
///
/// let authority = RestAuthority::new(config, Ed25519Wallet::generate("0xME"));
/// authority.connect().await?;
/// let auth = authority.sign_auth_message(&"rinkeby".into()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestAuthority<W> {
    config: RestAuthorityConfig,
    client: Client,
    wallet: W,
    verifying_key: Arc<RwLock<Option<VerifyingKey>>>,
}

impl<W> RestAuthority<W>
where
    W: Wallet,
{
    /// Create a REST authority client signing auth messages with `wallet`
    pub fn new(config: RestAuthorityConfig, wallet: W) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let client = client_builder.build().unwrap_or_else(|_| Client::new());

        Self {
            config,
            client,
            wallet,
            verifying_key: Arc::new(RwLock::new(None)),
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &RestAuthorityConfig {
        &self.config
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), route)
    }

    /// Attach the configured credential and headers
    fn build_request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder;

        match &self.config.auth_method {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                builder = builder.bearer_auth(token);
            }
        }

        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }

        builder
    }

    async fn post(
        &self,
        route: &str,
        body: &ConditionRequest<'_>,
    ) -> Result<reqwest::Response, AuthorityError> {
        let response = self
            .build_request(self.client.post(self.url(route)))
            .json(body)
            .send()
            .await
            .map_err(|error| AuthorityError::Network(error.to_string()))?;

        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AuthorityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthorityError::Rejected(format!("{status}: {body}"))
        }
        status if status.is_server_error() => AuthorityError::Network(format!("{status}: {body}")),
        status => AuthorityError::Rejected(format!("{status}: {body}")),
    })
}

#[async_trait]
impl<W> SigningAuthority for RestAuthority<W>
where
    W: Wallet,
{
    async fn connect(&self) -> Result<(), AuthorityError> {
        let response = self
            .build_request(self.client.get(self.url("public-key")))
            .send()
            .await
            .map_err(|error| AuthorityError::Network(error.to_string()))?;
        let response = check_status(response).await?;

        let PublicKeyResponse { public_key } = response
            .json()
            .await
            .map_err(|error| AuthorityError::Network(error.to_string()))?;
        let bytes: [u8; 32] = STANDARD
            .decode(&public_key)
            .map_err(|error| AuthorityError::Network(error.to_string()))?
            .try_into()
            .map_err(|_| AuthorityError::Network("authority key is not 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|error| AuthorityError::Network(error.to_string()))?;

        *self.verifying_key.write().await = Some(key);
        Ok(())
    }

    async fn sign_auth_message(&self, chain: &Chain) -> Result<AuthSignature, AuthorityError> {
        AuthSignature::sign(&self.wallet, chain, unix_now()).await
    }

    async fn register_condition(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<(), AuthorityError> {
        let body = ConditionRequest {
            access_control_conditions: condition,
            chain,
            auth_sig: auth,
            resource_id: resource,
        };
        self.post("conditions", &body).await?;
        Ok(())
    }

    async fn request_token(
        &self,
        condition: &AccessControlCondition,
        chain: &Chain,
        auth: &AuthSignature,
        resource: &ResourceDescriptor,
    ) -> Result<SignedToken, AuthorityError> {
        let body = ConditionRequest {
            access_control_conditions: condition,
            chain,
            auth_sig: auth,
            resource_id: resource,
        };
        let TokenResponse { jwt } = self
            .post("tokens", &body)
            .await?
            .json()
            .await
            .map_err(|error| AuthorityError::InvalidToken(error.to_string()))?;

        Ok(SignedToken::from(jwt))
    }

    async fn verify_token(&self, token: &SignedToken) -> Result<TokenVerification, AuthorityError> {
        let key = self
            .verifying_key
            .read()
            .await
            .clone()
            .ok_or(AuthorityError::NotConnected)?;
        Ok(TokenVerification::check(token, &key, unix_now()))
    }
}
