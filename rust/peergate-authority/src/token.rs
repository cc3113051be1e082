//! Compact EdDSA tokens issued by the signing authority.
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)`,
//! the signature covering the first two segments joined by a dot.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use peergate_condition::{Chain, ResourceDescriptor};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use signature::Signer;

use crate::AuthorityError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "EdDSA".into(),
            typ: "JWT".into(),
        }
    }
}

/// What a token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Authority that issued the token.
    pub iss: String,
    /// Wallet address the token was issued to.
    pub sub: String,
    /// Chain the condition was judged on.
    pub chain: Chain,
    /// Issue time, unix seconds.
    pub iat: u64,
    /// Expiry, unix seconds.
    pub exp: u64,
    /// Base URL of the resource.
    pub base_url: String,
    /// Path of the resource.
    pub path: String,
    /// Organisation of the resource.
    pub org_id: String,
    /// Role within the organisation.
    pub role: String,
    /// Opaque extra data of the resource.
    pub extra_data: String,
}

impl TokenClaims {
    /// Claims for a token scoped to `resource`.
    pub fn for_resource(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        chain: Chain,
        resource: &ResourceDescriptor,
        issued_at: u64,
        lifetime_secs: u64,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            chain,
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
            base_url: resource.base_url.clone(),
            path: resource.path.clone(),
            org_id: resource.org_id.clone(),
            role: resource.role.clone(),
            extra_data: resource.extra_data.clone(),
        }
    }

    /// Whether the claims name exactly this resource.
    pub fn matches_resource(&self, resource: &ResourceDescriptor) -> bool {
        self.base_url == resource.base_url
            && self.path == resource.path
            && self.org_id == resource.org_id
            && self.role == resource.role
            && self.extra_data == resource.extra_data
    }
}

/// Outcome of verifying a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerification {
    /// Signature valid and token not expired.
    pub verified: bool,
    /// Decoded claims, present only when verified.
    pub claims: Option<TokenClaims>,
}

impl TokenVerification {
    /// Verify `token` against the authority key at time `now`, folding every
    /// failure into `verified: false`.
    pub fn check(token: &SignedToken, key: &VerifyingKey, now: u64) -> Self {
        match token.verify(key, now) {
            Ok(claims) => Self {
                verified: true,
                claims: Some(claims),
            },
            Err(error) => {
                tracing::debug!(%error, "Token failed verification");
                Self {
                    verified: false,
                    claims: None,
                }
            }
        }
    }
}

/// A signed token in its compact text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Sign `claims` with the authority key.
    pub fn issue(claims: &TokenClaims, key: &SigningKey) -> Result<Self, AuthorityError> {
        let header = encode_segment(&TokenHeader::default())?;
        let claims = encode_segment(claims)?;
        let signing_input = format!("{header}.{claims}");
        let signature = key
            .try_sign(signing_input.as_bytes())
            .map_err(|error| AuthorityError::Signing(error.to_string()))?;

        Ok(Self(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )))
    }

    /// The compact text form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the signature and expiry, returning the claims.
    pub fn verify(&self, key: &VerifyingKey, now: u64) -> Result<TokenClaims, AuthorityError> {
        let (signing_input, signature) = self
            .0
            .rsplit_once('.')
            .ok_or_else(|| AuthorityError::InvalidToken("missing signature segment".into()))?;
        let (header, claims) = signing_input
            .split_once('.')
            .ok_or_else(|| AuthorityError::InvalidToken("missing claims segment".into()))?;

        let header: TokenHeader = decode_segment(header)?;
        if header.alg != "EdDSA" {
            return Err(AuthorityError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|error| AuthorityError::InvalidToken(error.to_string()))?;
        let signature = Signature::from_slice(&signature)
            .map_err(|error| AuthorityError::InvalidToken(error.to_string()))?;
        key.verify_strict(signing_input.as_bytes(), &signature)
            .map_err(|error| AuthorityError::InvalidToken(error.to_string()))?;

        let claims: TokenClaims = decode_segment(claims)?;
        if claims.exp <= now {
            return Err(AuthorityError::InvalidToken("token expired".into()));
        }

        Ok(claims)
    }
}

impl From<String> for SignedToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthorityError> {
    let json =
        serde_json::to_vec(value).map_err(|error| AuthorityError::Signing(error.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthorityError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|error| AuthorityError::InvalidToken(error.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|error| AuthorityError::InvalidToken(error.to_string()))
}
