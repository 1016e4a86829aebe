//! JWT service for token generation and validation
//!
//! Tokens are signed either with RS256 (PEM key pair) or HS256 (shared
//! secret), chosen once at startup from the environment.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::{Role, User};

/// Default token lifetime: 24 hours
const DEFAULT_EXPIRY_SECONDS: u64 = 86_400;

/// Key material used to sign and verify tokens
#[derive(Debug, Clone)]
pub enum SigningKey {
    /// HS256 shared secret
    Secret(String),
    /// RS256 key pair in PEM format
    Rsa {
        private_key: String,
        public_key: String,
    },
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing key material
    pub signing_key: SigningKey,
    /// Token expiration time in seconds (default: 24 hours)
    pub expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY` / `JWT_PUBLIC_KEY`: RSA keys (PEM text or file path); selects RS256
    /// - `JWT_SECRET`: shared secret; selects HS256 when no RSA keys are set
    /// - `JWT_EXPIRY`: token expiry in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY").ok();
        let public_key = std::env::var("JWT_PUBLIC_KEY").ok();

        let signing_key = match (private_key, public_key) {
            (Some(private_key), Some(public_key)) => SigningKey::Rsa {
                private_key: read_key(&private_key)?,
                public_key: read_key(&public_key)?,
            },
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("JWT_PRIVATE_KEY and JWT_PUBLIC_KEY must be set together")
            }
            (None, None) => {
                let secret = std::env::var("JWT_SECRET").map_err(|_| {
                    anyhow::anyhow!("Neither JWT_SECRET nor JWT_PRIVATE_KEY/JWT_PUBLIC_KEY is set")
                })?;
                if secret.is_empty() {
                    anyhow::bail!("JWT_SECRET must not be empty");
                }
                SigningKey::Secret(secret)
            }
        };

        let expiry = std::env::var("JWT_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EXPIRY_SECONDS);

        Ok(JwtConfig {
            signing_key,
            expiry,
        })
    }

    /// HS256 configuration with the given secret
    pub fn with_secret(secret: impl Into<String>, expiry: u64) -> Self {
        Self {
            signing_key: SigningKey::Secret(secret.into()),
            expiry,
        }
    }
}

/// Read a key given either as PEM text or as a path to a PEM file
fn read_key(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .map(|key| key.trim().to_string())
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Unique token id
    pub jti: Uuid,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let (algorithm, encoding_key, decoding_key) = match &config.signing_key {
            SigningKey::Secret(secret) => (
                Algorithm::HS256,
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
            SigningKey::Rsa {
                private_key,
                public_key,
            } => (
                Algorithm::RS256,
                EncodingKey::from_rsa_pem(private_key.as_bytes())?,
                DecodingKey::from_rsa_pem(public_key.as_bytes())?,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
            expiry: config.expiry,
        })
    }

    /// Generate a signed token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.expiry),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
