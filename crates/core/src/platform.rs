// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform and authentication descriptors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// App JWTs are signed with a ten-minute expiry.
const JWT_LIFETIME_SECS: u64 = 600;

/// The kind of Git platform an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    Gitea,
    Github,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformType::Gitea => write!(f, "gitea"),
            PlatformType::Github => write!(f, "github"),
        }
    }
}

/// One Git platform from which repos are discovered, such as Gitea or GitHub.
///
/// `domain` is the bare host; the adapter derives its API base URL from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlatformConfig {
    #[serde(rename = "type")]
    pub platform_type: PlatformType,
    pub domain: String,

    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Regexes matched against `owner/name`; if non-empty, only matching
    /// repos are processed.
    #[serde(default)]
    pub repo_filters: Vec<String>,

    /// Skip repository discovery for this platform. The adapter is still
    /// initialised and registered so extended configs hosted here resolve.
    #[serde(default)]
    pub skip_discovery: bool,
}

/// How to authenticate with a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// A plain bearer token for a user or bot account.
    UserToken { token: String },

    /// A GitHub App: a JWT signed with the app's RSA key is exchanged for a
    /// short-lived installation access token.
    #[serde(rename_all = "camelCase")]
    App {
        client_id: String,
        #[serde(default)]
        private_key_string: Option<String>,
        #[serde(default)]
        private_key_file: Option<PathBuf>,
        installation_id: String,

        /// Minted during platform init and carried through the job envelope
        /// so in-sandbox stages don't need to re-exchange credentials.
        #[serde(default, rename = "doNotUse_installationToken")]
        installation_token: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth config is not an app config")]
    NotAnApp,
    #[error("app auth has neither a private key string nor a private key file")]
    MissingPrivateKey,
    #[error("error reading private key file: {0}")]
    ReadPrivateKey(#[from] std::io::Error),
    #[error("error signing JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Serialize)]
struct AppJwtClaims<'a> {
    iat: u64,
    exp: u64,
    iss: &'a str,
}

impl AuthConfig {
    /// The token used for API calls and clone auth, if one is available yet.
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthConfig::UserToken { token } => Some(token),
            AuthConfig::App { installation_token, .. } => installation_token.as_deref(),
        }
    }

    /// Read `private_key_file` into `private_key_string` so the config stays
    /// self-contained once serialised into a job envelope.
    pub fn load_private_key(&mut self) -> Result<(), AuthError> {
        let AuthConfig::App { private_key_string, private_key_file, .. } = self else {
            return Ok(());
        };

        if private_key_string.is_some() {
            return Ok(());
        }

        let Some(path) = private_key_file else {
            return Err(AuthError::MissingPrivateKey);
        };

        let pem = std::fs::read_to_string(path)?;
        *private_key_string = Some(pem);
        Ok(())
    }

    /// Sign an RS256 JWT for app-to-platform authentication.
    ///
    /// Claims are `{iat: now, exp: now + 600, iss: clientId}`.
    pub fn generate_jwt(&self) -> Result<String, AuthError> {
        let AuthConfig::App { client_id, private_key_string, private_key_file, .. } = self else {
            return Err(AuthError::NotAnApp);
        };

        let pem = match (private_key_string, private_key_file) {
            (Some(pem), _) => pem.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => return Err(AuthError::MissingPrivateKey),
        };

        let key = jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes())?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let claims = AppJwtClaims { iat: now, exp: now + JWT_LIFETIME_SECS, iss: client_id };

        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

/// Credentials matched by domain pattern, used for clone auth on domains
/// whose platform config carries no auth of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraAuth {
    pub domain_pattern: String,
    #[serde(flatten)]
    pub auth: AuthConfig,
}

/// The identity a platform adapter acts as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub email: String,
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
