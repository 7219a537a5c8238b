use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One remote destination and how to authenticate against it.
///
/// ```json
/// {
///     "username": "bob",
///     "host": "myserver:22",
///     "auth": { "method": "pki", "artifact": "~/.ssh/id_ed25519" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(
        rename = "username",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub user: String,
    pub host: String,
    pub auth: AuthConfig,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub method: String,
    /// Password for `password`, private key path for `pki`.
    pub artifact: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let artifact = match self.method.parse::<AuthMethod>() {
            Ok(AuthMethod::Pki) => self.artifact.as_str(),
            _ => "<redacted>",
        };
        f.debug_struct("AuthConfig")
            .field("method", &self.method)
            .field("artifact", &artifact)
            .finish()
    }
}

impl TargetConfig {
    pub fn new(user: impl Into<String>, host: impl Into<String>, auth: AuthConfig) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            auth,
        }
    }

    pub fn auth_method(&self) -> Result<AuthMethod, UnknownAuthMethod> {
        self.auth.method.parse()
    }

    pub fn is_pki(&self) -> bool {
        matches!(self.auth_method(), Ok(AuthMethod::Pki))
    }
}

impl AuthConfig {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::Password.to_string(),
            artifact: password.into(),
        }
    }

    pub fn pki(key_path: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::Pki.to_string(),
            artifact: key_path.into(),
        }
    }
}

/// Authentication methods a target may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    Password,
    Pki,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown authentication method {0}")]
pub struct UnknownAuthMethod(pub String);

impl FromStr for AuthMethod {
    type Err = UnknownAuthMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(AuthMethod::Password),
            "pki" => Ok(AuthMethod::Pki),
            other => Err(UnknownAuthMethod(other.to_string())),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password => write!(f, "password"),
            AuthMethod::Pki => write!(f, "pki"),
        }
    }
}
