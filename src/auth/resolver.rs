use crate::auth::{AuthError, Credential};
use crate::types::{AuthMethod, TargetConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Turns a preprocessed target into a credential for the transport.
pub fn resolve(target: &TargetConfig) -> Result<Credential, AuthError> {
    if target.user.is_empty() {
        return Err(AuthError::MissingUsername);
    }

    let method = target
        .auth_method()
        .map_err(|e| AuthError::UnsupportedAuthMethod { method: e.0 })?;

    match method {
        // Empty passwords are a legitimate attempt.
        AuthMethod::Password => Ok(Credential::Password {
            user: target.user.clone(),
            password: target.auth.artifact.clone(),
        }),
        AuthMethod::Pki => {
            let key = load_private_key(Path::new(&target.auth.artifact))?;
            Ok(Credential::PublicKey {
                user: target.user.clone(),
                key: Arc::new(key),
            })
        }
    }
}

fn load_private_key(path: &Path) -> Result<russh_keys::key::KeyPair, AuthError> {
    let blob = std::fs::read(path).map_err(|source| AuthError::KeyReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(blob).map_err(|_| AuthError::KeyParseError {
        path: path.to_path_buf(),
        reason: "key file is not valid text".to_string(),
    })?;

    let key = russh_keys::decode_secret_key(&text, None).map_err(|e| {
        AuthError::KeyParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    debug!("Loaded private key {}", path.display());
    Ok(key)
}
