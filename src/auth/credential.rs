use russh_keys::key::KeyPair;
use std::fmt;
use std::sync::Arc;

/// Handshake material for one target, ready for the transport.
#[derive(Clone)]
pub enum Credential {
    Password { user: String, password: String },
    PublicKey { user: String, key: Arc<KeyPair> },
}

impl Credential {
    pub fn user(&self) -> &str {
        match self {
            Credential::Password { user, .. } | Credential::PublicKey { user, .. } => user,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Password { .. } => "password",
            Credential::PublicKey { .. } => "publickey",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind())
            .field("user", &self.user())
            .finish_non_exhaustive()
    }
}
