//! Remote shell transport.
//!
//! The executor only needs a handful of operations from a transport: dial and
//! authenticate, open a session, get a stdin handle, start a shell, write,
//! close stdin, and wait for the shell to exit. These traits describe exactly
//! that, so the executor can be driven by SSH in production and by
//! [`MockTransport`] in tests.

pub mod error;
pub mod mock;
pub mod ssh;

pub use error::TransportError;
pub use mock::{FailAt, MockTransport};
pub use ssh::SshTransport;

use crate::auth::Credential;
use crate::types::OutputStreams;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Connects to `host` (`host:port`) and authenticates with `credential`.
    async fn dial(
        &self,
        host: &str,
        credential: &Credential,
    ) -> Result<Self::Connection, TransportError>;
}

#[async_trait]
pub trait Connection: Send {
    type Session: ShellSession;

    async fn open_session(&mut self) -> Result<Self::Session, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait ShellSession: Send {
    type Stdin: SessionStdin;

    /// Selects which remote streams are copied locally while waiting.
    fn attach_output(&mut self, output: OutputStreams);

    async fn stdin(&mut self) -> Result<Self::Stdin, TransportError>;

    /// Returns once the remote side has accepted the shell request.
    async fn start_shell(&mut self) -> Result<(), TransportError>;

    /// Blocks until the remote shell exits. A non-zero exit is an error.
    async fn wait(&mut self) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait SessionStdin: Send {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Signals end of input to the remote shell.
    async fn close(&mut self) -> Result<(), TransportError>;
}
