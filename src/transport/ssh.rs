//! SSH transport built on russh.

use crate::auth::Credential;
use crate::transport::{Connection, SessionStdin, ShellSession, Transport, TransportError};
use crate::types::{HostKeyPolicy, OutputStreams};
use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_SSH_PORT: u16 = 22;

pub struct SshTransport {
    config: Arc<client::Config>,
    connect_timeout: Duration,
    host_keys: HostKeyPolicy,
}

impl SshTransport {
    pub fn new(connect_timeout: Duration, host_keys: HostKeyPolicy) -> Self {
        Self {
            config: Arc::new(client::Config::default()),
            connect_timeout,
            host_keys,
        }
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Connection = SshConnection;

    async fn dial(
        &self,
        host: &str,
        credential: &Credential,
    ) -> Result<SshConnection, TransportError> {
        let (name, port) = split_host_port(host);
        let handler = ClientHandler {
            host: name.to_string(),
            port,
            policy: self.host_keys,
        };

        let connect = async {
            let mut handle = client::connect(self.config.clone(), (name, port), handler).await?;
            let authenticated = match credential {
                Credential::Password { user, password } => {
                    handle.authenticate_password(user, password).await?
                }
                Credential::PublicKey { user, key } => {
                    handle.authenticate_publickey(user, key.clone()).await?
                }
            };

            if !authenticated {
                return Err(TransportError::AuthRejected {
                    user: credential.user().to_string(),
                    method: credential.kind().to_string(),
                });
            }
            Ok::<_, TransportError>(handle)
        };

        let handle = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                host: host.to_string(),
            })??;

        debug!("Authenticated to {} as {}", host, credential.user());
        Ok(SshConnection { handle })
    }
}

/// Splits `host:port`, falling back to port 22. Brackets around IPv6
/// literals are removed.
fn split_host_port(host: &str) -> (&str, u16) {
    if let Some((name, port)) = host.rsplit_once(':') {
        let bracketed = name.starts_with('[') && name.ends_with(']');
        if let Ok(port) = port.parse::<u16>() {
            if bracketed || !name.contains(':') {
                return (name.trim_start_matches('[').trim_end_matches(']'), port);
            }
        }
    }
    (host, DEFAULT_SSH_PORT)
}

struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::AcceptAny => Ok(true),
            HostKeyPolicy::KnownHosts => {
                match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
                    Ok(true) => Ok(true),
                    Ok(false) => {
                        warn!("No known_hosts entry for {}:{}", self.host, self.port);
                        Ok(false)
                    }
                    Err(e) => {
                        warn!("Host key check failed for {}:{}: {}", self.host, self.port, e);
                        Ok(false)
                    }
                }
            }
        }
    }
}

pub struct SshConnection {
    handle: Handle<ClientHandler>,
}

#[async_trait]
impl Connection for SshConnection {
    type Session = SshSession;

    async fn open_session(&mut self) -> Result<SshSession, TransportError> {
        let channel = self.handle.channel_open_session().await?;
        Ok(SshSession {
            channel: Arc::new(Mutex::new(channel)),
            output: OutputStreams::discard(),
            exit: None,
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }
}

/// One interactive shell channel. Stdin handles share the channel.
pub struct SshSession {
    channel: Arc<Mutex<Channel<Msg>>>,
    output: OutputStreams,
    /// Exit reported while still waiting on the shell request reply.
    exit: Option<ExitOutcome>,
}

type ExitOutcome = Result<(), TransportError>;

/// Copies remote output locally. Returns the exit outcome if `msg` carries one.
async fn forward(
    output: OutputStreams,
    msg: ChannelMsg,
) -> Result<Option<ExitOutcome>, TransportError> {
    match msg {
        ChannelMsg::Data { ref data } if output.stdout => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data[..]).await?;
            stdout.flush().await?;
        }
        // Extended data type 1 is stderr.
        ChannelMsg::ExtendedData { ref data, ext: 1 } if output.stderr => {
            let mut stderr = tokio::io::stderr();
            stderr.write_all(&data[..]).await?;
            stderr.flush().await?;
        }
        ChannelMsg::ExitStatus { exit_status } => {
            return Ok(Some(match exit_status {
                0 => Ok(()),
                code => Err(TransportError::ExitStatus(code)),
            }));
        }
        ChannelMsg::ExitSignal { signal_name, .. } => {
            return Ok(Some(Err(TransportError::ExitSignal(format!(
                "{signal_name:?}"
            )))));
        }
        _ => {}
    }
    Ok(None)
}

#[async_trait]
impl ShellSession for SshSession {
    type Stdin = SshStdin;

    fn attach_output(&mut self, output: OutputStreams) {
        self.output = output;
    }

    async fn stdin(&mut self) -> Result<SshStdin, TransportError> {
        Ok(SshStdin {
            channel: self.channel.clone(),
        })
    }

    /// Requests a shell and waits for the server to accept it.
    async fn start_shell(&mut self) -> Result<(), TransportError> {
        let channel = self.channel.clone();
        let mut channel = channel.lock().await;
        channel.request_shell(true).await?;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Success) => return Ok(()),
                Some(ChannelMsg::Failure) | Some(ChannelMsg::Close) | None => {
                    return Err(TransportError::Other("shell request refused".to_string()));
                }
                Some(msg) => {
                    if let Some(exit) = forward(self.output, msg).await? {
                        // Shell ran and exited before the reply arrived.
                        self.exit = Some(exit);
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn wait(&mut self) -> Result<(), TransportError> {
        let channel = self.channel.clone();
        let mut channel = channel.lock().await;
        let mut exit = self.exit.take();

        while let Some(msg) = channel.wait().await {
            if let Some(outcome) = forward(self.output, msg).await? {
                exit = Some(outcome);
            }
        }

        exit.unwrap_or(Err(TransportError::MissingExitStatus))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let channel = self.channel.lock().await;
        channel.close().await?;
        Ok(())
    }
}

pub struct SshStdin {
    channel: Arc<Mutex<Channel<Msg>>>,
}

#[async_trait]
impl SessionStdin for SshStdin {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let channel = self.channel.lock().await;
        channel.data(data).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let channel = self.channel.lock().await;
        channel.eof().await?;
        Ok(())
    }
}
