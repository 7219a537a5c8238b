//! In-memory transport for tests and rehearsals.
//!
//! Records what each host received and the order resources were released, and
//! can be told to fail any step for a given host.

use crate::auth::Credential;
use crate::transport::{Connection, SessionStdin, ShellSession, Transport, TransportError};
use crate::types::OutputStreams;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Step at which a mocked host fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Dial,
    Session,
    Stdin,
    Shell,
    Write,
    CloseStdin,
    /// Shell exits with the given non-zero status.
    Exit(u32),
    /// Shell never exits.
    Hang,
}

#[derive(Default)]
struct MockState {
    failures: HashMap<String, FailAt>,
    delay: Option<Duration>,
    dials: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    received: Mutex<HashMap<String, Vec<u8>>>,
    events: Mutex<Vec<(String, &'static str)>>,
    users: Mutex<HashMap<String, String>>,
}

impl MockState {
    fn fails_at(&self, host: &str, step: FailAt) -> bool {
        self.failures.get(host) == Some(&step)
    }

    fn record(&self, host: &str, event: &'static str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((host.to_string(), event));
        }
    }

    fn failure(&self, host: &str, step: &str) -> TransportError {
        TransportError::Other(format!("mock {step} failure on {host}"))
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `host` fail at `step`. Must be configured before the transport is shared.
    pub fn fail(mut self, host: impl Into<String>, step: FailAt) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            state.failures.insert(host.into(), step);
        }
        self
    }

    /// Simulated remote run time, applied while waiting for the shell.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            state.delay = Some(delay);
        }
        self
    }

    /// Bytes the remote shell on `host` received on stdin.
    pub fn received(&self, host: &str) -> Option<Vec<u8>> {
        self.state
            .received
            .lock()
            .ok()
            .and_then(|received| received.get(host).cloned())
    }

    /// User that authenticated against `host`.
    pub fn user_for(&self, host: &str) -> Option<String> {
        self.state
            .users
            .lock()
            .ok()
            .and_then(|users| users.get(host).cloned())
    }

    /// Lifecycle events recorded for `host`, in order.
    pub fn events(&self, host: &str) -> Vec<&'static str> {
        self.state
            .events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|(h, _)| h == host)
                    .map(|(_, e)| *e)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dial_count(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open connections seen.
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn dial(
        &self,
        host: &str,
        credential: &Credential,
    ) -> Result<MockConnection, TransportError> {
        self.state.dials.fetch_add(1, Ordering::SeqCst);
        if self.state.fails_at(host, FailAt::Dial) {
            return Err(self.state.failure(host, "dial"));
        }

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut users) = self.state.users.lock() {
            users.insert(host.to_string(), credential.user().to_string());
        }
        self.state.record(host, "dial");

        Ok(MockConnection {
            host: host.to_string(),
            state: self.state.clone(),
        })
    }
}

pub struct MockConnection {
    host: String,
    state: Arc<MockState>,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for MockConnection {
    type Session = MockSession;

    async fn open_session(&mut self) -> Result<MockSession, TransportError> {
        if self.state.fails_at(&self.host, FailAt::Session) {
            return Err(self.state.failure(&self.host, "session"));
        }
        self.state.record(&self.host, "session");
        Ok(MockSession {
            host: self.host.clone(),
            state: self.state.clone(),
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.record(&self.host, "close connection");
        Ok(())
    }
}

pub struct MockSession {
    host: String,
    state: Arc<MockState>,
}

#[async_trait]
impl ShellSession for MockSession {
    type Stdin = MockStdin;

    fn attach_output(&mut self, output: OutputStreams) {
        if output.any() {
            self.state.record(&self.host, "attach output");
        }
    }

    async fn stdin(&mut self) -> Result<MockStdin, TransportError> {
        if self.state.fails_at(&self.host, FailAt::Stdin) {
            return Err(self.state.failure(&self.host, "stdin"));
        }
        self.state.record(&self.host, "stdin");
        Ok(MockStdin {
            host: self.host.clone(),
            state: self.state.clone(),
            buffer: Vec::new(),
        })
    }

    async fn start_shell(&mut self) -> Result<(), TransportError> {
        if self.state.fails_at(&self.host, FailAt::Shell) {
            return Err(self.state.failure(&self.host, "shell"));
        }
        self.state.record(&self.host, "shell");
        Ok(())
    }

    async fn wait(&mut self) -> Result<(), TransportError> {
        if self.state.fails_at(&self.host, FailAt::Hang) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.state.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(FailAt::Exit(code)) = self.state.failures.get(&self.host) {
            return Err(TransportError::ExitStatus(*code));
        }
        self.state.record(&self.host, "wait");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.record(&self.host, "close session");
        Ok(())
    }
}

pub struct MockStdin {
    host: String,
    state: Arc<MockState>,
    buffer: Vec<u8>,
}

#[async_trait]
impl SessionStdin for MockStdin {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.state.fails_at(&self.host, FailAt::Write) {
            return Err(self.state.failure(&self.host, "write"));
        }
        self.buffer.extend_from_slice(data);
        self.state.record(&self.host, "write");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.record(&self.host, "close stdin");
        if self.state.fails_at(&self.host, FailAt::CloseStdin) {
            return Err(self.state.failure(&self.host, "close stdin"));
        }
        if let Ok(mut received) = self.state.received.lock() {
            received.insert(self.host.clone(), std::mem::take(&mut self.buffer));
        }
        Ok(())
    }
}
