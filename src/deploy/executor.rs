use crate::auth::Credential;
use crate::deploy::{ExecError, Result};
use crate::transport::{Connection, SessionStdin, ShellSession, Transport, TransportError};
use crate::types::OutputStreams;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs a script in an interactive shell on one host.
///
/// Each call owns its connection, session and stdin handle. They are released
/// in reverse order of acquisition whether the run succeeds, fails or is
/// stopped, and a failure to release never masks the result of the run itself.
pub struct RemoteExecutor<T: Transport> {
    transport: T,
    output: OutputStreams,
}

impl<T: Transport> RemoteExecutor<T> {
    pub fn new(transport: T, output: OutputStreams) -> Self {
        Self { transport, output }
    }

    /// Runs `script` on `host`. Cancelling `stop` interrupts whichever step is
    /// in progress; everything already acquired is still closed.
    pub async fn run(
        &self,
        host: &str,
        credential: &Credential,
        script: &[u8],
        stop: &CancellationToken,
    ) -> Result<()> {
        let mut connection = interruptible(stop, async {
            self.transport
                .dial(host, credential)
                .await
                .map_err(ExecError::DialFailed)
        })
        .await?;

        let result = self.run_session(&mut connection, host, script, stop).await;
        release(host, "connection", connection.close().await);
        result
    }

    async fn run_session(
        &self,
        connection: &mut T::Connection,
        host: &str,
        script: &[u8],
        stop: &CancellationToken,
    ) -> Result<()> {
        let mut session = interruptible(stop, async {
            connection
                .open_session()
                .await
                .map_err(ExecError::SessionFailed)
        })
        .await?;
        session.attach_output(self.output);

        let result = run_shell(&mut session, host, script, stop).await;
        release(host, "session", session.close().await);
        result
    }
}

async fn run_shell<S: ShellSession>(
    session: &mut S,
    host: &str,
    script: &[u8],
    stop: &CancellationToken,
) -> Result<()> {
    let mut stdin = interruptible(stop, async {
        session.stdin().await.map_err(ExecError::StdinSetupFailed)
    })
    .await?;

    let fed = interruptible(stop, feed(session, &mut stdin, script)).await;
    let closed = stdin.close().await;
    match fed {
        Ok(()) => closed.map_err(ExecError::StdinCloseFailed)?,
        Err(e) => {
            release(host, "stdin", closed);
            return Err(e);
        }
    }

    debug!("Script sent to {}, waiting for shell to exit", host);
    interruptible(stop, async {
        session.wait().await.map_err(ExecError::SessionWaitFailed)
    })
    .await
}

async fn feed<S: ShellSession>(
    session: &mut S,
    stdin: &mut S::Stdin,
    script: &[u8],
) -> Result<()> {
    session
        .start_shell()
        .await
        .map_err(ExecError::ShellStartFailed)?;
    stdin
        .write_all(script)
        .await
        .map_err(ExecError::ScriptWriteFailed)
}

async fn interruptible<T>(
    stop: &CancellationToken,
    step: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = stop.cancelled() => Err(ExecError::Interrupted),
        result = step => result,
    }
}

fn release(host: &str, resource: &str, result: std::result::Result<(), TransportError>) {
    if let Err(e) = result {
        debug!("Failed to close {} for {}: {}", resource, host, e);
    }
}
