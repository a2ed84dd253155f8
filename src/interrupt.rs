//! Ctrl-C handling for the session.
//!
//! Once a listener is installed, SIGINT (or a console Ctrl-C on Windows) no
//! longer terminates the process. It is delivered to whichever await is
//! currently racing `recv`.

#[cfg(unix)]
type Listener = tokio::signal::unix::Signal;

#[cfg(windows)]
type Listener = tokio::signal::windows::CtrlC;

#[derive(Default)]
pub struct InterruptListener {
    listener: Option<Listener>,
}

impl InterruptListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening. Must run inside the tokio runtime; repeated calls are no-ops.
    pub fn install(&mut self) -> std::io::Result<()> {
        if self.listener.is_none() {
            self.listener = Some(listen()?);
        }
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.listener.is_some()
    }

    /// Resolve on the next interrupt. Never resolves if listening is unavailable.
    pub async fn recv(&mut self) {
        if self.install().is_err() {
            return std::future::pending().await;
        }
        match self.listener.as_mut() {
            Some(listener) => {
                if listener.recv().await.is_none() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending().await,
        }
    }

    /// Drop an interrupt that arrived while nothing was waiting for one
    pub async fn clear(&mut self) {
        tokio::select! {
            biased;
            _ = self.recv() => {}
            _ = std::future::ready(()) => {}
        }
    }
}

#[cfg(unix)]
fn listen() -> std::io::Result<Listener> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn listen() -> std::io::Result<Listener> {
    tokio::signal::windows::ctrl_c()
}
