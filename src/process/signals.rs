//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for the signals a supervisor sends (SIGTERM, SIGINT, SIGHUP, ...)
//! - Relay them to the running child
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - One listener lives for the whole startup sequence, so a signal that
//!   lands between two children is still seen; after `exec` the server's
//!   own handlers take over
//! - Only termination signals abort startup; the others are relayed

use std::io;

/// Signals the bootstrap relays to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardedSignal {
    Terminate,
    Interrupt,
    Hangup,
    Quit,
    User1,
    User2,
}

impl ForwardedSignal {
    pub const ALL: [ForwardedSignal; 6] = [
        ForwardedSignal::Terminate,
        ForwardedSignal::Interrupt,
        ForwardedSignal::Hangup,
        ForwardedSignal::Quit,
        ForwardedSignal::User1,
        ForwardedSignal::User2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ForwardedSignal::Terminate => "SIGTERM",
            ForwardedSignal::Interrupt => "SIGINT",
            ForwardedSignal::Hangup => "SIGHUP",
            ForwardedSignal::Quit => "SIGQUIT",
            ForwardedSignal::User1 => "SIGUSR1",
            ForwardedSignal::User2 => "SIGUSR2",
        }
    }

    /// Whether this signal asks the process to stop.
    pub fn terminates(self) -> bool {
        !matches!(self, ForwardedSignal::User1 | ForwardedSignal::User2)
    }

    /// Platform signal number.
    #[cfg(unix)]
    pub fn number(self) -> i32 {
        self.as_nix() as i32
    }

    #[cfg(not(unix))]
    pub fn number(self) -> i32 {
        match self {
            ForwardedSignal::Terminate => 15,
            ForwardedSignal::Interrupt => 2,
            ForwardedSignal::Hangup => 1,
            ForwardedSignal::Quit => 3,
            ForwardedSignal::User1 => 10,
            ForwardedSignal::User2 => 12,
        }
    }

    #[cfg(unix)]
    fn as_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            ForwardedSignal::Terminate => Signal::SIGTERM,
            ForwardedSignal::Interrupt => Signal::SIGINT,
            ForwardedSignal::Hangup => Signal::SIGHUP,
            ForwardedSignal::Quit => Signal::SIGQUIT,
            ForwardedSignal::User1 => Signal::SIGUSR1,
            ForwardedSignal::User2 => Signal::SIGUSR2,
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        tokio::signal::unix::SignalKind::from_raw(self.number())
    }
}

impl std::fmt::Display for ForwardedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives every [`ForwardedSignal`] delivered to this process.
pub struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(ForwardedSignal, tokio::signal::unix::Signal)>,
}

impl SignalListener {
    /// Register handlers. Must be called inside a Tokio runtime.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        let streams = ForwardedSignal::ALL
            .iter()
            .map(|&sig| tokio::signal::unix::signal(sig.kind()).map(|stream| (sig, stream)))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Option<ForwardedSignal> {
        use std::task::Poll;

        std::future::poll_fn(|cx| {
            for (sig, stream) in self.streams.iter_mut() {
                if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                    return Poll::Ready(Some(*sig));
                }
            }
            Poll::Pending
        })
        .await
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Option<ForwardedSignal> {
        tokio::signal::ctrl_c().await.ok()?;
        Some(ForwardedSignal::Interrupt)
    }
}

impl SignalListener {
    /// Wait for the next termination signal, skipping the others.
    pub async fn recv_termination(&mut self) -> Option<ForwardedSignal> {
        loop {
            let signal = self.recv().await?;
            if signal.terminates() {
                return Some(signal);
            }
            tracing::debug!(signal = %signal, "Ignoring non-terminating signal");
        }
    }

    /// First termination signal already delivered, without waiting.
    /// Anything else queued is drained and dropped.
    pub async fn pending_termination(&mut self) -> Option<ForwardedSignal> {
        let mut first = None;
        loop {
            tokio::select! {
                biased;
                Some(signal) = self.recv() => {
                    if signal.terminates() {
                        first.get_or_insert(signal);
                    }
                }
                _ = std::future::ready(()) => return first,
            }
        }
    }
}

/// Send `signal` to process `pid`.
#[cfg(unix)]
pub fn forward(pid: u32, signal: ForwardedSignal) -> io::Result<()> {
    use nix::unistd::Pid;

    let pid = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    nix::sys::signal::kill(Pid::from_raw(pid), signal.as_nix()).map_err(io::Error::from)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers() {
        assert_eq!(ForwardedSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(ForwardedSignal::Terminate.number(), 15);
        assert_eq!(ForwardedSignal::Interrupt.number(), 2);
        assert_eq!(ForwardedSignal::Hangup.number(), 1);
    }

    #[test]
    fn user_signals_do_not_terminate() {
        let terminating: Vec<_> = ForwardedSignal::ALL
            .into_iter()
            .filter(|s| s.terminates())
            .collect();
        assert_eq!(
            terminating,
            vec![
                ForwardedSignal::Terminate,
                ForwardedSignal::Interrupt,
                ForwardedSignal::Hangup,
                ForwardedSignal::Quit,
            ]
        );
    }

    #[tokio::test]
    async fn nothing_pending_returns_immediately() {
        let mut signals = SignalListener::install().unwrap();
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            signals.pending_termination(),
        )
        .await;
        assert_eq!(pending.unwrap(), None);
    }

    #[test]
    fn forward_to_missing_pid_fails() {
        assert!(forward(u32::MAX, ForwardedSignal::Terminate).is_err());
    }
}
