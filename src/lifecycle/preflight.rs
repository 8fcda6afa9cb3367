//! Bind pre-flight.
//!
//! Two services started on one host must not share a port. The server would
//! fail on its own, but only after migrations ran; checking first makes the
//! collision obvious and cheap.

use std::io;

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::database::url::Endpoint;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::stage::{Stage, StageOutcome};
use crate::process::signals::SignalListener;

pub struct PortCheckStage {
    bind: Endpoint,
}

impl PortCheckStage {
    pub const NAME: &'static str = "preflight";

    pub fn new(bind: Endpoint) -> Self {
        Self { bind }
    }
}

/// Bind and immediately release `bind`. Only "address in use" is fatal;
/// anything else is left for the server to report.
pub async fn check_bind(bind: &Endpoint) -> BootstrapResult<()> {
    match TcpListener::bind((bind.host.as_str(), bind.port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(BootstrapError::PortInUse {
            addr: bind.to_string(),
        }),
        Err(e) => {
            tracing::warn!(addr = %bind, error = %e, "Bind pre-flight inconclusive, continuing");
            Ok(())
        }
    }
}

#[async_trait]
impl Stage for PortCheckStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, _signals: &mut SignalListener) -> BootstrapResult<StageOutcome> {
        check_bind(&self.bind).await?;
        tracing::debug!(addr = %self.bind, "Bind address is free");
        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn free_port_passes() {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let bind = Endpoint { host: "127.0.0.1".into(), port };
        assert!(check_bind(&bind).await.is_ok());
    }

    #[tokio::test]
    async fn taken_port_fails_with_98() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let stage = PortCheckStage::new(Endpoint { host: "127.0.0.1".into(), port });
        let mut signals = SignalListener::install().unwrap();
        let err = stage.run(&mut signals).await.unwrap_err();
        assert!(matches!(err, BootstrapError::PortInUse { .. }));
        assert_eq!(err.exit_code(), 98);
    }
}
