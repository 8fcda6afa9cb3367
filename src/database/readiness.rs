//! Database readiness probing.
//!
//! Containers for the service and its database usually start together. The
//! probe only checks that the endpoint accepts TCP connections; whether the
//! credentials work is for the migration tool to find out.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::schema::ReadinessConfig;
use crate::database::url::Endpoint;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::stage::{Stage, StageOutcome};
use crate::process::signals::SignalListener;
use crate::resilience::backoff::Backoff;

/// Wait until `endpoint` accepts a TCP connection or the deadline passes.
///
/// Returns the number of attempts it took.
pub async fn wait_for_endpoint(endpoint: &Endpoint, config: &ReadinessConfig) -> BootstrapResult<u32> {
    let deadline = Duration::from_secs(config.timeout_secs);
    let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
    let mut backoff = Backoff::new(config.base_delay_ms, config.max_delay_ms);
    let started = Instant::now();

    let probe = async {
        loop {
            let attempt = backoff.attempts() + 1;
            match timeout(connect_timeout, TcpStream::connect((endpoint.host.as_str(), endpoint.port))).await {
                Ok(Ok(_)) => return attempt,
                Ok(Err(e)) => {
                    tracing::debug!(endpoint = %endpoint, attempt, error = %e, "Database not reachable yet");
                }
                Err(_) => {
                    tracing::debug!(endpoint = %endpoint, attempt, "Database connect attempt timed out");
                }
            }
            tokio::time::sleep(backoff.next_delay()).await;
        }
    };

    match timeout(deadline, probe).await {
        Ok(attempts) => {
            tracing::info!(
                endpoint = %endpoint,
                attempts,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Database is reachable"
            );
            Ok(attempts)
        }
        Err(_) => Err(BootstrapError::DatabaseUnavailable {
            endpoint: endpoint.to_string(),
            waited_secs: config.timeout_secs,
        }),
    }
}

pub struct ReadinessStage {
    endpoint: Endpoint,
    config: ReadinessConfig,
}

impl ReadinessStage {
    pub const NAME: &'static str = "readiness";

    pub fn new(endpoint: Endpoint, config: ReadinessConfig) -> Self {
        Self { endpoint, config }
    }
}

#[async_trait]
impl Stage for ReadinessStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, signals: &mut SignalListener) -> BootstrapResult<StageOutcome> {
        tracing::info!(
            endpoint = %self.endpoint,
            timeout_secs = self.config.timeout_secs,
            "Waiting for database"
        );
        tokio::select! {
            result = wait_for_endpoint(&self.endpoint, &self.config) => {
                result?;
                Ok(StageOutcome::Completed)
            }
            Some(signal) = signals.recv_termination() => {
                Err(BootstrapError::Interrupted { signal })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn fast() -> ReadinessConfig {
        ReadinessConfig {
            enabled: true,
            timeout_secs: 1,
            connect_timeout_ms: 200,
            base_delay_ms: 20,
            max_delay_ms: 100,
        }
    }

    #[tokio::test]
    async fn reachable_on_first_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint {
            host: "127.0.0.1".into(),
            port: listener.local_addr().unwrap().port(),
        };

        let attempts = wait_for_endpoint(&endpoint, &fast()).await.unwrap();
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn becomes_reachable_later() {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(listener);
        });

        let endpoint = Endpoint {
            host: "127.0.0.1".into(),
            port: addr.port(),
        };
        let attempts = wait_for_endpoint(&endpoint, &fast()).await.unwrap();
        assert!(attempts > 1);
    }

    #[tokio::test]
    async fn gives_up_after_deadline() {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let stage = ReadinessStage::new(
            Endpoint {
                host: "127.0.0.1".into(),
                port,
            },
            fast(),
        );
        let mut signals = SignalListener::install().unwrap();
        let err = stage.run(&mut signals).await.unwrap_err();
        assert!(matches!(err, BootstrapError::DatabaseUnavailable { .. }));
        assert_eq!(err.exit_code(), 69);
    }
}
