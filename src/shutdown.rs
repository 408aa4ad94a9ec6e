use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// What stopped the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C, SIGTERM or an explicit call from the embedding code.
    Interrupt,
    /// The input reader reached the end of its stream.
    EndOfInput,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => write!(f, "interrupt"),
            ShutdownReason::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// One-shot, broadcast cancellation signal.
///
/// Once raised it stays raised. Only the first trigger records its reason,
/// later triggers are no-ops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` if this call was the one that raised it.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        if first {
            tracing::warn!(%reason, "shutdown requested");
            self.token.cancel();
        } else {
            tracing::debug!(%reason, "shutdown already requested, ignoring");
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The reason recorded by the winning trigger.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    /// Resolves once the signal has been raised.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

/// Resolves when the process receives Ctrl+C or, on unix, SIGTERM.
pub async fn interrupt() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, terminating");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, terminating");
        },
    }
}
