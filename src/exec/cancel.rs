//! Cancellation for a single invocation.
//!
//! Two independent triggers race to cancel one [`CancellationToken`]:
//!
//! - a deadline task that fires once the timeout elapses
//! - a one-shot listener for SIGINT / SIGTERM
//!
//! Each trigger records its cause before cancelling, so whoever observes the
//! cancellation can also read why it happened. Causes are kept in
//! single-assignment cells: the first writer wins and later triggers only
//! re-cancel an already cancelled token.

use crate::signals;
use nix::sys::signal::Signal;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why an [`ExecContext`] was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Cancelled explicitly (interrupt received, or released).
    Canceled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Canceled => f.write_str("context canceled"),
            ContextError::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

/// Cancellable handle the runner binds its child process to.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    token: CancellationToken,
    cause: Arc<OnceLock<ContextError>>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with [`ContextError::Canceled`] unless a cause is already recorded.
    pub fn cancel(&self) {
        self.cancel_with(ContextError::Canceled);
    }

    fn cancel_with(&self, cause: ContextError) {
        // Cause first: anyone woken by the token must see it.
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    /// The recorded cause, or `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        self.cause.get().copied()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// What the controller observed, read after the runner has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub context_error: Option<ContextError>,
    pub signal: Option<Signal>,
}

impl Diagnostics {
    pub fn context_message(&self) -> Option<String> {
        self.context_error.map(|err| err.to_string())
    }

    pub fn signal_notice(&self) -> Option<String> {
        self.signal.map(|signal| format!("got signal: {}", signals::describe(signal)))
    }
}

/// Owns the deadline and signal tasks for one invocation.
///
/// Dropping (or [`release`](Self::release)-ing) the controller cancels the
/// context and stops both tasks.
#[derive(Debug)]
pub struct CancellationController {
    context: ExecContext,
    received: Arc<OnceLock<Signal>>,
    tasks: Vec<JoinHandle<()>>,
}

impl CancellationController {
    /// Start the deadline clock and the signal listener.
    ///
    /// Must be called from within a tokio runtime with time and signal drivers
    /// enabled. A zero timeout yields an already expired context.
    pub fn start(timeout: Duration) -> Self {
        let context = ExecContext::new();
        let received = Arc::new(OnceLock::new());
        let mut tasks = Vec::with_capacity(2);

        if timeout.is_zero() {
            context.cancel_with(ContextError::DeadlineExceeded);
        } else {
            tasks.push(tokio::spawn(expire_after(timeout, context.clone())));
        }

        match listen_for_interrupt() {
            Ok(next_signal) => tasks.push(tokio::spawn(record_first_signal(
                next_signal,
                context.clone(),
                Arc::clone(&received),
            ))),
            Err(err) => {
                warn!(error = %err, "could not install signal handlers; only the deadline applies");
            }
        }

        Self {
            context,
            received,
            tasks,
        }
    }

    pub fn context(&self) -> &ExecContext {
        &self.context
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            context_error: self.context.err(),
            signal: self.received.get().copied(),
        }
    }

    /// Tear down after the invocation. Read [`diagnostics`](Self::diagnostics) first.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for CancellationController {
    fn drop(&mut self) {
        self.context.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn expire_after(timeout: Duration, context: ExecContext) {
    tokio::select! {
        _ = tokio::time::sleep(timeout) => {
            debug!(?timeout, "deadline exceeded");
            context.cancel_with(ContextError::DeadlineExceeded);
        }
        _ = context.cancelled() => {}
    }
}

/// Register SIGINT and SIGTERM handlers and return a future for the first arrival.
///
/// Registration happens here, synchronously, so signals delivered before the
/// listener task is first polled are not lost.
fn listen_for_interrupt() -> io::Result<impl Future<Output = Option<Signal>> + Send + 'static> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            Some(()) = interrupt.recv() => Some(Signal::SIGINT),
            Some(()) = terminate.recv() => Some(Signal::SIGTERM),
            else => None,
        }
    })
}

async fn record_first_signal(
    next_signal: impl Future<Output = Option<Signal>>,
    context: ExecContext,
    received: Arc<OnceLock<Signal>>,
) {
    let Some(signal) = next_signal.await else {
        return;
    };
    debug!(signal = signals::describe(signal), "interrupt received");
    let _ = received.set(signal);
    context.cancel();
}
