//! Process-wide run state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//!
//! A batch never observes the global flag directly; it polls a
//! [`CancelToken`], which the Ctrl+C handler trips through [`shutdown_token`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Token shared with the running batch
static SHUTDOWN_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Cooperative cancellation flag for a batch.
///
/// Cancelling only stops new assets from being started; an asset that is
/// already being processed always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Uses Relaxed ordering - worst case one more asset is started.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Token tripped by the Ctrl+C handler.
pub fn shutdown_token() -> CancelToken {
    SHUTDOWN_TOKEN.get_or_init(CancelToken::new).clone()
}

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The first Ctrl+C cancels the running batch (no new assets are started),
/// a second one exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    let token = shutdown_token();
    ctrlc::set_handler(move || {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("upload"; "cancelling, waiting for in-flight assets...");
        token.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}
