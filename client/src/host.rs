//! Seams into the hosting UI shell.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use precept_core::Intent;
use precept_core::ToastLevel;
use tracing::info;
use tracing::warn;

/// Whether the application is currently in the foreground. Consulted before
/// showing alerts so a background tab does not pile up notifications.
pub trait Visibility: Send + Sync {
    fn is_visible(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}

/// Shared flag the host flips on focus changes.
#[derive(Clone, Debug)]
pub struct VisibilityFlag(Arc<AtomicBool>);

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Relaxed);
    }
}

impl Default for VisibilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Visibility for VisibilityFlag {
    fn is_visible(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives the presentation intents (toasts, banners) produced by the
/// session. Storage and refresh intents never reach it.
pub trait Presenter: Send + Sync {
    fn present(&self, intent: &Intent);
}

/// Presenter for headless hosts: every intent becomes a log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn present(&self, intent: &Intent) {
        match intent {
            Intent::ShowToast(toast) if toast.level == ToastLevel::Error => {
                warn!("{}", toast.message);
            }
            Intent::ShowToast(toast) => info!("{}", toast.message),
            other => info!(intent = ?other, "presentation intent"),
        }
    }
}
