//! User notification side channel (toast-style messages).

use std::time::Duration;

use log::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub duration: Option<Duration>,
    pub position: Option<ToastPosition>,
}

impl ToastOptions {
    pub fn lasting(duration: Duration, position: ToastPosition) -> Self {
        Self {
            duration: Some(duration),
            position: Some(position),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str, options: ToastOptions);

    fn error(&self, message: &str, options: ToastOptions);
}

/// Routes notifications through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str, _options: ToastOptions) {
        info!("🎉 {}", message);
    }

    fn error(&self, message: &str, _options: ToastOptions) {
        error!("❌ {}", message);
    }
}
