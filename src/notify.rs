use std::process::Command;

/// Best-effort user notification. Failures are logged and never affect
/// charging decisions.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier backed by `notify-send`.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        match Command::new("notify-send").arg(title).arg(message).status() {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("notify-send exited with {}", status),
            Err(e) => log::warn!("Failed to run notify-send: {}", e),
        }
    }
}
