use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::battery::PowerSensor;
use crate::charger::ChargeSwitch;
use crate::controller::ChargeController;
use crate::notify::Notifier;

/// Runs the control loop until an interrupt or termination signal, then
/// restores charging and returns. One immediate tick at startup, then one
/// tick per interval.
pub fn run<S, A, N>(controller: &mut ChargeController<S, A, N>, interval: Duration) -> Result<()>
where
    S: PowerSensor,
    A: ChargeSwitch,
    N: Notifier,
{
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to set signal handler")?;
    }

    controller.tick();

    while running.load(Ordering::SeqCst) {
        sleep_until_signal(&running, interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }
        controller.tick();
    }

    log::info!("Stopping chargecap");
    controller.restore_on_shutdown();
    Ok(())
}

// The sleep is sliced so a signal ends the wait within a second instead
// of after the remainder of the interval.
fn sleep_until_signal(running: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(Duration::from_secs(1)));
    }
}
