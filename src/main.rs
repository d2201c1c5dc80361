mod battery;
mod charger;
mod controller;
mod daemon;
mod logging;
mod notify;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use controller::{ChargeController, DEFAULT_INTERVAL_SECS, DEFAULT_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "chargecap", version, about = "Battery charge ceiling daemon")]
struct Cli {
    /// Charge limit percentage, 20-100 (default 80)
    limit: Option<String>,

    /// Check interval in seconds (default 60)
    interval: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let state_dir = state::default_state_dir();
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("Failed to create state directory {}", state_dir.display()))?;
    logging::init(&state_dir.join("chargecap.log"))?;

    let limit = parse_limit(cli.limit.as_deref())?;
    let interval = parse_interval(cli.interval.as_deref());

    log::info!("Battery charge limiter started");
    log::info!("Charge limit: {}%", limit);
    log::info!("Check interval: {} seconds", interval.as_secs());

    let store = state::StateStore::new(state_dir.join("state.json"));
    let mut controller = ChargeController::new(
        battery::SysfsPowerSensor::new(),
        charger::SysfsChargeSwitch::new(),
        notify::DesktopNotifier,
        store,
        limit,
    );

    daemon::run(&mut controller, interval)
}

/// An out-of-range limit is a usage error; a non-integer value falls back
/// to the default with a warning.
fn parse_limit(arg: Option<&str>) -> Result<u8> {
    let Some(raw) = arg else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.parse::<i64>() {
        Ok(value) if (20..=100).contains(&value) => Ok(value as u8),
        Ok(_) => anyhow::bail!("Charge limit must be between 20 and 100"),
        Err(_) => {
            log::warn!("Invalid charge limit {:?}, using default {}%", raw, DEFAULT_LIMIT);
            Ok(DEFAULT_LIMIT)
        }
    }
}

/// Interval problems are never fatal; anything but a positive integer
/// falls back to the default with a warning.
fn parse_interval(arg: Option<&str>) -> Duration {
    let Some(raw) = arg else {
        return Duration::from_secs(DEFAULT_INTERVAL_SECS);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            log::warn!(
                "Invalid check interval {:?}, using default {} seconds",
                raw,
                DEFAULT_INTERVAL_SECS
            );
            Duration::from_secs(DEFAULT_INTERVAL_SECS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_absent() {
        assert_eq!(parse_limit(None).unwrap(), 80);
    }

    #[test]
    fn limit_accepts_range_bounds() {
        assert_eq!(parse_limit(Some("20")).unwrap(), 20);
        assert_eq!(parse_limit(Some("100")).unwrap(), 100);
    }

    #[test]
    fn limit_out_of_range_is_fatal() {
        assert!(parse_limit(Some("19")).is_err());
        assert!(parse_limit(Some("101")).is_err());
        assert!(parse_limit(Some("300")).is_err());
        assert!(parse_limit(Some("-5")).is_err());
    }

    #[test]
    fn limit_falls_back_on_non_integer() {
        assert_eq!(parse_limit(Some("eighty")).unwrap(), 80);
    }

    #[test]
    fn interval_falls_back_on_junk_and_zero() {
        assert_eq!(parse_interval(Some("abc")), Duration::from_secs(60));
        assert_eq!(parse_interval(Some("0")), Duration::from_secs(60));
        assert_eq!(parse_interval(Some("-3")), Duration::from_secs(60));
        assert_eq!(parse_interval(Some("30")), Duration::from_secs(30));
        assert_eq!(parse_interval(None), Duration::from_secs(60));
    }
}
