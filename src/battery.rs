use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// One sample of the platform power state.
#[derive(Debug, Clone, Copy)]
pub struct BatteryReading {
    pub percentage: u8,
    /// Hardware-reported charging activity. Logged, never used in the
    /// control decision.
    pub charging: bool,
    pub ac_online: bool,
}

/// Read-only view of the platform power state.
pub trait PowerSensor {
    fn read(&self) -> Result<BatteryReading>;
}

/// Sensor backed by `/sys/class/power_supply`.
pub struct SysfsPowerSensor {
    root: PathBuf,
}

impl SysfsPowerSensor {
    pub fn new() -> Self {
        Self::with_root("/sys/class/power_supply")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PowerSensor for SysfsPowerSensor {
    fn read(&self) -> Result<BatteryReading> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;

        let mut battery: Option<(u8, bool)> = None;
        let mut ac_online = false;

        for entry in entries.flatten() {
            let dir = entry.path();
            let Ok(kind) = fs::read_to_string(dir.join("type")) else {
                continue;
            };
            match kind.trim() {
                "Battery" if battery.is_none() => {
                    let capacity = fs::read_to_string(dir.join("capacity"))
                        .with_context(|| format!("Failed to read capacity in {}", dir.display()))?;
                    let percentage = capacity.trim().parse::<u8>().with_context(|| {
                        format!("Unparseable capacity {:?} in {}", capacity.trim(), dir.display())
                    })?;

                    let status = fs::read_to_string(dir.join("status")).unwrap_or_default();
                    let charging = matches!(status.trim(), "Charging" | "Full");

                    battery = Some((percentage.min(100), charging));
                }
                "Mains" | "USB" => {
                    if let Ok(online) = fs::read_to_string(dir.join("online")) {
                        if online.trim() == "1" {
                            ac_online = true;
                        }
                    }
                }
                _ => {}
            }
        }

        let (percentage, charging) = battery
            .with_context(|| format!("No battery found under {}", self.root.display()))?;

        Ok(BatteryReading {
            percentage,
            charging,
            ac_online,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_supply(root: &Path, name: &str, fields: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, value) in fields {
            fs::write(dir.join(file), format!("{}\n", value)).unwrap();
        }
    }

    #[test]
    fn reads_battery_and_mains() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "73"), ("status", "Charging")],
        );
        write_supply(tmp.path(), "AC", &[("type", "Mains"), ("online", "1")]);

        let reading = SysfsPowerSensor::with_root(tmp.path()).read().unwrap();
        assert_eq!(reading.percentage, 73);
        assert!(reading.charging);
        assert!(reading.ac_online);
    }

    #[test]
    fn offline_mains_reports_no_ac() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "50"), ("status", "Discharging")],
        );
        write_supply(tmp.path(), "AC", &[("type", "Mains"), ("online", "0")]);

        let reading = SysfsPowerSensor::with_root(tmp.path()).read().unwrap();
        assert!(!reading.charging);
        assert!(!reading.ac_online);
    }

    #[test]
    fn missing_battery_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(tmp.path(), "AC", &[("type", "Mains"), ("online", "1")]);

        assert!(SysfsPowerSensor::with_root(tmp.path()).read().is_err());
    }

    #[test]
    fn garbage_capacity_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_supply(
            tmp.path(),
            "BAT0",
            &[("type", "Battery"), ("capacity", "???"), ("status", "Full")],
        );

        assert!(SysfsPowerSensor::with_root(tmp.path()).read().is_err());
    }
}
