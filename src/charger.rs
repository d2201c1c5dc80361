use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Hardware charge-inhibit control.
pub trait ChargeSwitch {
    /// `true` lets the battery charge normally, `false` inhibits charging.
    fn set_charging(&self, enable: bool) -> Result<()>;
}

/// Switch backed by the kernel `charge_behaviour` control of the first
/// battery under `/sys/class/power_supply`. Writing it requires root.
pub struct SysfsChargeSwitch {
    root: PathBuf,
}

impl SysfsChargeSwitch {
    pub fn new() -> Self {
        Self::with_root("/sys/class/power_supply")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Looked up on every call so a control that appears after startup
    // (module reload, firmware update) is picked up without a restart.
    fn control_node(&self) -> Result<PathBuf> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;

        for entry in entries.flatten() {
            let dir = entry.path();
            let Ok(kind) = fs::read_to_string(dir.join("type")) else {
                continue;
            };
            if kind.trim() != "Battery" {
                continue;
            }
            let node = dir.join("charge_behaviour");
            if node.exists() {
                return Ok(node);
            }
        }

        bail!(
            "No charge_behaviour control under {}; firmware does not expose charge inhibit",
            self.root.display()
        )
    }
}

impl ChargeSwitch for SysfsChargeSwitch {
    fn set_charging(&self, enable: bool) -> Result<()> {
        let node = self.control_node()?;
        let value = if enable { "auto" } else { "inhibit-charge" };

        fs::write(&node, value).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                anyhow!("Writing {} requires root", node.display())
            } else {
                anyhow::Error::new(e).context(format!("Failed to write {}", node.display()))
            }
        })?;

        log::debug!("Wrote {} to {}", value, node.display());
        Ok(())
    }
}
