use chrono::Local;

use crate::battery::PowerSensor;
use crate::charger::ChargeSwitch;
use crate::notify::Notifier;
use crate::state::StateStore;

pub const DEFAULT_LIMIT: u8 = 80;
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Width of the hysteresis band below the limit. Charging is re-enabled
/// only once the percentage drops below `limit - HYSTERESIS`, so the
/// switch is not toggled every tick while hovering near the limit.
pub const HYSTERESIS: u8 = 5;

/// Hysteresis charge controller.
///
/// Owns the persisted decision state and drives the charge switch from
/// battery readings. `charging_enabled` always reflects the last decision
/// successfully applied (or, for the AC-off reset, intended).
pub struct ChargeController<S, A, N> {
    sensor: S,
    switch: A,
    notifier: N,
    store: StateStore,
    limit: u8,
    charging_enabled: bool,
}

impl<S: PowerSensor, A: ChargeSwitch, N: Notifier> ChargeController<S, A, N> {
    pub fn new(sensor: S, switch: A, notifier: N, store: StateStore, limit: u8) -> Self {
        let charging_enabled = store.load().charging_enabled;
        Self {
            sensor,
            switch,
            notifier,
            store,
            limit,
            charging_enabled,
        }
    }

    pub fn charging_enabled(&self) -> bool {
        self.charging_enabled
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn switch(&self) -> &A {
        &self.switch
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn persist(&mut self) {
        let state = crate::state::ControllerState {
            charging_enabled: self.charging_enabled,
            last_update: Local::now(),
        };
        if let Err(e) = self.store.save(&state) {
            // In-memory state stays authoritative for this process.
            log::warn!("Failed to persist state: {:#}", e);
        }
    }

    /// One control-loop iteration: sample the battery, apply the policy,
    /// persist any transition. All failures are logged and retried
    /// naturally on the next tick.
    pub fn tick(&mut self) {
        let reading = match self.sensor.read() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("Could not read battery state: {:#}", e);
                return;
            }
        };

        log::info!(
            "Battery: {}% | charging: {} | AC: {} | charging allowed: {}",
            reading.percentage,
            reading.charging,
            reading.ac_online,
            self.charging_enabled
        );

        if !reading.ac_online {
            // Unplugging always clears a suppression, so charging resumes
            // as soon as AC returns. Pure state correction, no switch call.
            if !self.charging_enabled {
                log::info!("AC disconnected, resetting charge state to allowed");
                self.charging_enabled = true;
                self.persist();
            }
            return;
        }

        if reading.percentage >= self.limit && self.charging_enabled {
            log::info!(
                "Battery at {}% (limit {}%), inhibiting charging",
                reading.percentage,
                self.limit
            );
            match self.switch.set_charging(false) {
                Ok(()) => {
                    self.charging_enabled = false;
                    self.persist();
                    self.notifier.notify(
                        "Battery limit reached",
                        &format!("Charging stopped at {}%", self.limit),
                    );
                }
                Err(e) => log::warn!("Failed to inhibit charging: {:#}", e),
            }
        } else if reading.percentage < self.limit - HYSTERESIS && !self.charging_enabled {
            log::info!(
                "Battery at {}% (below {}%), enabling charging",
                reading.percentage,
                self.limit - HYSTERESIS
            );
            match self.switch.set_charging(true) {
                Ok(()) => {
                    self.charging_enabled = true;
                    self.persist();
                }
                Err(e) => log::warn!("Failed to enable charging: {:#}", e),
            }
        }
    }

    /// One best-effort enable attempt before exit. The daemon must never
    /// leave charging inhibited after the controlling process stops.
    pub fn restore_on_shutdown(&mut self) {
        if self.charging_enabled {
            return;
        }
        log::info!("Re-enabling charging before exit");
        match self.switch.set_charging(true) {
            Ok(()) => {
                self.charging_enabled = true;
                self.persist();
            }
            Err(e) => log::warn!("Failed to re-enable charging on shutdown: {:#}", e),
        }
    }
}
