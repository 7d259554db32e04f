//! The hardware controller — the single shared-resource boundary.
//!
//! Owns the backend and the cached output states behind one mutex. Every
//! public operation holds the lock end-to-end, so at most one operation
//! touches the physical bus at a time and a returned snapshot can never mix
//! states from different instants. The acquirer's retry delays run under the
//! lock; concurrent requests block for the full acquisition window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use domo_common::config::NodeConfig;
use domo_common::error::HwError;
use domo_common::io::backend::GpioBackend;
use domo_common::io::line::Device;
use domo_common::io::registry::LineRegistry;
use domo_common::snapshot::StatusSnapshot;

use crate::acquirer::ClimateAcquirer;

/// Everything that lives behind the bus lock.
struct Bus {
    backend: Box<dyn GpioBackend>,
    /// Last successfully committed level per actuator.
    outputs: HashMap<Device, bool>,
}

/// Mutex-guarded hardware controller.
///
/// Cheap to clone; clones share the same bus.
#[derive(Clone)]
pub struct Controller {
    registry: Arc<LineRegistry>,
    acquirer: ClimateAcquirer,
    bus: Arc<Mutex<Bus>>,
}

impl Controller {
    /// Initialize the controller: claim lines, drive every actuator Low and
    /// cache the Off state.
    pub fn new(
        registry: Arc<LineRegistry>,
        mut backend: Box<dyn GpioBackend>,
        config: &NodeConfig,
    ) -> Result<Self, HwError> {
        backend.init(&registry, config)?;

        let mut outputs = HashMap::new();
        for device in Device::ACTUATORS {
            backend.write(registry.line(device), false)?;
            outputs.insert(device, false);
        }
        info!(backend = backend.name(), "hardware controller initialized, all outputs off");

        Ok(Self {
            registry,
            acquirer: ClimateAcquirer::from_config(&config.sensor),
            bus: Arc::new(Mutex::new(Bus { backend, outputs })),
        })
    }

    /// Assemble a status snapshot under one lock acquisition.
    ///
    /// Digital faults are fatal to the call; sensor exhaustion degrades to
    /// `sensor_ok = false`.
    pub fn get_status(&self) -> Result<StatusSnapshot, HwError> {
        let mut bus = self.lock_bus();
        self.assemble(&mut bus)
    }

    /// Drive an actuator and return a snapshot consistent with the write.
    ///
    /// Resolution errors (`UnknownDevice`, `InvalidTarget`) happen before
    /// the lock is taken and cause no line mutation. The write, the cache
    /// update and the snapshot all share one lock scope.
    pub fn set_actuator(&self, name: &str, on: bool) -> Result<StatusSnapshot, HwError> {
        let line = *self.registry.resolve_actuator(name)?;
        let mut bus = self.lock_bus();
        bus.backend.write(&line, on)?;
        bus.outputs.insert(line.device, on);
        debug!(device = %line.device, on, "actuator written");
        self.assemble(&mut bus)
    }

    /// Return every actuator to the safe default (Low) and release the
    /// backend.
    pub fn shutdown(&self) -> Result<(), HwError> {
        let mut bus = self.lock_bus();
        for device in Device::ACTUATORS {
            let line = *self.registry.line(device);
            match bus.backend.write(&line, false) {
                Ok(()) => {
                    bus.outputs.insert(device, false);
                }
                Err(err) => warn!(device = %device, %err, "failed to drive line low on shutdown"),
            }
        }
        bus.backend.shutdown()?;
        info!("hardware controller shut down");
        Ok(())
    }

    fn lock_bus(&self) -> MutexGuard<'_, Bus> {
        self.bus.lock().expect("bus lock poisoned")
    }

    fn assemble(&self, bus: &mut Bus) -> Result<StatusSnapshot, HwError> {
        let button = bus.backend.read(self.registry.line(Device::Button))?;
        let motion_sensor = bus.backend.read(self.registry.line(Device::MotionSensor))?;

        // Acquisition failures were already logged by the acquirer; the
        // snapshot carries the explicit unavailable marker instead.
        let reading = match self.acquirer.acquire(bus.backend.as_mut()) {
            Ok(reading) => {
                debug!(valid_at = %reading.valid_at, "snapshot carries fresh sensor reading");
                Some(reading)
            }
            Err(_) => None,
        };

        let output = |device: Device| bus.outputs.get(&device).copied().unwrap_or(false);
        Ok(StatusSnapshot {
            button,
            motion_sensor,
            temperature: reading.as_ref().map(|r| r.temperature),
            humidity: reading.as_ref().map(|r| r.humidity),
            sensor_ok: reading.is_some(),
            led_red: output(Device::LedRed),
            led_yellow: output(Device::LedYellow),
            led_green: output(Device::LedGreen),
        })
    }
}
