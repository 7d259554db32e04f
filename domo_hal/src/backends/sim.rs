//! Simulation backend.
//!
//! In-memory pin banks plus a scriptable climate source, so the whole stack
//! runs and tests without physical hardware. A [`SimHandle`] clone shares
//! the state, letting tests poke input levels, inspect driven outputs, and
//! queue per-attempt sensor outcomes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use domo_common::config::NodeConfig;
use domo_common::error::HwError;
use domo_common::io::backend::{ClimateSample, GpioBackend, SampleError, ensure_direction};
use domo_common::io::line::LineDirection;
use domo_common::io::registry::{Line, LineRegistry};

#[derive(Debug)]
struct SimState {
    initialized: bool,
    inputs: HashMap<u32, bool>,
    outputs: HashMap<u32, bool>,
    /// Steady climate value returned when the script queue is empty.
    /// `None` makes every attempt time out.
    climate: Option<ClimateSample>,
    /// Per-attempt outcomes consumed front-first before `climate` applies.
    climate_script: VecDeque<Result<ClimateSample, SampleError>>,
    sample_calls: u64,
    fail_next_write: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            initialized: false,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            // simulated steady-state room climate
            climate: Some(ClimateSample {
                temperature: 22.5,
                humidity: 40.0,
            }),
            climate_script: VecDeque::new(),
            sample_calls: 0,
            fail_next_write: false,
        }
    }
}

/// Software simulation of the GPIO chip and climate sensor.
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
}

/// Shared view into a [`SimBackend`]'s state for tests and demos.
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

/// Create a boxed simulation backend.
pub fn create_backend() -> Box<dyn GpioBackend> {
    Box::new(SimBackend::new())
}

impl SimBackend {
    /// Create a simulation backend with default state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Create a simulation backend plus a handle onto its shared state.
    pub fn with_handle() -> (Self, SimHandle) {
        let backend = Self::new();
        let handle = SimHandle {
            state: Arc::clone(&backend.state),
        };
        (backend, handle)
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("sim state lock poisoned")
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBackend for SimBackend {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn init(&mut self, registry: &LineRegistry, _config: &NodeConfig) -> Result<(), HwError> {
        let mut state = self.lock();
        for line in registry.iter() {
            match line.direction {
                LineDirection::Input => {
                    state.inputs.entry(line.pin).or_insert(false);
                }
                LineDirection::Output => {
                    state.outputs.entry(line.pin).or_insert(false);
                }
            }
        }
        state.initialized = true;
        debug!(
            inputs = state.inputs.len(),
            outputs = state.outputs.len(),
            "simulation backend initialized"
        );
        Ok(())
    }

    fn read(&mut self, line: &Line) -> Result<bool, HwError> {
        ensure_direction(line, LineDirection::Input)?;
        let state = self.lock();
        state
            .inputs
            .get(&line.pin)
            .copied()
            .ok_or_else(|| HwError::HardwareFault {
                line: line.device.to_string(),
                reason: "line not claimed".to_string(),
            })
    }

    fn write(&mut self, line: &Line, level: bool) -> Result<(), HwError> {
        ensure_direction(line, LineDirection::Output)?;
        let mut state = self.lock();
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(HwError::HardwareFault {
                line: line.device.to_string(),
                reason: "injected write fault".to_string(),
            });
        }
        if !state.outputs.contains_key(&line.pin) {
            return Err(HwError::HardwareFault {
                line: line.device.to_string(),
                reason: "line not claimed".to_string(),
            });
        }
        state.outputs.insert(line.pin, level);
        Ok(())
    }

    fn sample_climate(&mut self) -> Result<ClimateSample, SampleError> {
        let mut state = self.lock();
        state.sample_calls += 1;
        if let Some(outcome) = state.climate_script.pop_front() {
            return outcome;
        }
        state
            .climate
            .ok_or(SampleError::Timeout("sensor response start"))
    }

    fn shutdown(&mut self) -> Result<(), HwError> {
        // Pin banks are kept so post-shutdown state stays inspectable.
        self.lock().initialized = false;
        Ok(())
    }
}

impl SimHandle {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("sim state lock poisoned")
    }

    /// Set the level a digital input reads back.
    pub fn set_input(&self, pin: u32, level: bool) {
        self.lock().inputs.insert(pin, level);
    }

    /// The last level driven onto an output pin, if it was ever claimed.
    pub fn output(&self, pin: u32) -> Option<bool> {
        self.lock().outputs.get(&pin).copied()
    }

    /// Set the steady climate value.
    pub fn set_climate(&self, temperature: f64, humidity: f64) {
        self.lock().climate = Some(ClimateSample {
            temperature,
            humidity,
        });
    }

    /// Make every subsequent acquisition attempt time out.
    pub fn clear_climate(&self) {
        self.lock().climate = None;
    }

    /// Queue one per-attempt outcome ahead of the steady value.
    pub fn push_sample(&self, outcome: Result<ClimateSample, SampleError>) {
        self.lock().climate_script.push_back(outcome);
    }

    /// Inject a hardware fault into the next write.
    pub fn fail_next_write(&self) {
        self.lock().fail_next_write = true;
    }

    /// Number of acquisition attempts the backend has served.
    pub fn sample_calls(&self) -> u64 {
        self.lock().sample_calls
    }

    /// Whether `init()` has run and `shutdown()` has not.
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domo_common::io::line::Device;

    fn setup() -> (SimBackend, SimHandle, LineRegistry) {
        let config = NodeConfig::default();
        let registry = LineRegistry::from_config(&config).unwrap();
        let (mut backend, handle) = SimBackend::with_handle();
        backend.init(&registry, &config).unwrap();
        (backend, handle, registry)
    }

    #[test]
    fn inputs_default_low() {
        let (mut backend, handle, registry) = setup();
        let button = registry.line(Device::Button);
        assert!(!backend.read(button).unwrap());
        handle.set_input(button.pin, true);
        assert!(backend.read(button).unwrap());
    }

    #[test]
    fn writes_visible_through_handle() {
        let (mut backend, handle, registry) = setup();
        let red = registry.line(Device::LedRed);
        backend.write(red, true).unwrap();
        assert_eq!(handle.output(red.pin), Some(true));
        backend.write(red, false).unwrap();
        assert_eq!(handle.output(red.pin), Some(false));
    }

    #[test]
    fn direction_enforced() {
        let (mut backend, _handle, registry) = setup();
        let err = backend.write(registry.line(Device::Button), true).unwrap_err();
        assert!(matches!(err, HwError::DirectionMismatch { .. }));
        let err = backend.read(registry.line(Device::LedRed)).unwrap_err();
        assert!(matches!(err, HwError::DirectionMismatch { .. }));
    }

    #[test]
    fn unclaimed_line_is_a_fault() {
        let config = NodeConfig::default();
        let registry = LineRegistry::from_config(&config).unwrap();
        let mut backend = SimBackend::new(); // no init
        let err = backend.read(registry.line(Device::Button)).unwrap_err();
        assert!(matches!(err, HwError::HardwareFault { .. }));
    }

    #[test]
    fn steady_climate_and_script() {
        let (mut backend, handle, _registry) = setup();
        let sample = backend.sample_climate().unwrap();
        assert_eq!(sample.temperature, 22.5);

        handle.push_sample(Err(SampleError::Timeout("sensor response start")));
        handle.push_sample(Ok(ClimateSample {
            temperature: 30.0,
            humidity: 55.0,
        }));
        assert!(backend.sample_climate().is_err());
        assert_eq!(backend.sample_climate().unwrap().humidity, 55.0);
        // queue drained, steady value again
        assert_eq!(backend.sample_climate().unwrap().temperature, 22.5);
        assert_eq!(handle.sample_calls(), 4);
    }

    #[test]
    fn cleared_climate_times_out() {
        let (mut backend, handle, _registry) = setup();
        handle.clear_climate();
        assert!(matches!(
            backend.sample_climate(),
            Err(SampleError::Timeout(_))
        ));
    }

    #[test]
    fn shutdown_marks_backend_released() {
        let (mut backend, handle, _registry) = setup();
        assert!(handle.is_initialized());
        backend.shutdown().unwrap();
        assert!(!handle.is_initialized());
    }

    #[test]
    fn injected_write_fault_fires_once() {
        let (mut backend, handle, registry) = setup();
        let red = registry.line(Device::LedRed);
        handle.fail_next_write();
        assert!(matches!(
            backend.write(red, true),
            Err(HwError::HardwareFault { .. })
        ));
        assert_eq!(handle.output(red.pin), Some(false));
        backend.write(red, true).unwrap();
        assert_eq!(handle.output(red.pin), Some(true));
    }
}
