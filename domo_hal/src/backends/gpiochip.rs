//! Linux GPIO character device backend.
//!
//! Talks to `/dev/gpiochipN` through the v1 line-handle ABI: one handle is
//! requested per registered line at init, then reads and writes are single
//! ioctls on the handle fd. The climate sensor's one-wire protocol is
//! bit-banged on demand over the same chip: drive the data line low to start,
//! release it, then time the sensor's 40 reply pulses.
//!
//! A single attempt here is allowed to fail — user-space timing over ioctls
//! is not deterministic, and the acquirer retries within its bound.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::thread;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use static_assertions::const_assert_eq;
use tracing::{debug, info};

use domo_common::config::{NodeConfig, SensorConfig, SensorKind};
use domo_common::error::HwError;
use domo_common::io::backend::{ClimateSample, GpioBackend, SampleError, ensure_direction};
use domo_common::io::line::LineDirection;
use domo_common::io::registry::{Line, LineRegistry};

// ─── GPIO uAPI (v1 line-handle ABI) ─────────────────────────────────

/// Maximum lines per handle request, fixed by the kernel ABI.
const GPIOHANDLES_MAX: usize = 64;

/// `_IOWR(0xB4, nr, size)` for the GPIO ioctl family.
const fn gpio_iowr(nr: u32, size: usize) -> u32 {
    0xC000_0000 | ((size as u32) << 16) | (0xB4 << 8) | nr
}

const GPIO_GET_LINEHANDLE_IOCTL: u32 = gpio_iowr(0x03, size_of::<GpioHandleRequest>());
const GPIOHANDLE_GET_LINE_VALUES_IOCTL: u32 = gpio_iowr(0x08, size_of::<GpioHandleData>());
const GPIOHANDLE_SET_LINE_VALUES_IOCTL: u32 = gpio_iowr(0x09, size_of::<GpioHandleData>());

bitflags! {
    /// Request flags for `struct gpiohandle_request`.
    struct HandleFlags: u32 {
        const INPUT = 1 << 0;
        const OUTPUT = 1 << 1;
    }
}

/// `struct gpiohandle_request` from `<linux/gpio.h>`.
#[repr(C)]
struct GpioHandleRequest {
    lineoffsets: [u32; GPIOHANDLES_MAX],
    flags: u32,
    default_values: [u8; GPIOHANDLES_MAX],
    consumer_label: [u8; 32],
    lines: u32,
    fd: libc::c_int,
}

/// `struct gpiohandle_data` from `<linux/gpio.h>`.
#[repr(C)]
struct GpioHandleData {
    values: [u8; GPIOHANDLES_MAX],
}

// Layout must match the kernel exactly; the ioctl numbers encode the size.
const_assert_eq!(size_of::<GpioHandleRequest>(), 364);
const_assert_eq!(size_of::<GpioHandleData>(), 64);

/// Request a single-line handle from the chip.
fn request_line(
    chip: &File,
    pin: u32,
    flags: HandleFlags,
    default: bool,
) -> std::io::Result<OwnedFd> {
    let mut req = GpioHandleRequest {
        lineoffsets: [0; GPIOHANDLES_MAX],
        flags: flags.bits(),
        default_values: [0; GPIOHANDLES_MAX],
        consumer_label: [0; 32],
        lines: 1,
        fd: 0,
    };
    req.lineoffsets[0] = pin;
    req.default_values[0] = default as u8;
    let label = b"domo";
    req.consumer_label[..label.len()].copy_from_slice(label);

    let rc = unsafe {
        libc::ioctl(
            chip.as_raw_fd(),
            GPIO_GET_LINEHANDLE_IOCTL as _,
            &mut req,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(req.fd) })
}

/// Read the current level through a line handle.
fn handle_get(fd: &OwnedFd) -> std::io::Result<bool> {
    let mut data = GpioHandleData {
        values: [0; GPIOHANDLES_MAX],
    };
    let rc = unsafe {
        libc::ioctl(
            fd.as_raw_fd(),
            GPIOHANDLE_GET_LINE_VALUES_IOCTL as _,
            &mut data,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(data.values[0] != 0)
}

/// Drive a level through a line handle.
fn handle_set(fd: &OwnedFd, level: bool) -> std::io::Result<()> {
    let mut data = GpioHandleData {
        values: [0; GPIOHANDLES_MAX],
    };
    data.values[0] = level as u8;
    let rc = unsafe {
        libc::ioctl(
            fd.as_raw_fd(),
            GPIOHANDLE_SET_LINE_VALUES_IOCTL as _,
            &mut data,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

// ─── One-wire climate frame ─────────────────────────────────────────

/// A high pulse longer than this is a 1 bit (0 bits are ~26 µs, 1 bits ~70 µs).
const BIT_ONE_THRESHOLD: Duration = Duration::from_micros(50);

/// Per-edge timeout while reading the sensor reply.
const EDGE_TIMEOUT: Duration = Duration::from_millis(2);

/// How long the host holds the data line low to request a reading.
fn start_low_duration(kind: SensorKind) -> Duration {
    match kind {
        SensorKind::Dht11 => Duration::from_millis(18),
        SensorKind::Dht22 => Duration::from_millis(2),
    }
}

/// Busy-poll the line until it reaches `target`, returning the time it took.
fn wait_edge(fd: &OwnedFd, target: bool, phase: &'static str) -> Result<Duration, SampleError> {
    let start = Instant::now();
    loop {
        let level = handle_get(fd).map_err(|e| SampleError::Bus(e.to_string()))?;
        if level == target {
            return Ok(start.elapsed());
        }
        if start.elapsed() > EDGE_TIMEOUT {
            return Err(SampleError::Timeout(phase));
        }
        std::hint::spin_loop();
    }
}

/// Read the sensor's 40-bit reply frame.
fn read_frame(fd: &OwnedFd) -> Result<[u8; 5], SampleError> {
    wait_edge(fd, false, "sensor response start")?;
    wait_edge(fd, true, "sensor response high")?;
    wait_edge(fd, false, "first bit")?;

    let mut bytes = [0u8; 5];
    for i in 0..40 {
        wait_edge(fd, true, "bit high phase")?;
        let high = wait_edge(fd, false, "bit low phase")?;
        if high > BIT_ONE_THRESHOLD {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    Ok(bytes)
}

/// Decode and checksum a reply frame.
fn decode_frame(kind: SensorKind, bytes: [u8; 5]) -> Result<ClimateSample, SampleError> {
    let expected = bytes[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if expected != bytes[4] {
        return Err(SampleError::Checksum {
            expected,
            actual: bytes[4],
        });
    }

    let (temperature, humidity) = match kind {
        SensorKind::Dht11 => (
            f64::from(bytes[2]) + f64::from(bytes[3]) * 0.1,
            f64::from(bytes[0]) + f64::from(bytes[1]) * 0.1,
        ),
        SensorKind::Dht22 => {
            let humidity = f64::from(u16::from_be_bytes([bytes[0], bytes[1]])) / 10.0;
            let raw = u16::from_be_bytes([bytes[2], bytes[3]]);
            let magnitude = f64::from(raw & 0x7FFF) / 10.0;
            let temperature = if raw & 0x8000 != 0 {
                -magnitude
            } else {
                magnitude
            };
            (temperature, humidity)
        }
    };

    Ok(ClimateSample {
        temperature,
        humidity,
    })
}

// ─── Backend ────────────────────────────────────────────────────────

/// Backend over the Linux GPIO character device.
pub struct GpioChipBackend {
    chip: Option<File>,
    handles: HashMap<u32, OwnedFd>,
    sensor: Option<SensorConfig>,
}

/// Create a boxed gpiochip backend.
pub fn create_backend() -> Box<dyn GpioBackend> {
    Box::new(GpioChipBackend::new())
}

impl GpioChipBackend {
    /// Create an unopened backend; lines are claimed in `init()`.
    pub fn new() -> Self {
        Self {
            chip: None,
            handles: HashMap::new(),
            sensor: None,
        }
    }

    fn handle(&self, line: &Line) -> Result<&OwnedFd, HwError> {
        self.handles
            .get(&line.pin)
            .ok_or_else(|| HwError::HardwareFault {
                line: line.device.to_string(),
                reason: "line not claimed".to_string(),
            })
    }
}

impl Default for GpioChipBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBackend for GpioChipBackend {
    fn name(&self) -> &'static str {
        "gpiochip"
    }

    fn init(&mut self, registry: &LineRegistry, config: &NodeConfig) -> Result<(), HwError> {
        let chip = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.chip)
            .map_err(|e| HwError::HardwareFault {
                line: config.chip.clone(),
                reason: e.to_string(),
            })?;

        for line in registry.iter() {
            let flags = match line.direction {
                LineDirection::Input => HandleFlags::INPUT,
                LineDirection::Output => HandleFlags::OUTPUT,
            };
            let fd = request_line(&chip, line.pin, flags, false).map_err(|e| {
                HwError::HardwareFault {
                    line: line.device.to_string(),
                    reason: e.to_string(),
                }
            })?;
            debug!(device = %line.device, pin = line.pin, "line claimed");
            self.handles.insert(line.pin, fd);
        }

        info!(
            chip = %config.chip,
            lines = self.handles.len(),
            sensor_pin = config.sensor.pin,
            "gpiochip backend initialized"
        );
        self.sensor = Some(config.sensor);
        self.chip = Some(chip);
        Ok(())
    }

    fn read(&mut self, line: &Line) -> Result<bool, HwError> {
        ensure_direction(line, LineDirection::Input)?;
        let fd = self.handle(line)?;
        handle_get(fd).map_err(|e| HwError::HardwareFault {
            line: line.device.to_string(),
            reason: e.to_string(),
        })
    }

    fn write(&mut self, line: &Line, level: bool) -> Result<(), HwError> {
        ensure_direction(line, LineDirection::Output)?;
        let fd = self.handle(line)?;
        handle_set(fd, level).map_err(|e| HwError::HardwareFault {
            line: line.device.to_string(),
            reason: e.to_string(),
        })
    }

    fn sample_climate(&mut self) -> Result<ClimateSample, SampleError> {
        let chip = self
            .chip
            .as_ref()
            .ok_or_else(|| SampleError::Bus("backend not initialized".to_string()))?;
        let sensor = self
            .sensor
            .ok_or_else(|| SampleError::Bus("backend not initialized".to_string()))?;

        // Host start signal: hold the data line low, then release it and let
        // the pull-up raise the bus.
        let start = request_line(chip, sensor.pin, HandleFlags::OUTPUT, false)
            .map_err(|e| SampleError::Bus(e.to_string()))?;
        thread::sleep(start_low_duration(sensor.kind));
        drop(start);

        // The sensor answers 20–40 µs after release; a late input request
        // simply surfaces as Timeout and counts as a failed attempt.
        let data_line = request_line(chip, sensor.pin, HandleFlags::INPUT, false)
            .map_err(|e| SampleError::Bus(e.to_string()))?;
        let bytes = read_frame(&data_line)?;
        decode_frame(sensor.kind, bytes)
    }

    fn shutdown(&mut self) -> Result<(), HwError> {
        self.handles.clear();
        self.chip = None;
        self.sensor = None;
        Ok(())
    }
}
