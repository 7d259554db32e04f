//! Bounded-retry climate sensor acquisition.
//!
//! One `acquire()` call is one complete attempt sequence: up to `attempts`
//! samples with a fixed delay in between, stopping at the first plausible
//! pair. Exhaustion is a typed outcome, never a silently defaulted reading.
//! No state carries over between calls — every external request gets its own
//! fresh sequence.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use domo_common::config::SensorConfig;
use domo_common::error::HwError;
use domo_common::io::backend::{ClimateSample, GpioBackend, SampleError};
use domo_common::snapshot::SensorReading;

/// Retry policy for climate acquisition.
#[derive(Debug, Clone, Copy)]
pub struct ClimateAcquirer {
    attempts: u32,
    delay: Duration,
}

impl ClimateAcquirer {
    /// Create an acquirer with an explicit policy.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Build the policy from sensor config.
    pub fn from_config(sensor: &SensorConfig) -> Self {
        Self::new(sensor.attempts, sensor.retry_delay())
    }

    /// The configured attempt bound.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run one bounded attempt sequence against the backend.
    ///
    /// Returns the first plausible reading, or `AcquisitionFailed` once the
    /// bound is exhausted. The inter-attempt delay runs on the caller's
    /// thread; the controller holds the bus lock across it.
    pub fn acquire(&self, backend: &mut dyn GpioBackend) -> Result<SensorReading, HwError> {
        for attempt in 1..=self.attempts {
            match backend.sample_climate().and_then(plausible) {
                Ok(sample) => {
                    debug!(
                        attempt,
                        temperature = sample.temperature,
                        humidity = sample.humidity,
                        "climate acquired"
                    );
                    return Ok(SensorReading {
                        temperature: sample.temperature,
                        humidity: sample.humidity,
                        valid_at: Utc::now(),
                    });
                }
                Err(err) => debug!(attempt, %err, "acquisition attempt failed"),
            }
            if attempt < self.attempts {
                thread::sleep(self.delay);
            }
        }
        warn!(attempts = self.attempts, "climate acquisition exhausted");
        Err(HwError::AcquisitionFailed {
            attempts: self.attempts,
        })
    }
}

/// Reject pairs outside the sensor family's physical range.
fn plausible(sample: ClimateSample) -> Result<ClimateSample, SampleError> {
    if (-40.0..=80.0).contains(&sample.temperature) && (0.0..=100.0).contains(&sample.humidity) {
        Ok(sample)
    } else {
        Err(SampleError::OutOfRange {
            temperature: sample.temperature,
            humidity: sample.humidity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sim::SimBackend;
    use domo_common::config::NodeConfig;
    use domo_common::io::registry::LineRegistry;

    fn sim() -> (SimBackend, crate::backends::sim::SimHandle) {
        let config = NodeConfig::default();
        let registry = LineRegistry::from_config(&config).unwrap();
        let (mut backend, handle) = SimBackend::with_handle();
        backend.init(&registry, &config).unwrap();
        (backend, handle)
    }

    fn fast(attempts: u32) -> ClimateAcquirer {
        ClimateAcquirer::new(attempts, Duration::ZERO)
    }

    #[test]
    fn first_attempt_success_stops_early() {
        let (mut backend, handle) = sim();
        let reading = fast(15).acquire(&mut backend).unwrap();
        assert_eq!(reading.temperature, 22.5);
        assert_eq!(reading.humidity, 40.0);
        assert_eq!(handle.sample_calls(), 1);
    }

    #[test]
    fn retries_until_first_valid_pair() {
        let (mut backend, handle) = sim();
        handle.push_sample(Err(SampleError::Timeout("sensor response start")));
        handle.push_sample(Err(SampleError::Checksum {
            expected: 0x41,
            actual: 0x40,
        }));
        handle.push_sample(Ok(ClimateSample {
            temperature: 19.0,
            humidity: 61.0,
        }));

        let reading = fast(15).acquire(&mut backend).unwrap();
        assert_eq!(reading.temperature, 19.0);
        assert_eq!(handle.sample_calls(), 3);
    }

    #[test]
    fn exhaustion_is_a_typed_failure() {
        let (mut backend, handle) = sim();
        handle.clear_climate();
        let err = fast(5).acquire(&mut backend).unwrap_err();
        assert!(matches!(err, HwError::AcquisitionFailed { attempts: 5 }));
        assert_eq!(handle.sample_calls(), 5);
    }

    #[test]
    fn implausible_pair_counts_as_a_failed_attempt() {
        let (mut backend, handle) = sim();
        handle.push_sample(Ok(ClimateSample {
            temperature: 120.0,
            humidity: 40.0,
        }));
        handle.push_sample(Ok(ClimateSample {
            temperature: 21.0,
            humidity: 130.0,
        }));

        let reading = fast(15).acquire(&mut backend).unwrap();
        // both queued pairs rejected; steady value accepted on attempt 3
        assert_eq!(reading.temperature, 22.5);
        assert_eq!(handle.sample_calls(), 3);
    }

    #[test]
    fn zero_attempts_fails_immediately() {
        let (mut backend, handle) = sim();
        let err = fast(0).acquire(&mut backend).unwrap_err();
        assert!(matches!(err, HwError::AcquisitionFailed { attempts: 0 }));
        assert_eq!(handle.sample_calls(), 0);
    }

    #[test]
    fn fresh_sequence_per_call() {
        let (mut backend, handle) = sim();
        handle.clear_climate();
        let acquirer = fast(3);
        assert!(acquirer.acquire(&mut backend).is_err());
        assert!(acquirer.acquire(&mut backend).is_err());
        // 3 attempts each, nothing carried over
        assert_eq!(handle.sample_calls(), 6);
    }
}
