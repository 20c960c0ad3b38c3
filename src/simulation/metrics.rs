use crate::types::SimulationMetrics;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const TIME_ELAPSED: &str = "Time Elapsed (s):";
pub const ENERGY_CONSUMPTION: &str = "Energy Consumption (W):";
pub const INITIAL_VELOCITY: &str = "Initial Velocity (m/s):";
pub const FINAL_VELOCITY: &str = "Final Velocity (m/s):";
pub const MAX_VELOCITY: &str = "Max Velocity (m/s):";
pub const MIN_VELOCITY: &str = "Min Velocity (m/s):";
pub const MAX_ACCELERATION: &str = "Max Acceleration (m/s^2):";
pub const MIN_ACCELERATION: &str = "Min Acceleration (m/s^2):";
pub const MAX_CENTRIPETAL_FORCE: &str = "Max Centripetal Force (N):";
pub const EXPECTED_ARGUMENT_COUNT: &str = "Expected argument count:";

const KNOWN_MARKERS: [&str; 10] = [
    TIME_ELAPSED,
    ENERGY_CONSUMPTION,
    INITIAL_VELOCITY,
    FINAL_VELOCITY,
    MAX_VELOCITY,
    MIN_VELOCITY,
    MAX_ACCELERATION,
    MIN_ACCELERATION,
    MAX_CENTRIPETAL_FORCE,
    EXPECTED_ARGUMENT_COUNT,
];

/// Patterns for the simulator's own markers, compiled once per process.
static MARKER_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    KNOWN_MARKERS
        .iter()
        .filter_map(|&marker| marker_pattern(marker).ok().map(|re| (marker, re)))
        .collect()
});

fn marker_pattern(marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}([^\n]*)", regex::escape(marker)))
}

/// Failure to pull one value out of simulator output
#[derive(Debug, Clone, PartialEq)]
pub enum MetricError {
    MissingMarker { marker: String },
    InvalidNumber { marker: String, value: String },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetricError::MissingMarker { marker } => {
                write!(f, "marker '{}' not found in simulator output", marker)
            }
            MetricError::InvalidNumber { marker, value } => {
                write!(f, "value '{}' after marker '{}' is not a number", value, marker)
            }
        }
    }
}

impl std::error::Error for MetricError {}

/// Parse the value that follows the first occurrence of `marker`, up to the end of that line.
///
/// Surrounding whitespace is ignored; anything else that is not part of the
/// literal is rejected.
pub fn parse_value<T: FromStr>(marker: &str, output: &str) -> Result<T, MetricError> {
    let compiled;
    let pattern = match MARKER_PATTERNS.get(marker) {
        Some(re) => re,
        None => {
            compiled = marker_pattern(marker).map_err(|_| MetricError::MissingMarker {
                marker: marker.to_string(),
            })?;
            &compiled
        }
    };

    let raw = pattern
        .captures(output)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| MetricError::MissingMarker {
            marker: marker.to_string(),
        })?
        .as_str()
        .trim();

    raw.parse::<T>().map_err(|_| MetricError::InvalidNumber {
        marker: marker.to_string(),
        value: raw.to_string(),
    })
}

/// Parse a single floating point metric.
pub fn parse_metric(marker: &str, output: &str) -> Result<f64, MetricError> {
    parse_value::<f64>(marker, output)
}

impl SimulationMetrics {
    /// Extract all nine metrics; the first failure aborts the whole record.
    pub fn from_output(output: &str) -> Result<Self, MetricError> {
        Ok(Self {
            time_elapsed: parse_metric(TIME_ELAPSED, output)?,
            energy_consumption: parse_metric(ENERGY_CONSUMPTION, output)?,
            initial_velocity: parse_metric(INITIAL_VELOCITY, output)?,
            final_velocity: parse_metric(FINAL_VELOCITY, output)?,
            max_velocity: parse_metric(MAX_VELOCITY, output)?,
            min_velocity: parse_metric(MIN_VELOCITY, output)?,
            max_acceleration: parse_metric(MAX_ACCELERATION, output)?,
            min_acceleration: parse_metric(MIN_ACCELERATION, output)?,
            max_centripetal_force: parse_metric(MAX_CENTRIPETAL_FORCE, output)?,
        })
    }
}
