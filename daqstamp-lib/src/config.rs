//! Acquisition configuration.
//!
//! Configuration is a YAML document with a `daq` section:
//!
//! ```yaml
//! daq:
//!   rate: 200      # samples per second
//!   chan_num: 4    # channels per sample
//! ```
//!
//! Other sections and keys are ignored.
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct RawConfig {
    daq: RawDaq,
}

#[derive(Debug, Deserialize)]
struct RawDaq {
    rate: f64,
    chan_num: usize,
}

/// Largest supported number of channels per sample.
pub const MAX_CHANNELS: usize = 65_536;

/// Validated acquisition parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Samples per second, finite and positive
    pub sample_rate_hz: f64,
    /// `f64` channels per sample, at least one
    pub channel_count: usize,
}

impl Config {
    /// # Errors
    /// [Error::Config] if the rate is not a finite positive number, the rate is
    /// too high or too low for a whole nanosecond period, or the channel count
    /// is not in `1..=MAX_CHANNELS`.
    pub fn new(sample_rate_hz: f64, channel_count: usize) -> Result<Config> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(Error::Config(format!(
                "daq.rate must be a positive number, got {sample_rate_hz}"
            )));
        }
        let period = crate::timestamp::period_ns(sample_rate_hz);
        if period == 0 || period == u64::MAX {
            return Err(Error::Config(format!(
                "daq.rate {sample_rate_hz} does not give a sample period in nanoseconds"
            )));
        }
        if channel_count == 0 {
            return Err(Error::Config("daq.chan_num must be at least 1".to_string()));
        }
        if channel_count > MAX_CHANNELS {
            return Err(Error::Config(format!(
                "daq.chan_num must be at most {MAX_CHANNELS}, got {channel_count}"
            )));
        }
        Ok(Config {
            sample_rate_hz,
            channel_count,
        })
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    /// [Error::Yaml] if the text is not a YAML document, [Error::Config] if
    /// `daq.rate` or `daq.chan_num` is missing, of the wrong type, or out of range.
    pub fn from_yaml(text: &str) -> Result<Config> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
        let raw: RawConfig = serde_yaml::from_value(doc)
            .map_err(|e| Error::Config(format!("invalid daq section: {e}")))?;
        debug!(rate = raw.daq.rate, chan_num = raw.daq.chan_num, "parsed config");
        Config::new(raw.daq.rate, raw.daq.chan_num)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    /// [Error::Config] if the file cannot be read, otherwise as [Config::from_yaml].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Config::from_yaml(&text)
    }

    /// Bytes in one sample slice.
    #[must_use]
    pub fn slice_len(&self) -> usize {
        crate::timestamp::CHANNEL_WIDTH * self.channel_count
    }

    #[must_use]
    pub fn period_ns(&self) -> u64 {
        crate::timestamp::period_ns(self.sample_rate_hz)
    }
}
