#![doc = include_str!("../README.md")]

mod error;

pub mod config;
pub mod convert;
pub mod csv;
pub mod samples;
pub mod timestamp;
pub mod vectornav;

pub use config::Config;
pub use convert::{convert, convert_with, resolve_anchor, Summary};
pub use csv::{csv_path, TimestampedRow};
pub use error::{Error, Result};
pub use samples::{read_samples, Sample};
pub use timestamp::{period_ns, sample_count, Timestamper};
pub use vectornav::{extract_time_reference, Framer, Packet, TimeReference};
