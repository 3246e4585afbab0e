#![allow(dead_code)]
use std::path::PathBuf;

use daqstamp::vectornav::{checksum_trailer, Group, SYNC};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// Builds binary output packets. Fields must be added in group then bit order.
#[derive(Default)]
pub struct PacketBuilder {
    fields: Vec<(Group, u16)>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn field(mut self, group: Group, bit: u8, value: &[u8]) -> Self {
        match self.fields.iter_mut().find(|(g, _)| *g == group) {
            Some((_, word)) => *word |= 1 << bit,
            None => self.fields.push((group, 1 << bit)),
        }
        self.payload.extend_from_slice(value);
        self
    }

    pub fn time_gps(self, group: Group, gps_nanos: u64) -> Self {
        self.field(group, 1, &gps_nanos.to_le_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        let groups = self.fields.iter().fold(0u8, |acc, (g, _)| acc | g.mask());
        let mut dat = vec![SYNC, groups];
        for (_, word) in &self.fields {
            dat.extend_from_slice(&word.to_le_bytes());
        }
        dat.extend_from_slice(&self.payload);
        let trailer = checksum_trailer(&dat[1..]);
        dat.extend_from_slice(&trailer);
        dat
    }
}

/// Little-endian sample data.
pub fn encode_samples(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
