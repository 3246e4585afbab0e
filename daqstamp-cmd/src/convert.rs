use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use daqstamp::{csv_path, Config};
use hifitime::{Epoch, TimeScale};
use tempfile::NamedTempFile;
use tracing::{debug, info};

fn output_path(daq: &Path, output: Option<&Path>) -> Result<PathBuf> {
    match output {
        Some(path) => Ok(path.to_path_buf()),
        None => csv_path(daq).context("deriving output path, use --output"),
    }
}

pub fn convert(
    daq: &Path,
    vectornav: &Path,
    config_path: &Path,
    output: Option<&Path>,
    clobber: bool,
) -> Result<()> {
    let output = output_path(daq, output)?;
    if !clobber && output.exists() {
        bail!("{output:?} exists; use --clobber");
    }

    let config = Config::from_file(config_path)
        .with_context(|| format!("loading config {config_path:?}"))?;
    debug!(
        rate = config.sample_rate_hz,
        channels = config.channel_count,
        "config"
    );

    let telemetry = File::open(vectornav)
        .with_context(|| format!("opening vectornav log {vectornav:?}"))?;
    let samples = File::open(daq).with_context(|| format!("opening daq log {daq:?}"))?;
    let sample_bytes = samples
        .metadata()
        .with_context(|| format!("reading size of {daq:?}"))?
        .len();

    // rows go to a temporary file next to the output that only replaces the
    // output once every row is written
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("creating temporary output in {dir:?}"))?;

    info!("converting {daq:?} to {output:?}");
    let mut writer = BufWriter::new(tmp);
    let summary = daqstamp::convert(
        BufReader::new(telemetry),
        BufReader::new(samples),
        sample_bytes,
        &config,
        &mut writer,
    )
    .with_context(|| format!("converting {daq:?} using {vectornav:?}"))?;
    let tmp = writer.into_inner().context("flushing output")?;

    let persisted = if clobber {
        tmp.persist(&output)
    } else {
        tmp.persist_noclobber(&output)
    };
    persisted.with_context(|| format!("writing output {output:?}"))?;

    let anchor = Epoch::from_gpst_nanoseconds(summary.anchor_ns);
    info!(
        "wrote {} samples, first sample at {} ({} GPST), period {}ns",
        summary.samples,
        anchor.in_time_scale(TimeScale::UTC),
        summary.anchor_ns,
        summary.period_ns
    );

    Ok(())
}
