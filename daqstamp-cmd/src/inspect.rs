use std::collections::BTreeMap;
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use daqstamp::vectornav::{CompositeData, Group, Header, Value};
use daqstamp::Packet;
use handlebars::handlebars_helper;
use hifitime::{Epoch, TimeScale};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Time {
    group: Group,
    gps_nanos: u64,
    gpst: String,
    utc: String,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    header: Header,
    length: usize,
    stored_checksum: String,
    checksum_residue: String,
    valid: bool,
    fields: BTreeMap<Group, BTreeMap<&'static str, Value>>,
    decode_error: Option<String>,
    time: Option<Time>,
}

fn summarize(fpath: &Path) -> Result<Info> {
    let reader = File::open(fpath).context("opening input")?;
    let packet = Packet::read(BufReader::new(reader)).context("reading first packet")?;
    debug!("{packet}");

    let (fields, time, decode_error) = match CompositeData::parse(&packet) {
        Ok(data) => {
            let time = data.time_gps().map(|tref| {
                let epoch = Epoch::from_gpst_nanoseconds(tref.gps_nanos);
                Time {
                    group: tref.group,
                    gps_nanos: tref.gps_nanos,
                    gpst: epoch.to_string(),
                    utc: epoch.in_time_scale(TimeScale::UTC).to_string(),
                }
            });
            (data.groups, time, None)
        }
        Err(err) => (BTreeMap::default(), None, Some(err.to_string())),
    };

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        length: packet.data.len(),
        stored_checksum: format!("{:#06x}", packet.stored_checksum()),
        checksum_residue: format!("{:#06x}", packet.checksum_residue()),
        valid: packet.is_valid(),
        header: packet.header,
        fields,
        decode_error,
        time,
    })
}

pub fn inspect(fpath: &Path, format: &Format) -> Result<()> {
    let info = summarize(fpath)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(json: |v: Json| v.to_string());
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("json", Box::new(json));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================
Groups:   {{ header.groups }}
Length:   {{ length }}
Checksum: {{ stored_checksum }} (residue {{ checksum_residue }}{{ #if valid }}, valid{{ else }}, INVALID{{ /if }})
{{ #if time }}GPS Time: {{ time.gps_nanos }} ({{ time.group }})
GPST:     {{ time.gpst }}
UTC:      {{ time.utc }}
{{ else }}GPS Time: none
{{ /if }}{{ #if decode_error }}Error:    {{ decode_error }}
{{ /if }}Fields:
{{ #each fields }}  {{ @key }}
{{ #each this }}    {{ @key }}: {{ json this }}
{{ /each }}{{ /each }}";
