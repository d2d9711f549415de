// Canonical expected-output writer: the valid dictionary as one JSON object.
use std::io::Write;

use crate::core::dictionary::Dictionary;
use crate::core::error::{Error, ErrorKind};

pub fn write_canonical<W: Write>(out: W, dict: &Dictionary, pretty: bool) -> Result<(), Error> {
    let result = if pretty {
        serde_json::to_writer_pretty(out, dict)
    } else {
        serde_json::to_writer(out, dict)
    };
    result.map_err(|err| {
        let kind = if err.is_io() {
            ErrorKind::Io
        } else {
            ErrorKind::Internal
        };
        Error::new(kind)
            .with_message("failed to write canonical json")
            .with_source(err)
    })
}

pub fn to_canonical_string(dict: &Dictionary, pretty: bool) -> Result<String, Error> {
    let mut out = Vec::new();
    write_canonical(&mut out, dict, pretty)?;
    String::from_utf8(out).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("canonical json is not utf-8")
            .with_source(err)
    })
}
