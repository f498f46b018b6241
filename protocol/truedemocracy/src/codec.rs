//! Stored values are bincode (fixed-width integers, no trailing bytes)
//! behind a 4-byte big-endian length prefix.

use crate::error::{Error, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

const PREFIX_LEN: usize = 4;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let body = options().serialize(value)?;
    let len = u32::try_from(body.len()).map_err(|_| Error::logic("codec: value too large"))?;
    let mut out = Vec::with_capacity(PREFIX_LEN + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < PREFIX_LEN {
        return Err(Error::logic("codec: missing length prefix"));
    }
    let (prefix, body) = bytes.split_at(PREFIX_LEN);
    let mut len = [0u8; PREFIX_LEN];
    len.copy_from_slice(prefix);
    if u32::from_be_bytes(len) as usize != body.len() {
        return Err(Error::logic("codec: length prefix mismatch"));
    }
    Ok(options().deserialize(body)?)
}
