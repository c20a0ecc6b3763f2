//! Text wire format for [`SparseUpdate`]s.
//!
//! A message is a JSON object with exactly two fields, `indices` and
//! `params`. In the default [`WireFormat::Nested`] layout each field holds a
//! JSON array that was itself serialized to a string:
//!
//! ```text
//! {"indices":"[4, 1, 7]","params":"[0.25, -1.5, 3.0]"}
//! ```
//!
//! [`WireFormat::Flat`] drops the inner string layer:
//!
//! ```text
//! {"indices":[4,1,7],"params":[0.25,-1.5,3.0]}
//! ```

use crate::error::SharingError;
use crate::update::SparseUpdate;
use serde::{Deserialize, Serialize};

/// Field layout on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Each field's array is JSON-encoded into a string first. Compatible
    /// with peers that expect string-valued fields.
    #[default]
    Nested,
    /// Arrays embedded directly in the outer object.
    Flat,
}

/// Outer object of a [`WireFormat::Nested`] message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireMessage {
    pub indices: String,
    pub params: String,
}

#[derive(Serialize)]
struct FlatOut<'a> {
    indices: &'a [usize],
    params: &'a [f32],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FlatIn {
    indices: Vec<i64>,
    params: Vec<f32>,
}

/// Encodes and decodes [`SparseUpdate`]s for a model with `flat_len`
/// parameters.
#[derive(Debug, Clone, Copy)]
pub struct SparseCodec {
    flat_len: usize,
    format: WireFormat,
}

impl SparseCodec {
    pub fn new(flat_len: usize, format: WireFormat) -> Self {
        Self { flat_len, format }
    }

    pub fn flat_len(&self) -> usize {
        self.flat_len
    }

    /// Serialize `update` to wire bytes.
    ///
    /// Non-finite values have no JSON literal and are refused.
    pub fn encode(&self, update: &SparseUpdate) -> Result<Vec<u8>, SharingError> {
        if let Some(pos) = update.values().iter().position(|v| !v.is_finite()) {
            return Err(SharingError::MalformedMessage(format!(
                "non-finite value at flat index {}",
                update.indices()[pos]
            )));
        }
        let bytes = match self.format {
            WireFormat::Nested => serde_json::to_vec(&WireMessage {
                indices: serde_json::to_string(update.indices())?,
                params: serde_json::to_string(update.values())?,
            })?,
            WireFormat::Flat => serde_json::to_vec(&FlatOut {
                indices: update.indices(),
                params: update.values(),
            })?,
        };
        Ok(bytes)
    }

    /// Parse wire bytes back into a validated [`SparseUpdate`].
    ///
    /// Structural problems (bad JSON, missing fields, unequal lengths,
    /// values that overflow to a non-finite `f32`) are
    /// [`SharingError::MalformedMessage`]; indices outside `[0, flat_len)` are
    /// [`SharingError::InvalidIndex`].
    pub fn decode(&self, bytes: &[u8]) -> Result<SparseUpdate, SharingError> {
        let (raw_indices, values) = match self.format {
            WireFormat::Nested => {
                let msg: WireMessage = parse(bytes, "message")?;
                let indices: Vec<i64> = parse(msg.indices.as_bytes(), "indices")?;
                let values: Vec<f32> = parse(msg.params.as_bytes(), "params")?;
                (indices, values)
            }
            WireFormat::Flat => {
                let msg: FlatIn = parse(bytes, "message")?;
                (msg.indices, msg.params)
            }
        };

        if raw_indices.len() != values.len() {
            return Err(SharingError::MalformedMessage(format!(
                "{} indices but {} values",
                raw_indices.len(),
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(SharingError::MalformedMessage(format!(
                "non-finite value for flat index {}",
                raw_indices[pos]
            )));
        }

        let mut indices = Vec::with_capacity(raw_indices.len());
        for index in raw_indices {
            match usize::try_from(index) {
                Ok(i) if i < self.flat_len => indices.push(i),
                _ => {
                    return Err(SharingError::InvalidIndex {
                        index,
                        len: self.flat_len,
                    })
                }
            }
        }

        SparseUpdate::new(indices, values)
    }
}

fn parse<'a, T: Deserialize<'a>>(bytes: &'a [u8], what: &str) -> Result<T, SharingError> {
    serde_json::from_slice(bytes)
        .map_err(|e| SharingError::MalformedMessage(format!("cannot parse {what}: {e}")))
}
