//! Observation capture and encoding for the Tether control bridge.
//!
//! [`capture`] reads a facade once and produces a canonical
//! [`Observation`](tether_core::Observation). [`binary`] and [`text`]
//! encode that single value, so the two encodings always agree.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binary;
pub mod capture;
pub mod text;

pub use capture::{capture, shape};

use tether_core::{CodecError, ItemIndex, Observation};

/// Which encoding to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObsFormat {
    /// Compact little-endian binary ("TOBS").
    Binary,
    /// JSON text.
    Text,
}

/// An encoded observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoded {
    /// Output of [`binary::encode`].
    Binary(Vec<u8>),
    /// Output of [`text::encode`].
    Text(String),
}

/// Encode an observation in the requested format.
pub fn encode(obs: &Observation, format: ObsFormat) -> Result<Encoded, CodecError> {
    match format {
        ObsFormat::Binary => binary::encode(obs).map(Encoded::Binary),
        ObsFormat::Text => text::encode(obs).map(Encoded::Text),
    }
}

/// Reject inventory indices that do not fit the binary `u32` width.
///
/// Both encoders call this first so an observation is encodable in
/// either format or in neither.
pub(crate) fn check_indices(obs: &Observation) -> Result<(), CodecError> {
    let fits = |i: ItemIndex| u32::try_from(i.0).is_ok();
    if !fits(obs.actor.selected_slot) {
        return Err(CodecError::TooLarge {
            field: "actor.selected_slot",
        });
    }
    if !obs.actor.inventory.iter().all(|slot| fits(slot.index)) {
        return Err(CodecError::TooLarge {
            field: "inventory.index",
        });
    }
    Ok(())
}

/// Decode either encoding back into an observation.
pub fn decode(encoded: &Encoded) -> Result<Observation, CodecError> {
    match encoded {
        Encoded::Binary(b) => binary::decode(b),
        Encoded::Text(t) => text::decode(t),
    }
}
