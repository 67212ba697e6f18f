//! Structured text (JSON) observation encoding.
//!
//! Field-for-field equivalent to the binary form: the same struct is
//! serialized, so the two encodings cannot carry different fields.
//! `game_time` is omitted when absent, mirroring the binary optional
//! section.

use tether_core::{CodecError, Observation, TileInfo};

fn text_error(e: serde_json::Error) -> CodecError {
    CodecError::Text {
        reason: e.to_string(),
    }
}

/// Encode an observation as a compact JSON document.
///
/// Applies the same index range check as [`binary::encode`](crate::binary::encode).
pub fn encode(obs: &Observation) -> Result<String, CodecError> {
    crate::check_indices(obs)?;
    serde_json::to_string(obs).map_err(text_error)
}

/// Decode an observation from JSON.
pub fn decode(text: &str) -> Result<Observation, CodecError> {
    serde_json::from_str(text).map_err(text_error)
}

/// Encode a tile list as a JSON array.
pub fn encode_tiles(tiles: &[TileInfo]) -> Result<String, CodecError> {
    serde_json::to_string(tiles).map_err(text_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ActorState, ClockState, Direction, ItemIndex, TickId, TilePos};

    fn bare() -> Observation {
        Observation {
            tick: TickId(7),
            radius: 0,
            clock: ClockState::Paused,
            actor: ActorState {
                location: "Town".into(),
                position: TilePos::new(1, 2),
                facing: Direction::Up,
                health: 1,
                max_health: 2,
                energy: 3,
                max_energy: 4,
                money: 5,
                selected_slot: ItemIndex(0),
                inventory: Vec::new(),
            },
            surroundings: Vec::new(),
            game_time: None,
        }
    }

    #[test]
    fn absent_game_time_is_omitted() {
        let json = encode(&bare()).unwrap();
        assert!(!json.contains("game_time"));
        assert!(json.contains(r#""clock":"Paused""#));
        assert!(json.contains(r#""facing":"up""#));
        assert_eq!(decode(&json).unwrap(), bare());
    }

    #[test]
    fn malformed_text_is_a_codec_error() {
        assert!(matches!(decode("{"), Err(CodecError::Text { .. })));
    }
}
