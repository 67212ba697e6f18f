//! Argument codec: string tokens to validated primitive values.
//!
//! Remote calls arrive with every argument encoded as a string. The
//! functions here turn those tokens into [`TypedArgument`]s, or fail with
//! an [`ArgError`] naming the offending token's position. Decoding is pure
//! and never touches the simulation.
//!
//! Token grammar:
//! - **Integer**: optional `-`, then one or more ASCII digits; must fit `i32`.
//! - **ItemIndex**: an Integer that is not negative.
//! - **Direction**: `up`, `down`, `left` or `right`, ASCII case-insensitive.
//! - **CoordinatePair**: two Integer tokens, decoded independently.
//! - **FreeText**: any non-empty token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgError;
use crate::id::{Direction, ItemIndex, TilePos};

/// The kind of value a command expects at an argument position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Signed base-10 integer.
    Integer,
    /// Cardinal direction token.
    Direction,
    /// Two integer tokens forming a tile coordinate.
    CoordinatePair,
    /// Non-negative index (inventory slot, shop listing, dialogue option).
    ItemIndex,
    /// Arbitrary non-empty text.
    FreeText,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Direction => "direction",
            Self::CoordinatePair => "coordinate pair",
            Self::ItemIndex => "item index",
            Self::FreeText => "text",
        })
    }
}

/// A decoded argument value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedArgument {
    /// A signed integer.
    Integer(i32),
    /// A cardinal direction.
    Direction(Direction),
    /// A tile coordinate.
    Coordinate(TilePos),
    /// A non-negative index.
    Item(ItemIndex),
    /// Free text.
    Text(String),
}

/// Decode a single base-10 integer token.
pub fn decode_integer(position: usize, token: &str) -> Result<i32, ArgError> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ArgError::Malformed {
            position,
            token: token.to_string(),
            expected: ArgKind::Integer,
        });
    }
    token.parse::<i32>().map_err(|_| ArgError::OutOfRange {
        position,
        token: token.to_string(),
        reason: format!("must fit in [{}, {}]", i32::MIN, i32::MAX),
    })
}

/// Decode a non-negative index token.
pub fn decode_index(position: usize, token: &str) -> Result<usize, ArgError> {
    let value = decode_integer(position, token).map_err(|e| match e {
        ArgError::Malformed { position, token, .. } => ArgError::Malformed {
            position,
            token,
            expected: ArgKind::ItemIndex,
        },
        other => other,
    })?;
    usize::try_from(value).map_err(|_| ArgError::OutOfRange {
        position,
        token: token.to_string(),
        reason: "must not be negative".into(),
    })
}

/// Decode a direction token.
pub fn decode_direction(position: usize, token: &str) -> Result<Direction, ArgError> {
    Direction::from_token(token).ok_or_else(|| ArgError::Malformed {
        position,
        token: token.to_string(),
        expected: ArgKind::Direction,
    })
}

/// Decode a free-text token.
pub fn decode_text(position: usize, token: &str) -> Result<String, ArgError> {
    if token.is_empty() {
        return Err(ArgError::Malformed {
            position,
            token: String::new(),
            expected: ArgKind::FreeText,
        });
    }
    Ok(token.to_string())
}

/// Decode one single-token argument of the given kind.
///
/// [`ArgKind::CoordinatePair`] spans two tokens; use
/// [`ArgCursor::decode`] for it.
pub fn decode(position: usize, token: &str, kind: ArgKind) -> Result<TypedArgument, ArgError> {
    match kind {
        ArgKind::Integer => decode_integer(position, token).map(TypedArgument::Integer),
        ArgKind::Direction => decode_direction(position, token).map(TypedArgument::Direction),
        ArgKind::ItemIndex => decode_index(position, token).map(|i| TypedArgument::Item(ItemIndex(i))),
        ArgKind::FreeText => decode_text(position, token).map(TypedArgument::Text),
        ArgKind::CoordinatePair => Err(ArgError::Malformed {
            position,
            token: token.to_string(),
            expected: ArgKind::CoordinatePair,
        }),
    }
}

/// Sequential reader over a command's argument tokens.
///
/// Each accessor consumes the next token(s) and records the position for
/// error reporting. Call [`finish`](ArgCursor::finish) once the command's
/// arguments have been read to reject trailing tokens.
pub struct ArgCursor<'a, S> {
    tokens: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> ArgCursor<'a, S> {
    /// Start reading at the first token.
    pub fn new(tokens: &'a [S]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next_token(&mut self, expected: ArgKind) -> Result<(usize, &'a str), ArgError> {
        let position = self.pos;
        let token = self
            .tokens
            .get(position)
            .ok_or(ArgError::Missing { position, expected })?;
        self.pos += 1;
        Ok((position, token.as_ref()))
    }

    /// Decode the next argument of the given kind.
    pub fn decode(&mut self, kind: ArgKind) -> Result<TypedArgument, ArgError> {
        match kind {
            ArgKind::CoordinatePair => self.coordinate().map(TypedArgument::Coordinate),
            single => {
                let (position, token) = self.next_token(single)?;
                decode(position, token, single)
            }
        }
    }

    /// Next token as an integer.
    pub fn integer(&mut self) -> Result<i32, ArgError> {
        let (position, token) = self.next_token(ArgKind::Integer)?;
        decode_integer(position, token)
    }

    /// Next token as an integer no smaller than `min`.
    pub fn integer_at_least(&mut self, min: i32) -> Result<i32, ArgError> {
        let (position, token) = self.next_token(ArgKind::Integer)?;
        let value = decode_integer(position, token)?;
        if value < min {
            return Err(ArgError::OutOfRange {
                position,
                token: token.to_string(),
                reason: format!("must be at least {min}"),
            });
        }
        Ok(value)
    }

    /// Next token as a non-negative index.
    pub fn index(&mut self) -> Result<usize, ArgError> {
        let (position, token) = self.next_token(ArgKind::ItemIndex)?;
        decode_index(position, token)
    }

    /// Next token as an inventory slot.
    pub fn item(&mut self) -> Result<ItemIndex, ArgError> {
        self.index().map(ItemIndex)
    }

    /// Next token as a direction.
    pub fn direction(&mut self) -> Result<Direction, ArgError> {
        let (position, token) = self.next_token(ArgKind::Direction)?;
        decode_direction(position, token)
    }

    /// Next two tokens as a tile coordinate.
    pub fn coordinate(&mut self) -> Result<TilePos, ArgError> {
        let (px, tx) = self.next_token(ArgKind::CoordinatePair)?;
        let (py, ty) = self.next_token(ArgKind::CoordinatePair)?;
        let x = decode_integer(px, tx)?;
        let y = decode_integer(py, ty)?;
        Ok(TilePos::new(x, y))
    }

    /// Next token as free text.
    pub fn text(&mut self) -> Result<String, ArgError> {
        let (position, token) = self.next_token(ArgKind::FreeText)?;
        decode_text(position, token)
    }

    /// All remaining tokens as free text (possibly none).
    pub fn rest_text(&mut self) -> Result<Vec<String>, ArgError> {
        let mut out = Vec::with_capacity(self.tokens.len().saturating_sub(self.pos));
        while self.pos < self.tokens.len() {
            out.push(self.text()?);
        }
        Ok(out)
    }

    /// Fail if any tokens remain unread.
    pub fn finish(self) -> Result<(), ArgError> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(token) => Err(ArgError::Unexpected {
                position: self.pos,
                token: token.as_ref().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_strict_base_10() {
        assert_eq!(decode_integer(0, "42"), Ok(42));
        assert_eq!(decode_integer(0, "-7"), Ok(-7));
        assert_eq!(decode_integer(0, "007"), Ok(7));
        for bad in ["", "-", "+3", " 3", "3 ", "0x10", "1.5", "1e3", "--1", "٣"] {
            assert!(
                matches!(decode_integer(2, bad), Err(ArgError::Malformed { position: 2, .. })),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn integer_overflow_is_out_of_range() {
        let err = decode_integer(0, "2147483648").unwrap_err();
        assert!(matches!(err, ArgError::OutOfRange { .. }));
        assert_eq!(decode_integer(0, "-2147483648"), Ok(i32::MIN));
    }

    #[test]
    fn index_rejects_negative() {
        assert_eq!(decode_index(0, "3"), Ok(3));
        assert!(matches!(
            decode_index(1, "-1"),
            Err(ArgError::OutOfRange { position: 1, .. })
        ));
        assert!(matches!(
            decode_index(0, "x"),
            Err(ArgError::Malformed {
                expected: ArgKind::ItemIndex,
                ..
            })
        ));
    }

    #[test]
    fn decode_dispatches_by_kind() {
        assert_eq!(
            decode(0, "Down", ArgKind::Direction),
            Ok(TypedArgument::Direction(Direction::Down))
        );
        assert_eq!(
            decode(0, "5", ArgKind::ItemIndex),
            Ok(TypedArgument::Item(ItemIndex(5)))
        );
        assert_eq!(
            decode(0, "Parsnip Seeds", ArgKind::FreeText),
            Ok(TypedArgument::Text("Parsnip Seeds".into()))
        );
        assert!(decode(0, "", ArgKind::FreeText).is_err());
    }

    #[test]
    fn cursor_reads_coordinate_pairs() {
        let tokens = ["3", "-4"];
        let mut c = ArgCursor::new(&tokens);
        assert_eq!(
            c.decode(ArgKind::CoordinatePair),
            Ok(TypedArgument::Coordinate(TilePos::new(3, -4)))
        );
        assert!(c.finish().is_ok());
    }

    #[test]
    fn cursor_reports_bad_second_coordinate_position() {
        let tokens = ["3", "y"];
        let mut c = ArgCursor::new(&tokens);
        assert!(matches!(
            c.coordinate(),
            Err(ArgError::Malformed { position: 1, .. })
        ));
    }

    #[test]
    fn cursor_reports_missing_and_extra_tokens() {
        let tokens: [&str; 1] = ["1"];
        let mut c = ArgCursor::new(&tokens);
        assert!(matches!(
            c.coordinate(),
            Err(ArgError::Missing {
                position: 1,
                expected: ArgKind::CoordinatePair
            })
        ));

        let tokens = ["up", "down"];
        let mut c = ArgCursor::new(&tokens);
        c.direction().unwrap();
        assert_eq!(
            c.finish(),
            Err(ArgError::Unexpected {
                position: 1,
                token: "down".into()
            })
        );
    }

    #[test]
    fn rest_text_accepts_zero_or_more() {
        let tokens: [String; 0] = [];
        let mut c = ArgCursor::new(&tokens);
        assert_eq!(c.rest_text(), Ok(vec![]));

        let tokens = ["a".to_string(), "b".to_string()];
        let mut c = ArgCursor::new(&tokens);
        assert_eq!(c.rest_text(), Ok(vec!["a".to_string(), "b".to_string()]));
        assert!(c.finish().is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_i32_round_trips(v in any::<i32>()) {
                prop_assert_eq!(decode_integer(0, &v.to_string()), Ok(v));
            }

            #[test]
            fn padded_integers_never_decode(v in any::<i32>(), pad in "[ \t]{1,3}") {
                let leading = format!("{pad}{v}");
                let trailing = format!("{v}{pad}");
                prop_assert!(decode_integer(0, &leading).is_err());
                prop_assert!(decode_integer(0, &trailing).is_err());
            }

            #[test]
            fn arbitrary_text_never_panics(s in ".*") {
                let _ = decode_integer(0, &s);
                let _ = decode_direction(0, &s);
                let _ = decode_index(0, &s);
            }
        }
    }
}
