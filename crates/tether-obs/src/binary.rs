//! Compact binary observation encoding.
//!
//! All integers are little-endian. Strings are a `u32` byte length
//! followed by UTF-8 bytes. Options are a presence byte (0 or 1)
//! followed by the value when present. Booleans are one byte.
//!
//! Wire format:
//! ```text
//! [4 bytes] magic "TOBS"
//! [2 bytes] version (LE u16)
//! [8 bytes] tick (LE u64)
//! [4 bytes] radius (LE u32)
//! [1 byte]  clock (0=Running, 1=Paused)
//! actor:
//!   str     location
//!   i32 i32 position x, y
//!   [1 byte] facing (0=up, 1=down, 2=left, 3=right)
//!   i32 ×4  health, max_health, energy, max_energy
//!   i64     money
//!   u32     selected_slot
//!   u32     n_slots, then per slot:
//!     u32   index
//!     opt   { str name, str category, u32 stack, bool attachable }
//! u32 n_tiles, then per tile:
//!   i32 i32 position x, y
//!   str     terrain
//!   opt str object
//!   opt str npc
//!   bool    passable
//! optional sections, each a one-byte tag then a u32 body length:
//!   [1] game_time: u32 day, u32 time_of_day
//! ```
//!
//! A payload may end after the tile list or after any complete optional
//! section. New fields are only ever added as new trailing sections.
//! Decoders skip sections whose tag they do not know, and ignore bytes
//! past the fields they read inside a known section.

use tether_core::{
    ActorState, ClockState, CodecError, Direction, GameTime, InventoryItem, InventorySlot,
    ItemIndex, Observation, TickId, TileInfo, TilePos,
};

const MAGIC: &[u8; 4] = b"TOBS";
const VERSION: u16 = 1;

// Optional section tags
const SECTION_GAME_TIME: u8 = 1;

/// Encode an observation to bytes.
///
/// Returns `Err` only if a length or index exceeds its wire-format width.
pub fn encode(obs: &Observation) -> Result<Vec<u8>, CodecError> {
    crate::check_indices(obs)?;
    let mut w = Writer::with_capacity(64 + obs.surroundings.len() * 24);

    // Header
    w.bytes(MAGIC);
    w.u16(VERSION);
    w.u64(obs.tick.0);
    w.u32(obs.radius);
    w.u8(obs.clock.tag());

    write_actor(&mut w, &obs.actor)?;

    w.len("surroundings", obs.surroundings.len())?;
    for tile in &obs.surroundings {
        write_tile(&mut w, tile)?;
    }

    if let Some(gt) = &obs.game_time {
        let mut body = Writer::with_capacity(8);
        body.u32(gt.day);
        body.u32(gt.time_of_day);
        w.section(SECTION_GAME_TIME, body)?;
    }

    Ok(w.finish())
}

fn write_actor(w: &mut Writer, actor: &ActorState) -> Result<(), CodecError> {
    w.str("actor.location", &actor.location)?;
    w.pos(actor.position);
    w.u8(actor.facing.tag());
    w.i32(actor.health);
    w.i32(actor.max_health);
    w.i32(actor.energy);
    w.i32(actor.max_energy);
    w.i64(actor.money);
    w.index("actor.selected_slot", actor.selected_slot)?;

    w.len("actor.inventory", actor.inventory.len())?;
    for slot in &actor.inventory {
        w.index("inventory.index", slot.index)?;
        match &slot.item {
            None => w.u8(0),
            Some(item) => {
                w.u8(1);
                w.str("item.name", &item.name)?;
                w.str("item.category", &item.category)?;
                w.u32(item.stack);
                w.bool(item.attachable);
            }
        }
    }
    Ok(())
}

fn write_tile(w: &mut Writer, tile: &TileInfo) -> Result<(), CodecError> {
    w.pos(tile.position);
    w.str("tile.terrain", &tile.terrain)?;
    w.opt_str("tile.object", tile.object.as_deref())?;
    w.opt_str("tile.npc", tile.npc.as_deref())?;
    w.bool(tile.passable);
    Ok(())
}

/// Decode an observation from bytes.
pub fn decode(bytes: &[u8]) -> Result<Observation, CodecError> {
    let mut r = Reader::new(bytes);

    // Magic
    if r.read_bytes(4, "magic")? != MAGIC {
        return Err(CodecError::InvalidMagic);
    }

    // Version
    let version = r.read_u16("version")?;
    if version > VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }

    let tick = TickId(r.read_u64("tick")?);
    let radius = r.read_u32("radius")?;
    let clock_tag = r.read_u8("clock")?;
    let clock = ClockState::from_tag(clock_tag).ok_or(CodecError::InvalidTag {
        field: "clock",
        tag: clock_tag,
    })?;

    let actor = read_actor(&mut r)?;

    let n_tiles = r.read_u32("surroundings")? as usize;
    let mut surroundings = Vec::with_capacity(n_tiles.min(r.remaining()));
    for _ in 0..n_tiles {
        surroundings.push(read_tile(&mut r)?);
    }

    // Optional trailing sections
    let mut game_time = None;
    while r.remaining() > 0 {
        let tag = r.read_u8("section")?;
        let len = r.read_u32("section.len")? as usize;
        let mut body = Reader::new(r.read_bytes(len, "section.body")?);
        // Other tags come from newer encoders.
        if tag == SECTION_GAME_TIME {
            game_time = Some(GameTime {
                day: body.read_u32("game_time.day")?,
                time_of_day: body.read_u32("game_time.time_of_day")?,
            });
        }
    }

    Ok(Observation {
        tick,
        radius,
        clock,
        actor,
        surroundings,
        game_time,
    })
}

fn read_actor(r: &mut Reader<'_>) -> Result<ActorState, CodecError> {
    let location = r.read_str("actor.location")?;
    let position = r.read_pos("actor.position")?;
    let facing_tag = r.read_u8("actor.facing")?;
    let facing = Direction::from_tag(facing_tag).ok_or(CodecError::InvalidTag {
        field: "actor.facing",
        tag: facing_tag,
    })?;
    let health = r.read_i32("actor.health")?;
    let max_health = r.read_i32("actor.max_health")?;
    let energy = r.read_i32("actor.energy")?;
    let max_energy = r.read_i32("actor.max_energy")?;
    let money = r.read_i64("actor.money")?;
    let selected_slot = ItemIndex(r.read_u32("actor.selected_slot")? as usize);

    let n_slots = r.read_u32("actor.inventory")? as usize;
    let mut inventory = Vec::with_capacity(n_slots.min(r.remaining()));
    for _ in 0..n_slots {
        let index = ItemIndex(r.read_u32("inventory.index")? as usize);
        let item = if r.read_bool("inventory.item")? {
            Some(InventoryItem {
                name: r.read_str("item.name")?,
                category: r.read_str("item.category")?,
                stack: r.read_u32("item.stack")?,
                attachable: r.read_bool("item.attachable")?,
            })
        } else {
            None
        };
        inventory.push(InventorySlot { index, item });
    }

    Ok(ActorState {
        location,
        position,
        facing,
        health,
        max_health,
        energy,
        max_energy,
        money,
        selected_slot,
        inventory,
    })
}

fn read_tile(r: &mut Reader<'_>) -> Result<TileInfo, CodecError> {
    Ok(TileInfo {
        position: r.read_pos("tile.position")?,
        terrain: r.read_str("tile.terrain")?,
        object: r.read_opt_str("tile.object")?,
        npc: r.read_opt_str("tile.npc")?,
        passable: r.read_bool("tile.passable")?,
    })
}

/// Append-only little-endian byte writer.
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_capacity(n: usize) -> Self {
        Self {
            buf: Vec::with_capacity(n),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn pos(&mut self, p: TilePos) {
        self.i32(p.x);
        self.i32(p.y);
    }

    fn len(&mut self, field: &'static str, n: usize) -> Result<(), CodecError> {
        let n = u32::try_from(n).map_err(|_| CodecError::TooLarge { field })?;
        self.u32(n);
        Ok(())
    }

    fn index(&mut self, field: &'static str, i: ItemIndex) -> Result<(), CodecError> {
        self.len(field, i.0)
    }

    fn section(&mut self, tag: u8, body: Writer) -> Result<(), CodecError> {
        self.u8(tag);
        self.len("section", body.buf.len())?;
        self.bytes(&body.buf);
        Ok(())
    }

    fn str(&mut self, field: &'static str, s: &str) -> Result<(), CodecError> {
        self.len(field, s.len())?;
        self.bytes(s.as_bytes());
        Ok(())
    }

    fn opt_str(&mut self, field: &'static str, s: Option<&str>) -> Result<(), CodecError> {
        match s {
            None => {
                self.u8(0);
                Ok(())
            }
            Some(s) => {
                self.u8(1);
                self.str(field, s)
            }
        }
    }
}

/// Simple cursor reader for safe byte parsing.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::Truncated { field });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, field)?);
        Ok(out)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.read_bytes(1, field)?[0])
    }

    fn read_bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::InvalidTag { field, tag }),
        }
    }

    fn read_u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        self.read_array(field).map(u16::from_le_bytes)
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        self.read_array(field).map(u32::from_le_bytes)
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        self.read_array(field).map(i32::from_le_bytes)
    }

    fn read_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        self.read_array(field).map(u64::from_le_bytes)
    }

    fn read_i64(&mut self, field: &'static str) -> Result<i64, CodecError> {
        self.read_array(field).map(i64::from_le_bytes)
    }

    fn read_pos(&mut self, field: &'static str) -> Result<TilePos, CodecError> {
        let x = self.read_i32(field)?;
        let y = self.read_i32(field)?;
        Ok(TilePos::new(x, y))
    }

    fn read_str(&mut self, field: &'static str) -> Result<String, CodecError> {
        let n = self.read_u32(field)? as usize;
        let raw = self.read_bytes(n, field)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field })
    }

    fn read_opt_str(&mut self, field: &'static str) -> Result<Option<String>, CodecError> {
        if self.read_bool(field)? {
            self.read_str(field).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Observation {
        Observation {
            tick: TickId(1200),
            radius: 2,
            clock: ClockState::Running,
            actor: ActorState {
                location: "Farm".into(),
                position: TilePos::new(64, 15),
                facing: Direction::Left,
                health: 90,
                max_health: 100,
                energy: 200,
                max_energy: 270,
                money: 1_250,
                selected_slot: ItemIndex(1),
                inventory: vec![
                    InventorySlot {
                        index: ItemIndex(0),
                        item: Some(InventoryItem {
                            name: "Hoe".into(),
                            category: "Tool".into(),
                            stack: 1,
                            attachable: false,
                        }),
                    },
                    InventorySlot {
                        index: ItemIndex(1),
                        item: None,
                    },
                ],
            },
            surroundings: vec![TileInfo {
                position: TilePos::new(63, 14),
                terrain: "Dirt".into(),
                object: Some("Weeds".into()),
                npc: None,
                passable: false,
            }],
            game_time: Some(GameTime {
                day: 3,
                time_of_day: 630,
            }),
        }
    }

    #[test]
    fn round_trip_with_game_time() {
        let obs = sample();
        assert_eq!(decode(&encode(&obs).unwrap()).unwrap(), obs);
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[..4], b"TOBS");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), VERSION);
        assert_eq!(
            u64::from_le_bytes(bytes[6..14].try_into().unwrap()),
            1200
        );
    }

    #[test]
    fn payload_without_optional_section_decodes() {
        let mut obs = sample();
        let with = encode(&obs).unwrap();
        obs.game_time = None;
        let without = encode(&obs).unwrap();
        // The optional section is tag + length + two u32s at the end.
        assert_eq!(with.len(), without.len() + 13);
        assert_eq!(&with[..without.len()], &without[..]);
        assert_eq!(decode(&without).unwrap(), obs);
    }

    #[test]
    fn invalid_magic_error() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = b'X';
        assert_eq!(decode(&bytes), Err(CodecError::InvalidMagic));
    }

    #[test]
    fn version_rejection() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[4..6].copy_from_slice(&(VERSION + 1).to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(CodecError::UnsupportedVersion { found: VERSION + 1 })
        );
    }

    #[test]
    fn truncated_bytes_error() {
        let bytes = encode(&sample()).unwrap();
        // Cut inside the header, the actor, and the optional section.
        for cut in [3, 20, bytes.len() - 4] {
            assert!(
                matches!(decode(&bytes[..cut]), Err(CodecError::Truncated { .. })),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn unknown_sections_are_skipped() {
        let obs = sample();
        let mut bytes = encode(&obs).unwrap();
        // A section from a newer encoder, between two known ones.
        bytes.push(0xEE);
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[7, 7, 7]);
        bytes.push(SECTION_GAME_TIME);
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&800u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(
            decoded.game_time,
            Some(GameTime {
                day: 4,
                time_of_day: 800
            })
        );
        assert_eq!(decoded.surroundings, obs.surroundings);
    }

    #[test]
    fn section_body_shorter_than_its_length_is_truncated() {
        let mut obs = sample();
        obs.game_time = None;
        let mut bytes = encode(&obs).unwrap();
        bytes.push(0xEE);
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);
        assert_eq!(
            decode(&bytes),
            Err(CodecError::Truncated {
                field: "section.body"
            })
        );
    }

    #[test]
    fn game_time_section_too_short_is_truncated() {
        let mut obs = sample();
        obs.game_time = None;
        let mut bytes = encode(&obs).unwrap();
        bytes.push(SECTION_GAME_TIME);
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(CodecError::Truncated {
                field: "game_time.time_of_day"
            })
        );
    }

    #[test]
    fn bad_facing_tag_is_rejected() {
        let mut bad = encode(&sample()).unwrap();
        // header (19) + location (4 + 4) + position (8)
        let facing_at = 19 + 8 + 8;
        bad[facing_at] = 9;
        assert_eq!(
            decode(&bad),
            Err(CodecError::InvalidTag {
                field: "actor.facing",
                tag: 9
            })
        );
    }
}
