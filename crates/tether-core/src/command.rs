//! Commands, typed actions and queries, and the simulation clock.
//!
//! A remote call arrives as a [`Command`]: a name plus string tokens. It is
//! resolved exactly once, at the control-surface boundary, into a typed
//! [`Request`] via [`Request::parse`]. Name resolution happens before any
//! argument is decoded, so an unknown name always reports
//! [`BridgeError::UnknownCommand`] regardless of its arguments.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::args::ArgCursor;
use crate::error::BridgeError;
use crate::id::{Direction, ItemIndex, TilePos};

// ── Command ──────────────────────────────────────────────────────

/// An untyped remote call: a name and its positional string arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Action or query name as sent by the agent.
    pub name: String,
    /// Positional argument tokens, in order.
    pub args: SmallVec<[String; 4]>,
}

impl Command {
    /// Build a command from a name and any iterable of tokens.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Fixture ──────────────────────────────────────────────────────

/// Furniture the actor can use in place without further arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fixture {
    /// Sleep until the next day.
    Bed,
    /// Watch the television.
    Television,
    /// Play the arcade cabinet.
    ArcadeMachine,
    /// Ride the mine elevator.
    MineElevator,
    /// Gamble at the slot machine.
    SlotMachine,
}

// ── Action ───────────────────────────────────────────────────────

/// A validated, typed action ready for dispatch.
///
/// Every variant corresponds to one wire name; see [`Action::name`].
/// Only [`Action::Move`] is asynchronous.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Walk one tile. Completes when the facade reports arrival or obstruction.
    Move(Direction),
    /// Face a direction without moving.
    Turn(Direction),
    /// Interact with whatever the actor faces.
    Interact,
    /// Use the currently selected item.
    Use,
    /// Primary click on a tile.
    LeftClick(TilePos),
    /// Secondary click on a tile.
    RightClick(TilePos),
    /// Swing the selected tool at a tile.
    UseTool(TilePos),
    /// Apply the selected item to a tile.
    UseItem(TilePos),
    /// Place the selected item on a tile.
    PlaceItem(TilePos),
    /// Eat the selected item.
    EatFood,
    /// Drop an inventory item into the faced machine or container.
    DropIn(ItemIndex),
    /// Attach an inventory item to the selected tool.
    Attach(ItemIndex),
    /// Detach whatever is attached to the selected tool.
    Detach,
    /// Fire the slingshot at a tile.
    FireSlingshot(TilePos),
    /// Craft a named recipe.
    Craft {
        /// Recipe name.
        item: String,
    },
    /// Open a shop menu.
    OpenShop {
        /// Shop identifier.
        shop: String,
        /// Shop owner name.
        owner: String,
    },
    /// Close a shop menu.
    CloseShop {
        /// Shop identifier.
        shop: String,
        /// Shop owner name.
        owner: String,
    },
    /// Buy from the open shop.
    BuyFromShop {
        /// Listing index within the shop.
        listing: usize,
        /// Number of units; at least one.
        count: u32,
    },
    /// Sell the selected item to the open shop.
    SellToShop,
    /// Buy an animal and house it.
    BuyAnimal {
        /// Listing index within the animal shop.
        listing: usize,
        /// Index of the building to house it in.
        building: usize,
        /// Name to give the animal.
        name: String,
    },
    /// Choose a dialogue option.
    SelectDialogue(usize),
    /// Answer a question dialogue.
    AnswerQuestion {
        /// Key of the chosen answer.
        answer: String,
        /// Keys of the question(s) being answered.
        questions: Vec<String>,
    },
    /// Close the active menu.
    ExitMenu,
    /// Open the carpenter's construction menu.
    OpenCarpenterMenu,
    /// Build the building selected in the construction menu.
    BuildCurrentBuilding {
        /// Placement offset from the actor's tile.
        offset: TilePos,
    },
    /// Buy a backpack upgrade.
    UpgradeBackpack,
    /// Buy a house upgrade.
    UpgradeHouse,
    /// Talk to the faced character.
    Talk,
    /// Trigger a location-defined action.
    LocationAction {
        /// Location action identifier.
        action: String,
    },
    /// Interact with the object on a tile.
    InteractWithObject(TilePos),
    /// Open the chest on a tile.
    InteractWithChest(TilePos),
    /// Use a piece of furniture.
    Fixture(Fixture),
}

impl Action {
    /// Wire name of this action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Turn(_) => "turn",
            Self::Interact => "interact",
            Self::Use => "use",
            Self::LeftClick(_) => "leftClick",
            Self::RightClick(_) => "rightClick",
            Self::UseTool(_) => "use_tool",
            Self::UseItem(_) => "use_item",
            Self::PlaceItem(_) => "place_item",
            Self::EatFood => "eat_food",
            Self::DropIn(_) => "drop_in",
            Self::Attach(_) => "attach",
            Self::Detach => "detach",
            Self::FireSlingshot(_) => "FireSlingshot",
            Self::Craft { .. } => "craft",
            Self::OpenShop { .. } => "open_shop",
            Self::CloseShop { .. } => "close_shop",
            Self::BuyFromShop { .. } => "buy_from_shop",
            Self::SellToShop => "sell_to_shop",
            Self::BuyAnimal { .. } => "buy_from_animals_shop",
            Self::SelectDialogue(_) => "select_dialogue",
            Self::AnswerQuestion { .. } => "answer_question",
            Self::ExitMenu => "exit_menu",
            Self::OpenCarpenterMenu => "open_carpenter_construct",
            Self::BuildCurrentBuilding { .. } => "build_current_building",
            Self::UpgradeBackpack => "upgrade_backpack",
            Self::UpgradeHouse => "upgrade_house",
            Self::Talk => "talk",
            Self::LocationAction { .. } => "location_perform_action",
            Self::InteractWithObject(_) => "InteractWithObject",
            Self::InteractWithChest(_) => "InteractWithChest",
            Self::Fixture(Fixture::Bed) => "InteractWithBed",
            Self::Fixture(Fixture::Television) => "WatchTV",
            Self::Fixture(Fixture::ArcadeMachine) => "PlayArcade",
            Self::Fixture(Fixture::MineElevator) => "UseMineElevator",
            Self::Fixture(Fixture::SlotMachine) => "UseSlotMachine",
        }
    }

    /// The inventory slot this action consumes, if any.
    ///
    /// The dispatcher resolves it before the facade is touched.
    pub fn item_ref(&self) -> Option<ItemIndex> {
        match self {
            Self::DropIn(i) | Self::Attach(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this is the asynchronous movement action.
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move(_))
    }

    /// Every action wire name, in table order.
    pub const NAMES: [&'static str; 36] = [
        "move",
        "turn",
        "interact",
        "use",
        "leftClick",
        "rightClick",
        "use_tool",
        "use_item",
        "place_item",
        "eat_food",
        "drop_in",
        "attach",
        "detach",
        "FireSlingshot",
        "craft",
        "open_shop",
        "close_shop",
        "buy_from_shop",
        "sell_to_shop",
        "buy_from_animals_shop",
        "select_dialogue",
        "answer_question",
        "exit_menu",
        "open_carpenter_construct",
        "build_current_building",
        "upgrade_backpack",
        "upgrade_house",
        "talk",
        "location_perform_action",
        "InteractWithObject",
        "InteractWithChest",
        "InteractWithBed",
        "WatchTV",
        "PlayArcade",
        "UseMineElevator",
        "UseSlotMachine",
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Query ────────────────────────────────────────────────────────

/// A control or observation request that does not act in the world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Binary observation at a radius.
    Observe {
        /// Neighborhood radius in tiles.
        radius: u32,
    },
    /// Text (JSON) observation at a radius.
    ObserveText {
        /// Neighborhood radius in tiles.
        radius: u32,
    },
    /// Neighborhood tiles only.
    Surroundings {
        /// Neighborhood radius in tiles.
        radius: u32,
    },
    /// Stop the simulation clock.
    Pause,
    /// Restart the simulation clock.
    Resume,
    /// Reserved: replay a recorded game.
    LoadGameRecord {
        /// Path of the record.
        path: String,
    },
}

impl Query {
    /// Wire name of this query.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Observe { .. } => "observe",
            Self::ObserveText { .. } => "observe_v2",
            Self::Surroundings { .. } => "get_surroundings",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::LoadGameRecord { .. } => "load_game_record",
        }
    }

    /// Every query wire name.
    pub const NAMES: [&'static str; 6] = [
        "observe",
        "observe_v2",
        "get_surroundings",
        "pause",
        "resume",
        "load_game_record",
    ];
}

// ── Request ──────────────────────────────────────────────────────

/// A fully decoded remote call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Something the actor does in the world.
    Action(Action),
    /// A control or observation request.
    Query(Query),
}

/// Argument decoder for one wire name.
type Parser = fn(&mut ArgCursor<'_, String>) -> Result<Request, BridgeError>;

fn act(action: Action) -> Result<Request, BridgeError> {
    Ok(Request::Action(action))
}

fn query(query: Query) -> Result<Request, BridgeError> {
    Ok(Request::Query(query))
}

fn radius(c: &mut ArgCursor<'_, String>) -> Result<u32, BridgeError> {
    let r = c.integer_at_least(0)?;
    Ok(r.unsigned_abs())
}

fn parser_for(name: &str) -> Option<Parser> {
    let p: Parser = match name {
        "move" => |c| act(Action::Move(c.direction()?)),
        "turn" => |c| act(Action::Turn(c.direction()?)),
        "interact" => |_| act(Action::Interact),
        "use" => |_| act(Action::Use),
        "leftClick" => |c| act(Action::LeftClick(c.coordinate()?)),
        "rightClick" => |c| act(Action::RightClick(c.coordinate()?)),
        "use_tool" => |c| act(Action::UseTool(c.coordinate()?)),
        "use_item" => |c| act(Action::UseItem(c.coordinate()?)),
        "place_item" => |c| act(Action::PlaceItem(c.coordinate()?)),
        "eat_food" => |_| act(Action::EatFood),
        "drop_in" => |c| act(Action::DropIn(c.item()?)),
        "attach" => |c| act(Action::Attach(c.item()?)),
        "detach" => |_| act(Action::Detach),
        "FireSlingshot" => |c| act(Action::FireSlingshot(c.coordinate()?)),
        "craft" => |c| act(Action::Craft { item: c.text()? }),
        "open_shop" => |c| {
            act(Action::OpenShop {
                shop: c.text()?,
                owner: c.text()?,
            })
        },
        "close_shop" => |c| {
            act(Action::CloseShop {
                shop: c.text()?,
                owner: c.text()?,
            })
        },
        "buy_from_shop" => |c| {
            let listing = c.index()?;
            let count = c.integer_at_least(1)?.unsigned_abs();
            act(Action::BuyFromShop { listing, count })
        },
        "sell_to_shop" => |_| act(Action::SellToShop),
        "buy_from_animals_shop" => |c| {
            act(Action::BuyAnimal {
                listing: c.index()?,
                building: c.index()?,
                name: c.text()?,
            })
        },
        "select_dialogue" => |c| act(Action::SelectDialogue(c.index()?)),
        "answer_question" => |c| {
            act(Action::AnswerQuestion {
                answer: c.text()?,
                questions: c.rest_text()?,
            })
        },
        "exit_menu" => |_| act(Action::ExitMenu),
        "open_carpenter_construct" => |_| act(Action::OpenCarpenterMenu),
        "build_current_building" => |c| {
            act(Action::BuildCurrentBuilding {
                offset: c.coordinate()?,
            })
        },
        "upgrade_backpack" => |_| act(Action::UpgradeBackpack),
        "upgrade_house" => |_| act(Action::UpgradeHouse),
        "talk" => |_| act(Action::Talk),
        "location_perform_action" => |c| act(Action::LocationAction { action: c.text()? }),
        "InteractWithObject" => |c| act(Action::InteractWithObject(c.coordinate()?)),
        "InteractWithChest" => |c| act(Action::InteractWithChest(c.coordinate()?)),
        "InteractWithBed" => |_| act(Action::Fixture(Fixture::Bed)),
        "WatchTV" => |_| act(Action::Fixture(Fixture::Television)),
        "PlayArcade" => |_| act(Action::Fixture(Fixture::ArcadeMachine)),
        "UseMineElevator" => |_| act(Action::Fixture(Fixture::MineElevator)),
        "UseSlotMachine" => |_| act(Action::Fixture(Fixture::SlotMachine)),
        "observe" => |c| query(Query::Observe { radius: radius(c)? }),
        "observe_v2" => |c| query(Query::ObserveText { radius: radius(c)? }),
        "get_surroundings" => |c| query(Query::Surroundings { radius: radius(c)? }),
        "pause" => |_| query(Query::Pause),
        "resume" => |_| query(Query::Resume),
        "load_game_record" => |c| query(Query::LoadGameRecord { path: c.text()? }),
        _ => return None,
    };
    Some(p)
}

impl Request {
    /// Resolve a command's name and decode its arguments.
    ///
    /// Validation is all-or-nothing: either every token decodes and no
    /// token is left over, or an error is returned and nothing is built.
    pub fn parse(command: &Command) -> Result<Self, BridgeError> {
        let parser = parser_for(&command.name).ok_or_else(|| BridgeError::UnknownCommand {
            name: command.name.clone(),
        })?;
        let mut cursor = ArgCursor::new(&command.args[..]);
        let request = parser(&mut cursor)?;
        cursor.finish()?;
        Ok(request)
    }

    /// Wire name of the request.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Action(a) => a.name(),
            Self::Query(q) => q.name(),
        }
    }
}

// ── ActionResult ─────────────────────────────────────────────────

/// Outcome of a dispatched action.
///
/// Simulation-level refusals (blocked path, unknown recipe, closed shop)
/// are reported here with `succeeded == false`, never as errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the facade accepted and completed the action.
    pub succeeded: bool,
    /// Optional facade-supplied detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActionResult {
    /// Successful result with no detail.
    pub fn ok() -> Self {
        Self {
            succeeded: true,
            detail: None,
        }
    }

    /// Successful result carrying facade detail.
    pub fn ok_with(detail: Option<String>) -> Self {
        Self {
            succeeded: true,
            detail,
        }
    }

    /// Unsuccessful result with a reason.
    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            detail: Some(detail.into()),
        }
    }
}

// ── SimulationClock ──────────────────────────────────────────────

/// Whether simulated time advances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockState {
    /// Ticks advance at the host's rate.
    #[default]
    Running,
    /// Ticks are suspended; requests are still served.
    Paused,
}

impl ClockState {
    /// Stable one-byte tag for the binary encoding.
    pub fn tag(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Paused => 1,
        }
    }

    /// Inverse of [`tag`](ClockState::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Running),
            1 => Some(Self::Paused),
            _ => None,
        }
    }
}

/// The simulation clock, owned by the simulation host.
///
/// Only [`pause`](SimulationClock::pause) and
/// [`resume`](SimulationClock::resume) mutate it; facade calls receive it
/// by shared reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationClock {
    state: ClockState,
}

impl SimulationClock {
    /// A running clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Whether ticks currently advance.
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Running → Paused. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        let changed = self.state == ClockState::Running;
        self.state = ClockState::Paused;
        changed
    }

    /// Paused → Running. Returns `true` if the state changed.
    pub fn resume(&mut self) -> bool {
        let changed = self.state == ClockState::Paused;
        self.state = ClockState::Running;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArgError, ErrorKind};

    fn parse(name: &str, args: &[&str]) -> Result<Request, BridgeError> {
        Request::parse(&Command::new(name, args.iter().copied()))
    }

    #[test]
    fn every_wire_name_resolves() {
        for name in Action::NAMES.iter().chain(Query::NAMES.iter()) {
            assert!(parser_for(name).is_some(), "{name} has no parser");
        }
        assert!(parser_for("fly").is_none());
    }

    #[test]
    fn unknown_name_wins_over_bad_arguments() {
        let err = parse("fly", &["not", "numbers"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCommand);
    }

    #[test]
    fn parsed_action_names_match_wire_names() {
        let samples: &[(&str, &[&str])] = &[
            ("move", &["up"]),
            ("turn", &["LEFT"]),
            ("leftClick", &["1", "2"]),
            ("drop_in", &["0"]),
            ("craft", &["Chest"]),
            ("open_shop", &["SeedShop", "Pierre"]),
            ("buy_from_shop", &["3", "5"]),
            ("buy_from_animals_shop", &["0", "1", "Daisy"]),
            ("answer_question", &["yes"]),
            ("answer_question", &["yes", "q1", "q2"]),
            ("build_current_building", &["-2", "3"]),
            ("InteractWithChest", &["4", "4"]),
            ("WatchTV", &[]),
        ];
        for (name, args) in samples {
            let req = parse(name, args).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(req.name(), *name);
        }
    }

    #[test]
    fn radius_must_be_non_negative_integer() {
        assert_eq!(
            parse("observe", &["0"]),
            Ok(Request::Query(Query::Observe { radius: 0 }))
        );
        assert!(matches!(
            parse("get_surroundings", &["-1"]),
            Err(BridgeError::InvalidArgument(ArgError::OutOfRange {
                position: 0,
                ..
            }))
        ));
        assert!(matches!(
            parse("observe_v2", &["two"]),
            Err(BridgeError::InvalidArgument(ArgError::Malformed { .. }))
        ));
    }

    #[test]
    fn buy_count_must_be_positive() {
        let err = parse("buy_from_shop", &["0", "0"]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidArgument(ArgError::OutOfRange { position: 1, .. })
        ));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse("pause", &["now"]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidArgument(ArgError::Unexpected {
                position: 0,
                token: "now".into()
            })
        );
    }

    #[test]
    fn item_refs_only_on_inventory_actions() {
        assert_eq!(Action::DropIn(ItemIndex(2)).item_ref(), Some(ItemIndex(2)));
        assert_eq!(Action::Attach(ItemIndex(0)).item_ref(), Some(ItemIndex(0)));
        assert_eq!(Action::EatFood.item_ref(), None);
    }

    #[test]
    fn clock_transitions_are_idempotent() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.state(), ClockState::Running);
        assert!(!clock.resume());
        assert!(clock.pause());
        assert!(!clock.pause());
        assert_eq!(clock.state(), ClockState::Paused);
        assert!(clock.resume());
        assert!(clock.is_running());
    }

    #[test]
    fn action_result_omits_empty_detail() {
        let json = serde_json::to_string(&ActionResult::ok()).unwrap();
        assert_eq!(json, r#"{"succeeded":true}"#);
        let json = serde_json::to_string(&ActionResult::rejected("blocked")).unwrap();
        assert_eq!(json, r#"{"succeeded":false,"detail":"blocked"}"#);
    }
}
