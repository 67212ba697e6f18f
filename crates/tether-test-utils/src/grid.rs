//! `GridWorld`: a small deterministic sandbox implementing the facade.
//!
//! A rectangular grid of tiles with one actor. Movement takes a fixed
//! number of ticks per step; walking into the map edge or an occupied
//! tile is reported as an obstruction. Enough of the action surface is
//! modelled (inventory, crafting, one shop, dialogue, the carpenter menu)
//! for every action to have an observable accept/reject path.
//!
//! Tiles are stored column-major, so the facade hands them out in an
//! order that differs from the canonical row-major observation order.

use indexmap::IndexMap;

use tether_core::{
    Action, ActorState, Direction, Fixture, GameTime, InventoryItem, InventorySlot, ItemIndex,
    MoveStatus, Rejection, SimulationClock, SimulationFacade, TickId, TileInfo, TilePos,
    WorldView,
};

use crate::CallLog;

const INVENTORY_SIZE: usize = 12;
const MAX_INVENTORY: usize = 36;
const BACKPACK_PRICE: i64 = 2_000;
const HOUSE_PRICE: i64 = 10_000;
const SELL_PRICE: i64 = 10;
const FOOD_ENERGY: i32 = 50;

/// Objects a tool can clear.
const DEBRIS: [&str; 3] = ["Weeds", "Stone", "Twig"];

struct PendingMove {
    target: TilePos,
    remaining: u32,
    blocked: Option<String>,
}

/// Sandbox world for tests and the sandbox server.
pub struct GridWorld {
    width: i32,
    height: i32,
    tiles: IndexMap<TilePos, TileInfo>,
    actor: ActorState,
    tick: TickId,
    paused: bool,
    ticks_per_step: u32,
    pending: Option<PendingMove>,
    attached: Option<InventoryItem>,
    recipes: Vec<String>,
    stock: Vec<(InventoryItem, i64)>,
    shop: Option<(String, String)>,
    dialogue: Vec<String>,
    carpenter_open: bool,
    game_time: Option<GameTime>,
    snapshot_failure: Option<String>,
    log: CallLog,
}

impl GridWorld {
    /// A `width` × `height` grass field with the actor in the middle.
    pub fn new(width: u32, height: u32) -> Self {
        let width = i32::try_from(width.max(1)).unwrap_or(i32::MAX);
        let height = i32::try_from(height.max(1)).unwrap_or(i32::MAX);
        let mut tiles = IndexMap::new();
        for x in 0..width {
            for y in 0..height {
                let position = TilePos::new(x, y);
                tiles.insert(
                    position,
                    TileInfo {
                        position,
                        terrain: "Grass".into(),
                        object: None,
                        npc: None,
                        passable: true,
                    },
                );
            }
        }
        let inventory = (0..INVENTORY_SIZE)
            .map(|i| InventorySlot {
                index: ItemIndex(i),
                item: None,
            })
            .collect();
        Self {
            width,
            height,
            tiles,
            actor: ActorState {
                location: "Sandbox".into(),
                position: TilePos::new(width / 2, height / 2),
                facing: Direction::Down,
                health: 100,
                max_health: 100,
                energy: 270,
                max_energy: 270,
                money: 500,
                selected_slot: ItemIndex(0),
                inventory,
            },
            tick: TickId(0),
            paused: false,
            ticks_per_step: 4,
            pending: None,
            attached: None,
            recipes: Vec::new(),
            stock: Vec::new(),
            shop: None,
            dialogue: Vec::new(),
            carpenter_open: false,
            game_time: None,
            snapshot_failure: None,
            log: CallLog::new(),
        }
    }

    // ── Builders ─────────────────────────────────────────────────

    pub fn with_actor_at(mut self, position: TilePos) -> Self {
        self.actor.position = position;
        self
    }

    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.actor.facing = facing;
        self
    }

    /// Put an impassable object on a tile.
    pub fn with_object(mut self, position: TilePos, name: &str) -> Self {
        if let Some(tile) = self.tiles.get_mut(&position) {
            tile.object = Some(name.into());
            tile.passable = false;
        }
        self
    }

    /// Put a character on a tile.
    pub fn with_npc(mut self, position: TilePos, name: &str) -> Self {
        if let Some(tile) = self.tiles.get_mut(&position) {
            tile.npc = Some(name.into());
            tile.passable = false;
        }
        self
    }

    pub fn with_terrain(mut self, position: TilePos, terrain: &str) -> Self {
        if let Some(tile) = self.tiles.get_mut(&position) {
            tile.terrain = terrain.into();
        }
        self
    }

    /// Fill an inventory slot. Out-of-range slots are ignored.
    pub fn with_item(mut self, slot: usize, item: InventoryItem) -> Self {
        if let Some(s) = self.actor.inventory.get_mut(slot) {
            s.item = Some(item);
        }
        self
    }

    pub fn with_selected_slot(mut self, slot: usize) -> Self {
        self.actor.selected_slot = ItemIndex(slot);
        self
    }

    pub fn with_money(mut self, money: i64) -> Self {
        self.actor.money = money;
        self
    }

    pub fn with_recipe(mut self, name: &str) -> Self {
        self.recipes.push(name.into());
        self
    }

    /// Add a shop listing at the given unit price.
    pub fn with_stock(mut self, item: InventoryItem, price: i64) -> Self {
        self.stock.push((item, price));
        self
    }

    /// Open a dialogue with the given options.
    pub fn with_dialogue(mut self, options: &[&str]) -> Self {
        self.dialogue = options.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Ticks a single step takes (at least one).
    pub fn with_ticks_per_step(mut self, ticks: u32) -> Self {
        self.ticks_per_step = ticks.max(1);
        self
    }

    pub fn with_game_time(mut self, game_time: GameTime) -> Self {
        self.game_time = Some(game_time);
        self
    }

    /// Make every snapshot read fail with `reason`.
    pub fn with_snapshot_failure(mut self, reason: &str) -> Self {
        self.snapshot_failure = Some(reason.into());
        self
    }

    /// A handle on this world's call log.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    pub fn current_tick(&self) -> TickId {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tile(&self, position: TilePos) -> Option<&TileInfo> {
        self.tiles.get(&position)
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn in_bounds(&self, p: TilePos) -> bool {
        (0..self.width).contains(&p.x) && (0..self.height).contains(&p.y)
    }

    fn faced(&self) -> Option<&TileInfo> {
        self.tiles.get(&self.actor.position.step(self.actor.facing))
    }

    fn tile_in_bounds(&mut self, p: TilePos) -> Result<&mut TileInfo, Rejection> {
        self.tiles
            .get_mut(&p)
            .ok_or_else(|| Rejection::new(format!("{p} is off the map")))
    }

    fn slot_item(&self, index: ItemIndex) -> Option<&InventoryItem> {
        self.actor
            .inventory
            .get(index.0)
            .and_then(|s| s.item.as_ref())
    }

    fn selected(&self) -> Result<InventoryItem, Rejection> {
        self.slot_item(self.actor.selected_slot)
            .cloned()
            .ok_or_else(|| Rejection::new("no item selected"))
    }

    /// Remove one unit from a slot, emptying it at zero.
    fn consume_one(&mut self, index: ItemIndex) {
        if let Some(slot) = self.actor.inventory.get_mut(index.0) {
            if let Some(item) = slot.item.as_mut() {
                item.stack = item.stack.saturating_sub(1);
                if item.stack == 0 {
                    slot.item = None;
                }
            }
        }
    }

    /// Stack onto a matching item or fill the first empty slot.
    fn add_item(&mut self, item: InventoryItem) -> Result<(), Rejection> {
        if let Some(existing) = self
            .actor
            .inventory
            .iter_mut()
            .filter_map(|s| s.item.as_mut())
            .find(|i| i.name == item.name)
        {
            existing.stack = existing.stack.saturating_add(item.stack);
            return Ok(());
        }
        let slot = self
            .actor
            .inventory
            .iter_mut()
            .find(|s| s.item.is_none())
            .ok_or_else(|| Rejection::new("inventory is full"))?;
        slot.item = Some(item);
        Ok(())
    }

    fn require_shop(&self) -> Result<(), Rejection> {
        match self.shop {
            Some(_) => Ok(()),
            None => Err(Rejection::new("no shop is open")),
        }
    }

    fn spend(&mut self, amount: i64) -> Result<(), Rejection> {
        if self.actor.money < amount {
            return Err(Rejection::new(format!(
                "costs {amount}, only {} available",
                self.actor.money
            )));
        }
        self.actor.money -= amount;
        Ok(())
    }

    fn perform_action(&mut self, action: &Action) -> Result<Option<String>, Rejection> {
        match action {
            Action::Move(_) => Err(Rejection::new("movement is started with start_move")),
            Action::Turn(d) => {
                self.actor.facing = *d;
                Ok(None)
            }
            Action::Interact => match self.faced().and_then(|t| t.object.clone()) {
                Some(obj) => Ok(Some(format!("interacted with {obj}"))),
                None => Err(Rejection::new("nothing to interact with")),
            },
            Action::Use => self.selected().map(|i| Some(format!("used {}", i.name))),
            Action::LeftClick(p) | Action::RightClick(p) | Action::FireSlingshot(p) => {
                self.tile_in_bounds(*p)?;
                Ok(None)
            }
            Action::UseTool(p) => {
                let tool = self.selected()?;
                if tool.category != "Tool" {
                    return Err(Rejection::new(format!("{} is not a tool", tool.name)));
                }
                let tile = self.tile_in_bounds(*p)?;
                match tile.object.take() {
                    Some(obj) if DEBRIS.contains(&obj.as_str()) => {
                        tile.passable = tile.npc.is_none();
                        Ok(Some(format!("cleared {obj}")))
                    }
                    other => {
                        tile.object = other;
                        Ok(None)
                    }
                }
            }
            Action::UseItem(p) => {
                let item = self.selected()?;
                self.tile_in_bounds(*p)?;
                Ok(Some(format!("used {} on {p}", item.name)))
            }
            Action::PlaceItem(p) => {
                let item = self.selected()?;
                let tile = self.tile_in_bounds(*p)?;
                if !tile.passable {
                    return Err(Rejection::new(format!("{p} is occupied")));
                }
                tile.object = Some(item.name.clone());
                tile.passable = false;
                self.consume_one(self.actor.selected_slot);
                Ok(None)
            }
            Action::EatFood => {
                let item = self.selected()?;
                if item.category != "Food" {
                    return Err(Rejection::new(format!("{} is not edible", item.name)));
                }
                self.actor.energy = (self.actor.energy + FOOD_ENERGY).min(self.actor.max_energy);
                self.consume_one(self.actor.selected_slot);
                Ok(None)
            }
            Action::DropIn(index) => {
                let obj = self
                    .faced()
                    .and_then(|t| t.object.clone())
                    .ok_or_else(|| Rejection::new("no machine in front of the actor"))?;
                let name = self
                    .slot_item(*index)
                    .map(|i| i.name.clone())
                    .ok_or_else(|| Rejection::new(format!("slot {index} is empty")))?;
                self.consume_one(*index);
                Ok(Some(format!("dropped {name} into {obj}")))
            }
            Action::Attach(index) => {
                let item = self
                    .slot_item(*index)
                    .cloned()
                    .ok_or_else(|| Rejection::new(format!("slot {index} is empty")))?;
                if !item.attachable {
                    return Err(Rejection::new(format!("{} cannot be attached", item.name)));
                }
                if self.attached.is_some() {
                    return Err(Rejection::new("something is already attached"));
                }
                if let Some(slot) = self.actor.inventory.get_mut(index.0) {
                    slot.item = None;
                }
                self.attached = Some(item);
                Ok(None)
            }
            Action::Detach => {
                let item = self
                    .attached
                    .take()
                    .ok_or_else(|| Rejection::new("nothing is attached"))?;
                self.add_item(item)?;
                Ok(None)
            }
            Action::Craft { item } => {
                if !self.recipes.iter().any(|r| r == item) {
                    return Err(Rejection::new(format!("unknown recipe '{item}'")));
                }
                self.add_item(InventoryItem {
                    name: item.clone(),
                    category: "Crafting".into(),
                    stack: 1,
                    attachable: false,
                })?;
                Ok(Some(format!("crafted {item}")))
            }
            Action::OpenShop { shop, owner } => {
                self.shop = Some((shop.clone(), owner.clone()));
                Ok(None)
            }
            Action::CloseShop { shop, owner } => match &self.shop {
                Some((s, o)) if s == shop && o == owner => {
                    self.shop = None;
                    Ok(None)
                }
                _ => Err(Rejection::new(format!("{shop} ({owner}) is not open"))),
            },
            Action::BuyFromShop { listing, count } => {
                self.require_shop()?;
                let (item, price) = self
                    .stock
                    .get(*listing)
                    .cloned()
                    .ok_or_else(|| Rejection::new(format!("no listing {listing}")))?;
                self.spend(price.saturating_mul(i64::from(*count)))?;
                self.add_item(InventoryItem {
                    stack: *count,
                    ..item
                })?;
                Ok(None)
            }
            Action::SellToShop => {
                self.require_shop()?;
                let item = self.selected()?;
                if let Some(slot) = self.actor.inventory.get_mut(self.actor.selected_slot.0) {
                    slot.item = None;
                }
                self.actor.money += SELL_PRICE * i64::from(item.stack);
                Ok(Some(format!("sold {} {}", item.stack, item.name)))
            }
            Action::BuyAnimal {
                listing,
                building,
                name,
            } => {
                self.require_shop()?;
                let (_, price) = self
                    .stock
                    .get(*listing)
                    .cloned()
                    .ok_or_else(|| Rejection::new(format!("no listing {listing}")))?;
                self.spend(price)?;
                Ok(Some(format!("{name} moved into building {building}")))
            }
            Action::SelectDialogue(i) => {
                let option = self
                    .dialogue
                    .get(*i)
                    .cloned()
                    .ok_or_else(|| Rejection::new(format!("no dialogue option {i}")))?;
                self.dialogue.clear();
                Ok(Some(option))
            }
            Action::AnswerQuestion { answer, .. } => {
                if !self.dialogue.iter().any(|o| o == answer) {
                    return Err(Rejection::new(format!("'{answer}' is not an answer")));
                }
                self.dialogue.clear();
                Ok(None)
            }
            Action::ExitMenu => {
                self.shop = None;
                self.dialogue.clear();
                self.carpenter_open = false;
                Ok(None)
            }
            Action::OpenCarpenterMenu => {
                self.carpenter_open = true;
                Ok(None)
            }
            Action::BuildCurrentBuilding { offset } => {
                if !self.carpenter_open {
                    return Err(Rejection::new("carpenter menu is not open"));
                }
                let site = TilePos::new(
                    self.actor.position.x.saturating_add(offset.x),
                    self.actor.position.y.saturating_add(offset.y),
                );
                let tile = self.tile_in_bounds(site)?;
                if !tile.passable {
                    return Err(Rejection::new(format!("{site} is occupied")));
                }
                tile.object = Some("Building".into());
                tile.passable = false;
                self.carpenter_open = false;
                Ok(None)
            }
            Action::UpgradeBackpack => {
                if self.actor.inventory.len() >= MAX_INVENTORY {
                    return Err(Rejection::new("backpack is fully upgraded"));
                }
                self.spend(BACKPACK_PRICE)?;
                let start = self.actor.inventory.len();
                self.actor
                    .inventory
                    .extend((start..start + INVENTORY_SIZE).map(|i| InventorySlot {
                        index: ItemIndex(i),
                        item: None,
                    }));
                Ok(None)
            }
            Action::UpgradeHouse => {
                self.spend(HOUSE_PRICE)?;
                Ok(None)
            }
            Action::Talk => match self.faced().and_then(|t| t.npc.clone()) {
                Some(npc) => Ok(Some(format!("talked to {npc}"))),
                None => Err(Rejection::new("nobody to talk to")),
            },
            Action::LocationAction { action } => {
                Err(Rejection::new(format!("no location action '{action}'")))
            }
            Action::InteractWithObject(p) => {
                let tile = self.tile_in_bounds(*p)?;
                match &tile.object {
                    Some(obj) => Ok(Some(format!("interacted with {obj}"))),
                    None => Err(Rejection::new(format!("no object at {p}"))),
                }
            }
            Action::InteractWithChest(p) => {
                let tile = self.tile_in_bounds(*p)?;
                match tile.object.as_deref() {
                    Some("Chest") => Ok(Some("opened chest".into())),
                    _ => Err(Rejection::new(format!("no chest at {p}"))),
                }
            }
            Action::Fixture(Fixture::Bed) => {
                if let Some(gt) = self.game_time.as_mut() {
                    gt.day += 1;
                    gt.time_of_day = 600;
                }
                self.actor.energy = self.actor.max_energy;
                Ok(Some("slept until morning".into()))
            }
            Action::Fixture(fixture) => Ok(Some(format!("used {fixture:?}"))),
        }
    }
}

impl SimulationFacade for GridWorld {
    fn tick(&mut self) {
        self.tick = TickId(self.tick.0 + 1);
        if let Some(pending) = self.pending.as_mut() {
            if pending.remaining > 0 {
                pending.remaining -= 1;
                if pending.remaining == 0 && pending.blocked.is_none() {
                    self.actor.position = pending.target;
                }
            }
        }
    }

    fn set_paused(&mut self, paused: bool) {
        self.log.record(format!("set_paused:{paused}"));
        self.paused = paused;
    }

    fn start_move(
        &mut self,
        _clock: &SimulationClock,
        direction: Direction,
    ) -> Result<(), Rejection> {
        self.log.record(format!("start_move:{direction}"));
        if self.pending.is_some() {
            return Err(Rejection::new("already moving"));
        }
        self.actor.facing = direction;
        let target = self.actor.position.step(direction);
        let blocked = if !self.in_bounds(target) {
            Some(format!("{target} is off the map"))
        } else {
            self.tiles.get(&target).and_then(|t| {
                (!t.passable).then(|| {
                    let what = t
                        .npc
                        .as_deref()
                        .or(t.object.as_deref())
                        .unwrap_or(t.terrain.as_str());
                    format!("{target} is blocked by {what}")
                })
            })
        };
        let remaining = if blocked.is_some() {
            1
        } else {
            self.ticks_per_step
        };
        self.pending = Some(PendingMove {
            target,
            remaining,
            blocked,
        });
        Ok(())
    }

    fn poll_move(&mut self) -> MoveStatus {
        let arrived = match &self.pending {
            None => {
                return MoveStatus::Obstructed {
                    reason: "no movement in progress".into(),
                }
            }
            Some(p) => p.remaining == 0,
        };
        if !arrived {
            return MoveStatus::InProgress;
        }
        match self.pending.take().and_then(|p| p.blocked) {
            Some(reason) => MoveStatus::Obstructed { reason },
            None => MoveStatus::Completed,
        }
    }

    fn inventory_item(&self, index: ItemIndex) -> Option<InventoryItem> {
        self.log.record(format!("inventory_item:{index}"));
        self.slot_item(index).cloned()
    }

    fn perform(
        &mut self,
        _clock: &SimulationClock,
        action: &Action,
    ) -> Result<Option<String>, Rejection> {
        self.log.record(format!("perform:{}", action.name()));
        self.perform_action(action)
    }

    fn snapshot(&self, _clock: &SimulationClock, radius: u32) -> Result<WorldView, Rejection> {
        self.log.record(format!("snapshot:{radius}"));
        if let Some(reason) = &self.snapshot_failure {
            return Err(Rejection::new(reason.clone()));
        }
        let centre = self.actor.position;
        let tiles = self
            .tiles
            .values()
            .filter(|t| t.position.chebyshev(centre) <= radius)
            .cloned()
            .collect();
        Ok(WorldView {
            tick: self.tick,
            actor: self.actor.clone(),
            tiles,
            game_time: self.game_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn clock() -> SimulationClock {
        SimulationClock::new()
    }

    fn walk(world: &mut GridWorld, direction: Direction) -> MoveStatus {
        world.start_move(&clock(), direction).unwrap();
        loop {
            world.tick();
            let status = world.poll_move();
            if status.is_terminal() {
                return status;
            }
        }
    }

    #[test]
    fn move_completes_after_ticks_per_step() {
        let mut world = GridWorld::new(5, 5).with_ticks_per_step(3);
        let start = world.actor().position;
        assert_eq!(walk(&mut world, Direction::Up), MoveStatus::Completed);
        assert_eq!(world.actor().position, start.step(Direction::Up));
        assert_eq!(world.current_tick(), TickId(3));
    }

    #[test]
    fn move_into_object_is_obstructed() {
        let mut world = GridWorld::new(5, 5).with_object(TilePos::new(2, 3), "Stone");
        let status = walk(&mut world, Direction::Down);
        assert!(matches!(status, MoveStatus::Obstructed { .. }));
        assert_eq!(world.actor().position, TilePos::new(2, 2));
        assert_eq!(world.actor().facing, Direction::Down);
    }

    #[test]
    fn move_off_the_map_is_obstructed() {
        let mut world = GridWorld::new(1, 1);
        assert!(matches!(
            walk(&mut world, Direction::Left),
            MoveStatus::Obstructed { .. }
        ));
    }

    #[test]
    fn craft_requires_known_recipe() {
        let mut world = GridWorld::new(3, 3).with_recipe("Chest");
        let craft = |item: &str| Action::Craft { item: item.into() };
        assert!(world.perform(&clock(), &craft("Chest")).is_ok());
        assert!(world.perform(&clock(), &craft("unknown_item")).is_err());
        assert_eq!(world.call_log().count("perform:craft"), 2);
    }

    #[test]
    fn buying_needs_an_open_shop_and_money() {
        let mut world = GridWorld::new(3, 3)
            .with_money(100)
            .with_stock(fixtures::parsnip_seeds(1), 20);
        let buy = Action::BuyFromShop {
            listing: 0,
            count: 3,
        };
        assert!(world.perform(&clock(), &buy).is_err());
        world
            .perform(
                &clock(),
                &Action::OpenShop {
                    shop: "SeedShop".into(),
                    owner: "Pierre".into(),
                },
            )
            .unwrap();
        world.perform(&clock(), &buy).unwrap();
        assert_eq!(world.actor().money, 40);
        assert_eq!(world.actor().inventory[0].item.as_ref().map(|i| i.stack), Some(3));
        assert!(world.perform(&clock(), &buy).is_err());
    }

    #[test]
    fn snapshot_returns_tiles_in_discovery_order() {
        let world = GridWorld::new(3, 3);
        let view = world.snapshot(&clock(), 1).unwrap();
        let positions: Vec<_> = view.tiles.iter().map(|t| (t.position.x, t.position.y)).collect();
        assert_eq!(positions[..3], [(0, 0), (0, 1), (0, 2)]);
        assert_eq!(view.tiles.len(), 9);
    }

    #[test]
    fn attach_and_detach_move_the_item() {
        let mut world = GridWorld::new(3, 3).with_item(2, fixtures::bait(5));
        world.perform(&clock(), &Action::Attach(ItemIndex(2))).unwrap();
        assert!(world.inventory_item(ItemIndex(2)).is_none());
        world.perform(&clock(), &Action::Detach).unwrap();
        assert_eq!(world.inventory_item(ItemIndex(0)), Some(fixtures::bait(5)));
    }
}
