use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::*;

/// Why a day ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayEnd {
    Slept,
    Died,
    PassedOut,
}

impl DayEnd {
    pub const fn is_penalized(self) -> bool {
        matches!(self, Self::Died | Self::PassedOut)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayPolicy {
    pub day_length: Duration,
    /// Share of carried resources lost on death or passing out.
    pub penalty: f32,
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self {
            day_length: Duration::from_secs(8 * 60),
            penalty: 0.5,
        }
    }
}

/// All tuning for a session. The rope's column comes from `layout`, its length from the session.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub items: ItemPhysics,
    pub layout: WorldLayout,
    pub climb: ClimbConfig,
    pub camera: CameraConfig,
    pub viewport: Viewport,
    pub drops: DropTable,
    pub blueprint_odds: BlueprintOdds,
    pub day: DayPolicy,
    pub notice_duration: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            physics: PhysicsConfig::default(),
            items: ItemPhysics::default(),
            layout: WorldLayout::default(),
            climb: ClimbConfig::default(),
            camera: CameraConfig::default(),
            viewport: Viewport::default(),
            drops: DropTable::default(),
            blueprint_odds: BlueprintOdds::default(),
            day: DayPolicy::default(),
            notice_duration: Duration::from_secs(3),
        }
    }
}

/// Short message for the player that disappears on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub remaining: Duration,
}

/// One running game: the day's mine, the player and everything they carry.
///
/// Every mutation goes through the methods below, called from the one loop that also drives
/// [`GameSession::tick`], so nothing is ever observed half-updated.
#[derive(Clone, Debug)]
pub struct GameSession {
    config: SessionConfig,
    physics: PlayerPhysics,
    engine: MineEngine,
    player: Player,
    inventory: Inventory,
    camera: Camera,
    items: WorldItems,
    climb: Option<RopeClimb>,
    notices: VecDeque<Notice>,
    effects: Vec<Effect>,
    day: u32,
    time_remaining: Duration,
    rope_length: Coord,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let rope_length = config.grid.rope_length;
        let grid_config = Self::grid_config(&config, rope_length)?;
        let grid = RandomGridGenerator::new(rng.random()).generate(grid_config);

        let mut session = Self {
            config,
            physics: PlayerPhysics::new(config.physics),
            engine: MineEngine::new(grid).with_tables(config.drops, config.blueprint_odds),
            player: Self::player_at_house(&config.layout),
            inventory: Inventory::starter(),
            camera: Camera::default(),
            items: WorldItems::new(config.items),
            climb: None,
            notices: VecDeque::new(),
            effects: Vec::new(),
            day: 1,
            time_remaining: config.day.day_length,
            rope_length,
            rng,
        };
        session.snap_camera();
        log::debug!("New session, seed {}", seed);
        Ok(session)
    }

    pub fn from_entropy(config: SessionConfig) -> Result<Self> {
        Self::new(config, rand::random())
    }

    fn grid_config(config: &SessionConfig, rope_length: Coord) -> Result<GridConfig> {
        let grid = &config.grid;
        Ok(GridConfig::new(
            grid.size,
            grid.mines,
            grid.safe_rows,
            config.layout.rope_column,
            rope_length,
        )?
        .with_deposit_chance(grid.deposit_chance))
    }

    fn player_at_house(layout: &WorldLayout) -> Player {
        let (x, y) = layout.house;
        let mut player = Player::new(x, y);
        player.grounded = true;
        player
    }

    fn camera_bounds(&self) -> CameraBounds {
        CameraBounds::new(self.engine.size(), &self.config.layout)
    }

    fn snap_camera(&mut self) {
        let bounds = self.camera_bounds();
        self.camera.snap_to(
            &self.player,
            &bounds,
            &self.config.viewport,
            &self.config.camera,
        );
    }

    fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("Notice: {}", message);
        self.notices.push_back(Notice {
            message,
            remaining: self.config.notice_duration,
        });
    }

    /// Runs one fixed frame standing for `dt` of wall time. Returns how the day ended, if it did.
    pub fn tick(&mut self, dt: Duration, keys: Keys) -> Option<DayEnd> {
        let was_climbing = self.climb.is_some();
        let climb_done = match &mut self.climb {
            Some(climb) => climb.advance(&mut self.player, dt),
            None => false,
        };
        if climb_done {
            self.climb = None;
        }

        for notice in &mut self.notices {
            notice.remaining = notice.remaining.saturating_sub(dt);
        }
        self.notices.retain(|notice| !notice.remaining.is_zero());

        self.time_remaining = self.time_remaining.saturating_sub(dt);
        if self.time_remaining.is_zero() {
            self.advance_day(DayEnd::PassedOut);
            return Some(DayEnd::PassedOut);
        }

        let columns = self.engine.grid().columns();
        let world = World::new(self.engine.grid(), &self.config.layout);
        if !was_climbing {
            let bounds = self.config.layout.horizontal_bounds(self.player.y, columns);
            self.physics.step(&mut self.player, keys, &world, bounds);
        }

        self.items.step(&world);
        self.items.collect(&self.player, &mut self.inventory);

        if let Some(coords) = self.player.tile(self.engine.size())
            && let Some(resource) = self.engine.take_loose_item(coords)
        {
            log::debug!("Picked up loose {:?} at {:?}", resource, coords);
            self.inventory.add(resource, 1);
        }

        let bounds = self.camera_bounds();
        self.camera.update(
            &self.player,
            &bounds,
            &self.config.viewport,
            &self.config.camera,
        );
        None
    }

    /// Digs at `coords`. Ignored while climbing, without a pickaxe, or out of bounds.
    pub fn reveal_at(&mut self, coords: Coord2) -> Option<RevealReport> {
        if self.player.is_climbing {
            log::trace!("Ignoring reveal at {:?} while climbing", coords);
            return None;
        }
        if !self.inventory.has_pickaxe {
            self.notify("You need a pickaxe to dig");
            return None;
        }

        let report = match self
            .engine
            .reveal(coords, &mut self.inventory, &mut self.rng)
        {
            Ok(report) => report,
            Err(err) => {
                log::trace!("Ignoring reveal at {:?}: {}", coords, err);
                return None;
            }
        };

        for spawn in &report.spawns {
            self.items.spawn(spawn.kind, spawn.x, spawn.y);
        }
        self.effects.extend_from_slice(&report.effects);
        if let Some(blueprint) = report.blueprint {
            self.notify(format!("Found a blueprint: {:?}", blueprint));
        }
        if report.won {
            self.notify("You reached the bottom of the mine");
        }
        if report.armor_absorbed {
            self.notify("Your armor took the blast");
        }
        if report.death {
            self.advance_day(DayEnd::Died);
        }
        Some(report)
    }

    pub fn dig_facing(&mut self) -> Option<RevealReport> {
        let coords = self.player.facing_tile(self.engine.size())?;
        self.reveal_at(coords)
    }

    /// Flags or unflags `coords`. Ignored while climbing or out of bounds.
    pub fn toggle_flag_at(&mut self, coords: Coord2) -> Option<FlagOutcome> {
        if self.player.is_climbing {
            log::trace!("Ignoring flag at {:?} while climbing", coords);
            return None;
        }
        let outcome = match self.engine.toggle_flag(coords, &mut self.inventory) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::trace!("Ignoring flag at {:?}: {}", coords, err);
                return None;
            }
        };
        match outcome {
            FlagOutcome::Rejected(FlagRejection::NoCharges) => {
                self.notify("No disarm charges left");
            }
            FlagOutcome::Flagged {
                kit_opened: true, ..
            } => {
                self.notify("Opened a fresh disarm kit");
            }
            _ => {}
        }
        Some(outcome)
    }

    pub fn flag_facing(&mut self) -> Option<FlagOutcome> {
        let coords = self.player.facing_tile(self.engine.size())?;
        self.toggle_flag_at(coords)
    }

    fn at_rope(&self) -> bool {
        (self.player.x - f32::from(self.config.layout.rope_column)).abs() < 1.0
    }

    /// Climbs down from the surface into the top of the shaft.
    pub fn descend_rope(&mut self) -> bool {
        if self.climb.is_some() || self.player.zone() != Zone::Overworld || !self.at_rope() {
            return false;
        }
        self.climb = Some(RopeClimb::begin(
            &mut self.player,
            self.config.layout.rope_column,
            0.0,
            &self.config.climb,
        ));
        true
    }

    /// Climbs back up to the surface from anywhere along the rope.
    pub fn ascend_rope(&mut self) -> bool {
        if self.climb.is_some()
            || self.player.zone() != Zone::Mine
            || self.player.y > f32::from(self.rope_length)
            || !self.at_rope()
        {
            return false;
        }
        self.climb = Some(RopeClimb::begin(
            &mut self.player,
            self.config.layout.rope_column,
            self.config.layout.surface_y(),
            &self.config.climb,
        ));
        true
    }

    /// Closes the day: applies the penalty if due, then starts the next day on a fresh mine.
    pub fn advance_day(&mut self, end: DayEnd) -> Vec<(Resource, u32)> {
        let lost = if end.is_penalized() {
            self.inventory.apply_penalty(self.config.day.penalty)
        } else {
            Vec::new()
        };

        let grid = match Self::grid_config(&self.config, self.rope_length) {
            Ok(grid_config) => RandomGridGenerator::new(self.rng.random()).generate(grid_config),
            Err(err) => {
                log::warn!("Keeping yesterday's grid shape: {}", err);
                let fallback = GridConfig {
                    rope_length: self.config.grid.rope_length,
                    ..self.config.grid
                };
                RandomGridGenerator::new(self.rng.random()).generate(fallback)
            }
        };

        self.engine =
            MineEngine::new(grid).with_tables(self.config.drops, self.config.blueprint_odds);
        self.player = Self::player_at_house(&self.config.layout);
        self.climb = None;
        self.items.clear();
        self.effects.clear();
        self.day += 1;
        self.time_remaining = self.config.day.day_length;
        self.snap_camera();

        log::debug!("Day {} begins after {:?}, lost {:?}", self.day, end, lost);
        match end {
            DayEnd::Slept => {}
            DayEnd::Died => self.notify("You were caught in a blast"),
            DayEnd::PassedOut => self.notify("You passed out from exhaustion"),
        }
        lost
    }

    /// Drops a collectible into the world, e.g. output from the recycler.
    pub fn spawn_item(&mut self, kind: Resource, x: f32, y: f32) -> u32 {
        self.items.spawn(kind, x, y)
    }

    pub fn place_item(&mut self, coords: Coord2, item: TileItem) -> bool {
        self.engine.place_item(coords, item).unwrap_or(false)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &MineEngine {
        &self.engine
    }

    pub fn grid(&self) -> &Grid {
        self.engine.grid()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// For collaborators trading with the player, such as shops.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn items(&self) -> &WorldItems {
        &self.items
    }

    pub fn climb(&self) -> Option<&RopeClimb> {
        self.climb.as_ref()
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    pub fn rope_length(&self) -> Coord {
        self.rope_length
    }

    pub fn depth(&self) -> Coord {
        self.engine.max_depth()
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn to_save(&self) -> SaveData {
        // a save taken mid-climb resumes at the end of the rope
        let mut player = self.player;
        if let Some(climb) = &self.climb {
            player.y = climb.target();
            player.is_climbing = false;
        }
        SaveData {
            version: SAVE_VERSION,
            player,
            coins: self.inventory.coins,
            inventory: self.inventory.clone(),
            time_remaining_ms: u64::try_from(self.time_remaining.as_millis()).unwrap_or(u64::MAX),
            day: self.day,
            rope_length: self.rope_length,
            depth: self.engine.max_depth(),
            grid: self.engine.grid().clone(),
        }
    }

    /// Resumes a saved game. The save must pass [`SaveData::check`] and the rope column must fit
    /// the saved grid.
    pub fn from_save(config: SessionConfig, save: SaveData, seed: u64) -> Result<Self> {
        save.check()?;
        if config.layout.rope_column >= save.grid.columns() {
            return Err(GameError::MalformedSave);
        }
        let mut inventory = save.inventory;
        inventory.coins = save.coins;

        let mut session = Self {
            config,
            physics: PlayerPhysics::new(config.physics),
            engine: MineEngine::restore(save.grid, save.depth)
                .with_tables(config.drops, config.blueprint_odds),
            player: save.player,
            inventory,
            camera: Camera::default(),
            items: WorldItems::new(config.items),
            climb: None,
            notices: VecDeque::new(),
            effects: Vec::new(),
            day: save.day,
            time_remaining: Duration::from_millis(save.time_remaining_ms),
            rope_length: save.rope_length,
            rng: StdRng::seed_from_u64(seed),
        };
        session.snap_camera();
        log::debug!("Resumed day {}", session.day);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            notice_duration: Duration::from_secs(2),
            ..Default::default()
        }
    }

    /// Session on a fixed grid: a lone mine at `(5, 5)`, top four rows open.
    fn session() -> GameSession {
        let mut session = GameSession::new(config(), 1).unwrap();
        let grid = Grid::from_mine_coords((16, 100), &[(5, 5)], 4).unwrap();
        session.engine = MineEngine::new(grid).with_tables(
            DropTable::default(),
            BlueprintOdds {
                base: 0.0,
                per_disarm: 0.0,
                max: 0.0,
            },
        );
        session
    }

    fn run(session: &mut GameSession, frames: usize, keys: Keys) {
        for _ in 0..frames {
            session.tick(FRAME, keys);
        }
    }

    #[test]
    fn starts_at_the_house_on_day_one() {
        let session = GameSession::new(config(), 5).unwrap();

        assert_eq!(session.day(), 1);
        assert_eq!(session.player().x, 3.0);
        assert_eq!(session.player().y, -2.0);
        assert_eq!(session.grid().mine_count(), 450);
        assert_eq!(session.inventory(), &Inventory::starter());
    }

    #[test]
    fn rope_descent_from_the_surface() {
        let mut session = session();
        session.player = Player::new(8.0, -2.0);
        session.player.grounded = true;

        assert!(session.descend_rope());
        assert!(session.player().is_climbing);
        assert_eq!(session.player().x, 8.0);
        assert!(!session.descend_rope());

        let mut elapsed = Duration::ZERO;
        while session.player().is_climbing {
            session.tick(FRAME, Keys::empty());
            elapsed += FRAME;
            assert!(session.player().y >= -2.0 && session.player().y <= 0.0);
        }

        assert!(elapsed >= Duration::from_millis(500));
        assert_eq!(session.player().y, 0.0);
        assert_eq!(session.player().vy, 0.0);
        assert!(session.climb().is_none());

        // falls down the open shaft to the first hidden row
        run(&mut session, 120, Keys::empty());
        assert_eq!(session.player().y, 3.0);
        assert!(session.player().grounded);
    }

    #[test]
    fn rope_ascent_returns_to_the_surface() {
        let mut session = session();
        session.player = Player::new(8.0, 3.0);

        assert!(session.ascend_rope());
        run(&mut session, 120, Keys::empty());

        assert!(!session.player().is_climbing);
        assert_eq!(session.player().y, -2.0);
    }

    #[test]
    fn rope_needs_the_player_next_to_it() {
        let mut session = session();

        assert!(!session.descend_rope());
        session.player = Player::new(2.0, 3.0);
        assert!(!session.ascend_rope());
    }

    #[test]
    fn flagged_mine_is_collected_safely() {
        let mut session = session();

        let outcome = session.toggle_flag_at((5, 5)).unwrap();
        assert!(outcome.has_update());
        assert_eq!(session.inventory().disarm_charges, 2);

        let report = session.reveal_at((5, 5)).unwrap();

        assert_eq!(report.outcome, TileOutcome::DisarmedMine);
        assert!(!report.death);
        assert_eq!(session.inventory().defused_mines, 1);
        assert_eq!(session.day(), 1);
        assert_eq!(session.grid().mine_count(), 0);
    }

    #[test]
    fn explosion_ends_the_day_with_a_penalty() {
        let mut session = session();
        session.inventory.coins = 10;
        session.inventory.silver = 3;
        session.inventory.disarm_charges = 2;

        let report = session.reveal_at((5, 5)).unwrap();

        assert!(report.death);
        assert_eq!(session.day(), 2);
        assert_eq!(session.inventory().coins, 5);
        assert_eq!(session.inventory().silver, 2);
        assert_eq!(session.inventory().disarm_charges, 2);
        assert_eq!(session.player().y, -2.0);
        assert_eq!(session.grid().mine_count(), 450);
        assert!(session.notices().count() > 0);
    }

    #[test]
    fn armor_absorbs_a_blast() {
        let mut session = session();
        session.inventory.armor_charges = 1;

        let report = session.reveal_at((5, 5)).unwrap();

        assert!(report.armor_absorbed);
        assert_eq!(session.day(), 1);
        assert_eq!(
            session.drain_effects(),
            vec![Effect::ScreenShake, Effect::HitFlash]
        );
        assert!(session.drain_effects().is_empty());
    }

    #[test]
    fn requests_are_ignored_while_climbing_or_out_of_bounds() {
        let mut session = session();
        session.player = Player::new(8.0, -2.0);
        session.descend_rope();

        assert_eq!(session.reveal_at((5, 5)), None);
        assert_eq!(session.toggle_flag_at((5, 5)), None);

        run(&mut session, 60, Keys::empty());
        assert_eq!(session.reveal_at((99, 500)), None);
        assert_eq!(session.toggle_flag_at((16, 0)), None);
        assert_eq!(session.grid()[(5, 5)].flag(), Flag::None);
    }

    #[test]
    fn missing_charges_show_a_passing_notice() {
        let mut session = session();
        session.inventory.disarm_charges = 0;
        session.inventory.disarm_kits = 0;

        let outcome = session.toggle_flag_at((7, 7));

        assert_eq!(outcome, Some(FlagOutcome::Rejected(FlagRejection::NoCharges)));
        assert_eq!(
            session.notices().map(|notice| notice.message.as_str()).collect::<Vec<_>>(),
            vec!["No disarm charges left"]
        );

        run(&mut session, 130, Keys::empty());
        assert_eq!(session.notices().count(), 0);
    }

    #[test]
    fn day_clock_runs_out() {
        let mut session = GameSession::new(
            SessionConfig {
                day: DayPolicy {
                    day_length: Duration::from_millis(100),
                    penalty: 0.5,
                },
                ..config()
            },
            2,
        )
        .unwrap();
        session.inventory.coal = 4;

        let ended = (0..10).find_map(|_| session.tick(FRAME, Keys::empty()));

        assert_eq!(ended, Some(DayEnd::PassedOut));
        assert_eq!(session.day(), 2);
        assert_eq!(session.inventory().coal, 2);
        assert_eq!(session.time_remaining(), Duration::from_millis(100));
    }

    #[test]
    fn sleeping_keeps_everything() {
        let mut session = session();
        session.inventory.gems = 3;

        let lost = session.advance_day(DayEnd::Slept);

        assert!(lost.is_empty());
        assert_eq!(session.inventory().gems, 3);
        assert_eq!(session.day(), 2);
    }

    #[test]
    fn walking_over_loose_items_collects_them() {
        let mut session = session();
        session.player = Player::new(2.0, 2.0);
        assert!(session.place_item((2, 3), TileItem::Loose(Resource::Scrap)));

        run(&mut session, 60, Keys::empty());

        assert_eq!(session.inventory().scrap, 1);
        assert_eq!(session.grid()[(2, 3)].item(), None);
    }

    #[test]
    fn dropped_items_fall_to_the_player() {
        let mut session = session();
        session.player = Player::new(2.0, 3.0);
        session.spawn_item(Resource::Coin, 2.5, 1.5);

        run(&mut session, 60, Keys::empty());

        assert!(session.items().is_empty());
        assert_eq!(session.inventory().coins, 1);
    }

    #[test]
    fn digging_follows_facing() {
        let mut session = session();
        session.player = Player::new(4.0, 3.0);
        session.player.facing = Facing::Down;

        let report = session.dig_facing().unwrap();

        assert_eq!(report.outcome, TileOutcome::Revealed);
        assert!(session.grid()[(4, 4)].is_revealed());
    }

    #[test]
    fn save_resumes_the_same_day() {
        let mut session = session();
        session.toggle_flag_at((5, 5));
        session.inventory.coins = 9;
        run(&mut session, 10, Keys::RIGHT);

        let json = session.to_save().to_json().unwrap();
        let save = SaveData::from_json(&json).unwrap().unwrap();
        let resumed = GameSession::from_save(config(), save, 3).unwrap();

        assert_eq!(resumed.grid(), session.grid());
        assert_eq!(resumed.player(), session.player());
        assert_eq!(resumed.inventory(), session.inventory());
        assert_eq!(resumed.day(), session.day());
        assert_eq!(resumed.rope_length(), session.rope_length());
    }

    #[test]
    fn save_taken_on_the_rope_resumes_below_it() {
        let mut session = session();
        session.player = Player::new(8.0, -2.0);
        session.player.grounded = true;
        assert!(session.descend_rope());
        run(&mut session, 5, Keys::empty());

        let save = session.to_save();
        let mut resumed = GameSession::from_save(config(), save, 3).unwrap();

        assert!(!resumed.player().is_climbing);
        assert_eq!(resumed.player().y, 0.0);
        let report = resumed.reveal_at((4, 4)).unwrap();
        assert_eq!(report.outcome, TileOutcome::Revealed);
        run(&mut resumed, 30, Keys::RIGHT);
        assert!(resumed.player().x > 8.0);
    }

    #[test]
    fn save_with_the_player_stuck_on_the_rope_is_refused() {
        let mut save = session().to_save();
        save.player.is_climbing = true;

        assert!(matches!(
            GameSession::from_save(config(), save, 3),
            Err(GameError::MalformedSave)
        ));
    }
}
