use serde::{Deserialize, Serialize};

use crate::*;

/// Bumped whenever the layout below changes; older blobs are not migrated.
pub const SAVE_VERSION: u32 = 3;

/// Everything needed to resume a day where it was left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub player: Player,
    /// Authoritative over `inventory.coins` on load.
    pub coins: u32,
    pub inventory: Inventory,
    pub time_remaining_ms: u64,
    pub day: u32,
    pub rope_length: Coord,
    pub depth: Coord,
    pub grid: Grid,
}

impl SaveData {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| {
            log::error!("Failed to encode save: {}", err);
            GameError::MalformedSave
        })
    }

    /// Decodes a save blob.
    ///
    /// A blob written by another version is no save at all and yields `Ok(None)`; a blob of the
    /// current version that does not decode, or whose grid could not come from play, is an error.
    pub fn from_json(json: &str) -> Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|err| {
            log::warn!("Save is not valid JSON: {}", err);
            GameError::MalformedSave
        })?;

        let version = value.get("version").and_then(serde_json::Value::as_u64);
        if version != Some(u64::from(SAVE_VERSION)) {
            log::warn!(
                "Ignoring save with version {:?}, expected {}",
                version,
                SAVE_VERSION
            );
            return Ok(None);
        }

        let mut save: Self = serde_json::from_value(value).map_err(|err| {
            log::warn!("Save does not decode: {}", err);
            GameError::MalformedSave
        })?;
        save.check()?;
        save.inventory.coins = save.coins;
        Ok(Some(save))
    }

    /// Rejects states play never writes: an invalid grid, a rope longer than the mine, or a
    /// player on the rope. Climbs are not part of a save.
    pub fn check(&self) -> Result<()> {
        self.grid.validate().map_err(|_| GameError::MalformedSave)?;
        if self.rope_length > self.grid.rows() {
            log::warn!("Save rope of {} rows is longer than the mine", self.rope_length);
            return Err(GameError::MalformedSave);
        }
        if self.player.is_climbing {
            log::warn!("Save has the player on the rope");
            return Err(GameError::MalformedSave);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        let mut inventory = Inventory::starter();
        inventory.coins = 12;
        inventory.silver = 4;
        SaveData {
            version: SAVE_VERSION,
            player: Player::new(3.0, -2.0),
            coins: 12,
            inventory,
            time_remaining_ms: 90_000,
            day: 4,
            rope_length: 5,
            depth: 7,
            grid: Grid::from_mine_coords((8, 12), &[(1, 5), (6, 9)], 2).unwrap(),
        }
    }

    #[test]
    fn save_survives_json() {
        let save = sample();

        let json = save.to_json().unwrap();

        assert_eq!(SaveData::from_json(&json).unwrap(), Some(save));
    }

    #[test]
    fn other_versions_are_no_save() {
        let mut save = sample();
        save.version = SAVE_VERSION + 1;
        let json = save.to_json().unwrap();

        assert_eq!(SaveData::from_json(&json), Ok(None));
        assert_eq!(SaveData::from_json(r#"{"day": 2}"#), Ok(None));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            SaveData::from_json("not json"),
            Err(GameError::MalformedSave)
        );

        let json = format!(r#"{{"version": {}, "day": 2}}"#, SAVE_VERSION);
        assert_eq!(SaveData::from_json(&json), Err(GameError::MalformedSave));
    }

    #[test]
    fn flag_without_disarm_is_rejected() {
        let json = sample().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let tiles = value["grid"]["tiles"]["data"].as_array_mut().unwrap();
        tiles[0]["flag"] = serde_json::json!("Mine");

        let tampered = serde_json::to_string(&value).unwrap();

        assert_eq!(
            SaveData::from_json(&tampered),
            Err(GameError::MalformedSave)
        );
    }

    #[test]
    fn player_on_the_rope_is_rejected() {
        let mut save = sample();
        save.player.is_climbing = true;
        let json = save.to_json().unwrap();

        assert_eq!(SaveData::from_json(&json), Err(GameError::MalformedSave));
        assert_eq!(save.check(), Err(GameError::MalformedSave));
    }

    #[test]
    fn top_level_coins_win() {
        let mut save = sample();
        save.inventory.coins = 0;
        let json = save.to_json().unwrap();

        let loaded = SaveData::from_json(&json).unwrap().unwrap();

        assert_eq!(loaded.inventory.coins, 12);
    }
}
