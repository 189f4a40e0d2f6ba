use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Charges a freshly opened disarm kit provides.
pub const CHARGES_PER_KIT: u32 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Stone,
    Silver,
    Gem,
    Coal,
    Scrap,
    DefusedMine,
    Coin,
}

impl Resource {
    /// Everything a death or pass-out can take a share of.
    pub const CARRIED: [Resource; 7] = [
        Resource::Stone,
        Resource::Silver,
        Resource::Gem,
        Resource::Coal,
        Resource::Scrap,
        Resource::DefusedMine,
        Resource::Coin,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Blueprint {
    ReinforcedArmor,
    KitPouch,
    Lantern,
    Recycler,
}

impl Blueprint {
    pub const ALL: [Blueprint; 4] = [
        Blueprint::ReinforcedArmor,
        Blueprint::KitPouch,
        Blueprint::Lantern,
        Blueprint::Recycler,
    ];
}

/// Result of spending one disarm charge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChargeReceipt {
    /// A spare kit was opened to refill charges, before or after the charge was spent.
    pub kit_opened: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub stone: u32,
    pub silver: u32,
    pub gems: u32,
    pub coal: u32,
    pub scrap: u32,
    pub defused_mines: u32,
    pub coins: u32,
    pub disarm_charges: u32,
    pub disarm_kits: u32,
    pub armor_charges: u32,
    pub has_pickaxe: bool,
    pub lifetime_disarms: u32,
    pub blueprints: BTreeSet<Blueprint>,
}

impl Inventory {
    /// What a new game starts with: a pickaxe and one equipped kit plus a spare.
    pub fn starter() -> Self {
        Self {
            disarm_charges: CHARGES_PER_KIT,
            disarm_kits: 1,
            has_pickaxe: true,
            ..Default::default()
        }
    }

    pub fn count(&self, resource: Resource) -> u32 {
        use Resource::*;
        match resource {
            Stone => self.stone,
            Silver => self.silver,
            Gem => self.gems,
            Coal => self.coal,
            Scrap => self.scrap,
            DefusedMine => self.defused_mines,
            Coin => self.coins,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut u32 {
        use Resource::*;
        match resource {
            Stone => &mut self.stone,
            Silver => &mut self.silver,
            Gem => &mut self.gems,
            Coal => &mut self.coal,
            Scrap => &mut self.scrap,
            DefusedMine => &mut self.defused_mines,
            Coin => &mut self.coins,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        let slot = self.slot_mut(resource);
        *slot = slot.saturating_add(amount);
    }

    /// Refills charges from a spare kit, returns whether a kit was available.
    fn open_kit(&mut self) -> bool {
        if self.disarm_kits == 0 {
            return false;
        }
        self.disarm_kits -= 1;
        self.disarm_charges = CHARGES_PER_KIT;
        log::debug!("opened disarm kit, {} spare left", self.disarm_kits);
        true
    }

    /// Spends one disarm charge, opening a spare kit when empty.
    ///
    /// Returns `None` without touching anything when there are neither charges nor kits. When the
    /// spent charge was the last one, a spare kit is opened right away.
    pub fn consume_disarm_charge(&mut self) -> Option<ChargeReceipt> {
        let mut kit_opened = false;
        if self.disarm_charges == 0 {
            if !self.open_kit() {
                return None;
            }
            kit_opened = true;
        }

        self.disarm_charges -= 1;

        if self.disarm_charges == 0 && self.open_kit() {
            kit_opened = true;
        }

        Some(ChargeReceipt { kit_opened })
    }

    pub fn consume_armor_charge(&mut self) -> bool {
        if self.armor_charges == 0 {
            return false;
        }
        self.armor_charges -= 1;
        true
    }

    pub fn record_disarm(&mut self) {
        self.lifetime_disarms = self.lifetime_disarms.saturating_add(1);
    }

    pub fn has_blueprint(&self, blueprint: Blueprint) -> bool {
        self.blueprints.contains(&blueprint)
    }

    pub fn unlock_blueprint(&mut self, blueprint: Blueprint) -> bool {
        self.blueprints.insert(blueprint)
    }

    /// Takes away `fraction` of every carried resource, rounding the loss down.
    ///
    /// Equipment (charges, kits, armor, pickaxe) and blueprints are kept.
    pub fn apply_penalty(&mut self, fraction: f32) -> Vec<(Resource, u32)> {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut lost = Vec::new();
        for resource in Resource::CARRIED {
            let slot = self.slot_mut(resource);
            let amount = (*slot as f32 * fraction).floor() as u32;
            if amount > 0 {
                *slot -= amount;
                lost.push((resource, amount));
            }
        }
        lost
    }
}
