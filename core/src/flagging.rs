use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagRejection {
    /// Neither a charge nor a spare kit was left.
    NoCharges,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    /// Flag placed; the tile is now disarmed.
    Flagged {
        charge_consumed: bool,
        kit_opened: bool,
    },
    /// Flag removed; the disarm stays.
    Unflagged,
    Rejected(FlagRejection),
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        use FlagOutcome::*;
        match self {
            NoChange => false,
            Flagged { .. } => true,
            Unflagged => true,
            Rejected(_) => false,
        }
    }
}

impl MineEngine {
    /// Flags a hidden tile, spending a disarm charge the first time, or removes its flag.
    ///
    /// A placed flag and the disarm it pays for are written together, so a flag is never seen
    /// without its disarm.
    pub fn toggle_flag(
        &mut self,
        coords: Coord2,
        inventory: &mut Inventory,
    ) -> Result<FlagOutcome> {
        use FlagOutcome::*;

        let coords = self.grid().validate_coords(coords)?;
        let tile = self.grid()[coords];

        if tile.is_revealed() {
            return Ok(NoChange);
        }

        if tile.is_flagged() {
            self.grid_mut().tile_mut(coords).flag = Flag::None;
            log::debug!("Unflagged {:?}", coords);
            return Ok(Unflagged);
        }

        let receipt = if tile.is_disarmed() {
            None
        } else {
            match inventory.consume_disarm_charge() {
                Some(receipt) => Some(receipt),
                None => {
                    log::debug!("No disarm charges left to flag {:?}", coords);
                    return Ok(Rejected(FlagRejection::NoCharges));
                }
            }
        };

        let tile = self.grid_mut().tile_mut(coords);
        tile.flag = Flag::Mine;
        tile.is_disarmed = true;
        log::debug!(
            "Flagged {:?}, {} charges and {} kits left",
            coords,
            inventory.disarm_charges,
            inventory.disarm_kits
        );

        Ok(Flagged {
            charge_consumed: receipt.is_some(),
            kit_opened: receipt.is_some_and(|receipt| receipt.kit_opened),
        })
    }
}
