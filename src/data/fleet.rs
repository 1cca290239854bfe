//! Fleet rosters and the fleet resolver: roster id -> positional ship ids, split into the
//! main (positions 0-5) and escort (positions 6-11) sub-fleets.

use serde::{Deserialize, Serialize};

use crate::data::store::Table;

/// Ships per sub-fleet.
pub const SUB_FLEET_SIZE: usize = 6;
/// Positions in a combined fleet (main + escort).
pub const COMBINED_FLEET_SIZE: usize = SUB_FLEET_SIZE * 2;
/// Only the first fleet can form a combined fleet.
pub const COMBINED_FLEET_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetRoster {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Ship instance ids by position; values <= 0 mark an empty slot.
    #[serde(default)]
    pub ship_ids: Vec<i64>,
}

/// Combined-fleet mode. Wire format is the game's integer code; any non-zero code is combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CombinedFleetType {
    #[default]
    Single,
    CarrierTask,
    SurfaceTask,
    Transport,
}

impl CombinedFleetType {
    pub fn is_combined(self) -> bool {
        self != Self::Single
    }
}

impl From<i64> for CombinedFleetType {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::CarrierTask,
            2 => Self::SurfaceTask,
            3 => Self::Transport,
            _ => Self::Single,
        }
    }
}

impl From<CombinedFleetType> for i64 {
    fn from(kind: CombinedFleetType) -> Self {
        match kind {
            CombinedFleetType::Single => 0,
            CombinedFleetType::CarrierTask => 1,
            CombinedFleetType::SurfaceTask => 2,
            CombinedFleetType::Transport => 3,
        }
    }
}

/// One roster position. `ship_id` is `None` for an empty slot; the position is kept so that
/// indices stay aligned with battle ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RosterSlot {
    pub position: usize,
    pub ship_id: Option<i64>,
}

impl RosterSlot {
    fn new(position: usize, raw_id: i64) -> Self {
        Self {
            position,
            ship_id: (raw_id > 0).then_some(raw_id),
        }
    }
}

/// Resolved fleet: positional slots split into main and escort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSlots {
    pub fleet_id: i64,
    pub combined: bool,
    pub main: Vec<RosterSlot>,
    pub escort: Vec<RosterSlot>,
}

impl FleetSlots {
    fn empty(fleet_id: i64, combined: bool) -> Self {
        Self {
            fleet_id,
            combined,
            main: Vec::new(),
            escort: Vec::new(),
        }
    }

    /// All positions, main then escort.
    pub fn slots(&self) -> impl Iterator<Item = &RosterSlot> {
        self.main.iter().chain(self.escort.iter())
    }

    pub fn main_ids(&self) -> Vec<i64> {
        self.main.iter().filter_map(|slot| slot.ship_id).collect()
    }

    pub fn escort_ids(&self) -> Vec<i64> {
        self.escort.iter().filter_map(|slot| slot.ship_id).collect()
    }

    /// Ship at a ledger position (0-11), if a ship occupies it.
    pub fn ship_at(&self, position: usize) -> Option<i64> {
        self.slots()
            .find(|slot| slot.position == position)
            .and_then(|slot| slot.ship_id)
    }

    pub fn len(&self) -> usize {
        self.main.len() + self.escort.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a fleet id to its positional slots.
///
/// Without the combined flag every fleet stands alone: up to six positions, all main.
/// With it, fleet 1's roster (up to twelve) is split at position 6 into main and escort;
/// other fleets still stand alone. An unknown fleet id resolves to an empty fleet.
pub fn resolve_fleet(
    fleets: &Table<FleetRoster>,
    fleet_id: i64,
    combined: CombinedFleetType,
) -> FleetSlots {
    let combined = combined.is_combined() && fleet_id == COMBINED_FLEET_ID;
    let Some(roster) = fleets.get(fleet_id) else {
        tracing::trace!(target: "fleetview::fleet", fleet_id, "fleet.resolve.unknown");
        return FleetSlots::empty(fleet_id, combined);
    };

    let limit = if combined {
        COMBINED_FLEET_SIZE
    } else {
        SUB_FLEET_SIZE
    };
    let mut slots: Vec<RosterSlot> = roster
        .ship_ids
        .iter()
        .take(limit)
        .enumerate()
        .map(|(position, &raw)| RosterSlot::new(position, raw))
        .collect();

    let escort = if slots.len() > SUB_FLEET_SIZE {
        slots.split_off(SUB_FLEET_SIZE)
    } else {
        Vec::new()
    };

    FleetSlots {
        fleet_id,
        combined,
        main: slots,
        escort,
    }
}
