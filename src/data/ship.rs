//! Ship data: live ship instances and the immutable templates they reference.
//! Instances are mutated by store updates; templates are loaded once per session.

use serde::{Deserialize, Serialize};

/// `[effective, base]` stat pair as delivered by the game state feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct StatPair {
    pub effective: i64,
    pub base: i64,
}

impl From<[i64; 2]> for StatPair {
    fn from(raw: [i64; 2]) -> Self {
        Self {
            effective: raw[0],
            base: raw[1],
        }
    }
}

impl From<StatPair> for [i64; 2] {
    fn from(pair: StatPair) -> Self {
        [pair.effective, pair.base]
    }
}

/// Live ship owned by the player. Never deleted mid-session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipInstance {
    pub id: i64,
    pub template_id: i64,
    #[serde(default)]
    pub level: i64,
    pub now_hp: i64,
    pub max_hp: i64,
    #[serde(default)]
    pub firepower: StatPair,
    #[serde(default)]
    pub torpedo: StatPair,
    #[serde(default)]
    pub anti_air: StatPair,
    #[serde(default)]
    pub armor: StatPair,
    #[serde(default)]
    pub evasion: StatPair,
    #[serde(default)]
    pub anti_sub: StatPair,
    #[serde(default)]
    pub line_of_sight: StatPair,
    #[serde(default)]
    pub luck: StatPair,
    /// Equipment instance ids per fixed slot; values <= 0 are empty slots.
    #[serde(default)]
    pub slots: Vec<i64>,
    /// Expansion (non-combat) slot; 0 or -1 when empty or not opened.
    #[serde(default)]
    pub expansion_slot: i64,
    /// Remaining aircraft per fixed slot.
    #[serde(default)]
    pub aircraft: Vec<i64>,
    /// Fatigue/morale value.
    #[serde(default = "default_condition")]
    pub condition: i64,
}

fn default_condition() -> i64 {
    49
}

impl ShipInstance {
    /// Equipped instance ids in slot order, expansion slot last. Empty slots skipped.
    pub fn equipped_ids(&self) -> Vec<i64> {
        self.slots
            .iter()
            .copied()
            .chain(std::iter::once(self.expansion_slot))
            .filter(|&id| id > 0)
            .collect()
    }
}

/// Reference data for a ship class/variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub ship_type: i64,
    #[serde(default)]
    pub max_hp: i64,
    #[serde(default)]
    pub slot_count: usize,
    /// Max aircraft per slot.
    #[serde(default)]
    pub aircraft_capacity: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship(slots: Vec<i64>, expansion_slot: i64) -> ShipInstance {
        ShipInstance {
            id: 1,
            template_id: 10,
            level: 99,
            now_hp: 30,
            max_hp: 40,
            firepower: StatPair::default(),
            torpedo: StatPair::default(),
            anti_air: StatPair::default(),
            armor: StatPair::default(),
            evasion: StatPair::default(),
            anti_sub: StatPair::default(),
            line_of_sight: StatPair::default(),
            luck: StatPair::default(),
            slots,
            expansion_slot,
            aircraft: vec![],
            condition: 49,
        }
    }

    #[test]
    fn equipped_ids_skip_empty_slots_and_append_expansion() {
        let s = ship(vec![5, -1, 7, 0], 9);
        assert_eq!(s.equipped_ids(), vec![5, 7, 9]);
        let s = ship(vec![5], -1);
        assert_eq!(s.equipped_ids(), vec![5]);
    }

    #[test]
    fn stat_pair_uses_array_wire_format() {
        let pair: StatPair = serde_json::from_str("[63, 40]").expect("parse");
        assert_eq!(pair.effective, 63);
        assert_eq!(pair.base, 40);
        assert_eq!(serde_json::to_string(&pair).expect("serialize"), "[63,40]");
    }
}
