//! Per-battle fleet-info summary: main/escort rows for both sides with start HP, reconciled
//! current HP, damage taken, max HP, and escape flags.

use rayon::prelude::*;
use serde::Serialize;

use crate::battle::hp::{reconcile_hp, Hp, HpLedger, HpSource};
use crate::battle::record::{BattleRecord, BattleSegment, Side};
use crate::data::fleet::{resolve_fleet, FleetSlots, SUB_FLEET_SIZE};
use crate::data::join::{join_ship, UNKNOWN_NAME};
use crate::data::store::NormalizedStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantRow {
    pub position: usize,
    /// Ship instance id (friendly) or ship template id (enemy).
    pub ship_id: Option<i64>,
    pub name: String,
    pub level: Option<i64>,
    pub start_hp: Option<i64>,
    pub now_hp: Hp,
    pub max_hp: Option<i64>,
    /// Damage taken across day and night.
    pub damage: i64,
    pub escaped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideSummary {
    pub main: Vec<CombatantRow>,
    pub escort: Vec<CombatantRow>,
    pub hp_source: HpSource,
}

impl SideSummary {
    pub fn rows(&self) -> impl Iterator<Item = &CombatantRow> {
        self.main.iter().chain(self.escort.iter())
    }

    pub fn total_damage(&self) -> i64 {
        self.rows().fold(0i64, |total, row| total.saturating_add(row.damage))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleSummary {
    pub battle_id: String,
    pub fleet_id: i64,
    pub combined: bool,
    pub friendly: SideSummary,
    pub enemy: SideSummary,
}

/// Per-segment damage taken by one side, computed once per summary.
struct SegmentDamage<'a> {
    segment: &'a BattleSegment,
    taken: Vec<i64>,
}

impl<'a> SegmentDamage<'a> {
    fn new(segment: &'a BattleSegment, side: Side) -> Self {
        Self {
            segment,
            taken: segment.damage_taken(side),
        }
    }

    fn ledger(&self, side: Side) -> Option<HpLedger<'_>> {
        let start = self.segment.side(side).start()?;
        Some(HpLedger {
            start,
            damage: Some(&self.taken),
        })
    }
}

/// Identity of the ship at a position: id, display name, level, fallback max HP.
type Identity = (Option<i64>, String, Option<i64>, Option<i64>);

fn friendly_identity(store: &NormalizedStore, fleet: &FleetSlots, position: usize) -> Identity {
    let Some(ship_id) = fleet.ship_at(position) else {
        return (None, UNKNOWN_NAME.to_string(), None, None);
    };
    let join = join_ship(store, ship_id);
    let ship = join.ship.found().copied();
    (
        Some(ship_id),
        join.display_name().to_string(),
        ship.map(|s| s.level),
        ship.map(|s| s.max_hp),
    )
}

fn enemy_identity(store: &NormalizedStore, battle: &BattleRecord, position: usize) -> Identity {
    let Some(template_id) = battle.enemy.ship_at(position) else {
        return (None, UNKNOWN_NAME.to_string(), None, None);
    };
    let template = store.ship_templates.get(template_id);
    (
        Some(template_id),
        template
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        battle.enemy.levels.get(position).copied(),
        template.map(|t| t.max_hp).filter(|&hp| hp > 0),
    )
}

fn summarize_side(
    battle: &BattleRecord,
    side: Side,
    roster_len: usize,
    identity: impl Fn(usize) -> Identity,
) -> SideSummary {
    let day = battle.day.as_ref().map(|s| SegmentDamage::new(s, side));
    let night = battle.night.as_ref().map(|s| SegmentDamage::new(s, side));
    let segments: Vec<&SegmentDamage<'_>> = day.iter().chain(night.iter()).collect();

    let reconciled = reconcile_hp(
        day.as_ref().and_then(|d| d.ledger(side)),
        night.as_ref().and_then(|n| n.ledger(side)),
    );

    let len = segments
        .iter()
        .map(|s| s.segment.side(side).now_hps.len())
        .fold(roster_len, usize::max);

    let rows = (0..len).map(|position| {
        let (ship_id, name, level, fallback_max) = identity(position);
        let start_hp = segments
            .iter()
            .find_map(|s| s.segment.side(side).start().and_then(|hp| hp.get(position).copied()));
        let max_hp = segments
            .iter()
            .find_map(|s| s.segment.side(side).max_at(position))
            .or(fallback_max);
        CombatantRow {
            position,
            ship_id,
            name,
            level,
            start_hp,
            now_hp: reconciled.get(position),
            max_hp,
            damage: segments
                .iter()
                .filter_map(|s| s.taken.get(position))
                .fold(0i64, |total, &damage| total.saturating_add(damage)),
            escaped: segments.iter().any(|s| s.segment.side(side).is_escaped(position)),
        }
    });

    let (main, escort): (Vec<_>, Vec<_>) = rows.partition(|row| row.position < SUB_FLEET_SIZE);
    SideSummary {
        main,
        escort,
        hp_source: reconciled.source,
    }
}

/// Build the fleet-info summary of one battle against a store snapshot.
pub fn summarize_battle(store: &NormalizedStore, battle: &BattleRecord) -> BattleSummary {
    let fleet = resolve_fleet(&store.fleets, battle.fleet_id, battle.combined);
    let friendly = summarize_side(battle, Side::Friendly, fleet.len(), |position| {
        friendly_identity(store, &fleet, position)
    });
    let enemy = summarize_side(battle, Side::Enemy, battle.enemy.ship_ids.len(), |position| {
        enemy_identity(store, battle, position)
    });

    tracing::trace!(
        target: "fleetview::battle",
        battle_id = %battle.id,
        friendly_damage = friendly.total_damage(),
        enemy_damage = enemy.total_damage(),
        "battle.summary.built"
    );

    BattleSummary {
        battle_id: battle.id.clone(),
        fleet_id: fleet.fleet_id,
        combined: fleet.combined,
        friendly,
        enemy,
    }
}

/// Summarize many battles in parallel against one snapshot. Output order follows input order.
pub fn summarize_battles(store: &NormalizedStore, battles: &[BattleRecord]) -> Vec<BattleSummary> {
    battles
        .par_iter()
        .map(|battle| summarize_battle(store, battle))
        .collect()
}
