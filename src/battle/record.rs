//! Battle records as delivered by the battle feed.
//!
//! The feed encodes per-combatant data as parallel arrays indexed by position. Those arrays
//! are decoded once, at deserialization, into explicit per-position entries; nothing past
//! this module indexes into a raw array. Positions 0-5 are the main fleet and 6-11 the escort
//! on both sides, in every phase.

use serde::{Deserialize, Serialize};

use crate::battle::grouping::{Launcher, TargetDamage};
use crate::battle::hit::{classify_hit, decode_damage, HitKind};
use crate::battle::hp::accumulate_damage;
use crate::data::fleet::{CombinedFleetType, COMBINED_FLEET_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Friendly,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Friendly => Self::Enemy,
            Self::Enemy => Self::Friendly,
        }
    }
}

/// One combat encounter. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Encounter key (map cell + sortie sequence).
    pub id: String,
    #[serde(default)]
    pub area_id: i64,
    #[serde(default)]
    pub map_id: i64,
    #[serde(default)]
    pub cell_id: i64,
    #[serde(default = "default_fleet_id")]
    pub fleet_id: i64,
    #[serde(default)]
    pub combined: CombinedFleetType,
    #[serde(default)]
    pub enemy: EnemyFleet,
    #[serde(default)]
    pub day: Option<BattleSegment>,
    #[serde(default)]
    pub night: Option<BattleSegment>,
}

fn default_fleet_id() -> i64 {
    1
}

impl BattleRecord {
    /// Segments in battle order: day first, then night.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentKind, &BattleSegment)> {
        self.day
            .iter()
            .map(|s| (SegmentKind::Day, s))
            .chain(self.night.iter().map(|s| (SegmentKind::Night, s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Day,
    Night,
}

/// Enemy roster: ship template ids by position (values <= 0 are empty positions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyFleet {
    #[serde(default)]
    pub ship_ids: Vec<i64>,
    #[serde(default)]
    pub levels: Vec<i64>,
}

impl EnemyFleet {
    pub fn ship_at(&self, position: usize) -> Option<i64> {
        self.ship_ids.get(position).copied().filter(|&id| id > 0)
    }
}

/// HP state of one side at the start of a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideHp {
    #[serde(default)]
    pub now_hps: Vec<i64>,
    #[serde(default)]
    pub max_hps: Vec<i64>,
    /// Positions (0-based) that retreated before this segment.
    #[serde(default)]
    pub escaped: Vec<usize>,
}

impl SideHp {
    /// Starting HP, or `None` when the segment carries none for this side.
    pub fn start(&self) -> Option<&[i64]> {
        (!self.now_hps.is_empty()).then_some(self.now_hps.as_slice())
    }

    pub fn max_at(&self, position: usize) -> Option<i64> {
        self.max_hps.get(position).copied()
    }

    pub fn is_escaped(&self, position: usize) -> bool {
        self.escaped.contains(&position)
    }
}

/// Day or night part of a battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSegment {
    #[serde(default)]
    pub friendly: SideHp,
    #[serde(default)]
    pub enemy: SideHp,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl BattleSegment {
    pub fn side(&self, side: Side) -> &SideHp {
        match side {
            Side::Friendly => &self.friendly,
            Side::Enemy => &self.enemy,
        }
    }

    /// Total damage `side` took over every phase of this segment, by position.
    pub fn damage_taken(&self, side: Side) -> Vec<i64> {
        let per_phase: Vec<Vec<i64>> = self
            .phases
            .iter()
            .filter_map(|phase| phase.damage_to(side))
            .collect();
        let refs: Vec<Option<&[i64]>> = per_phase.iter().map(|d| Some(d.as_slice())).collect();
        let len = self.side(side).now_hps.len();
        let mut total = accumulate_damage(&refs);
        if len > 0 && total.len() < len {
            total.resize(len, 0);
        }
        total
    }
}

/// One sub-event of a segment. Absent phases are simply not listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phase {
    Air(AirPhase),
    Torpedo(TorpedoPhase),
    Shelling(ShellingPhase),
    Support(SupportPhase),
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Air(air) => air.stage.as_str(),
            Self::Torpedo(torpedo) => torpedo.stage.as_str(),
            Self::Shelling(shelling) => shelling.stage.as_str(),
            Self::Support(_) => "support",
        }
    }

    /// Damage dealt to `side` in this phase by position, or `None` when the phase has no
    /// attack against that side.
    pub fn damage_to(&self, side: Side) -> Option<Vec<i64>> {
        let attacker = side.opponent();
        match self {
            Self::Air(air) => air.strike(attacker).map(AirStrike::damage_by_position),
            Self::Torpedo(torpedo) => torpedo
                .salvo(attacker)
                .map(|salvo| salvo.received.iter().map(|r| r.damage).collect()),
            Self::Shelling(shelling) => shelling.damage_to(side),
            Self::Support(support) => match side {
                Side::Enemy => Some(support.damage_by_position()),
                Side::Friendly => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirStage {
    /// Carrier strike at the start of the day segment.
    Opening,
    /// Land-based air corps wave.
    LandBase,
    /// Jet strike launched from carriers before the land-based waves.
    CarrierBase,
}

impl AirStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening_air",
            Self::LandBase => "land_base_air",
            Self::CarrierBase => "carrier_base_air",
        }
    }
}

/// Air attack phase; `friendly` is the strike launched by the friendly side (so its entries
/// describe enemy positions) and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPhase {
    pub stage: AirStage,
    /// Wave number for land-based attacks.
    #[serde(default)]
    pub wave: Option<u32>,
    #[serde(default)]
    pub friendly: Option<AirStrike>,
    #[serde(default)]
    pub enemy: Option<AirStrike>,
}

impl AirPhase {
    pub fn strike(&self, by: Side) -> Option<&AirStrike> {
        match by {
            Side::Friendly => self.friendly.as_ref(),
            Side::Enemy => self.enemy.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrikeEntry {
    pub index: usize,
    pub now_hp: Option<i64>,
    pub damage: i64,
    pub bombed: bool,
    pub torpedoed: bool,
    pub protected: bool,
    pub hit: HitKind,
}

impl StrikeEntry {
    /// Shown as hit only when a bombing or torpedo flag marks it.
    pub fn shown(&self) -> bool {
        self.bombed || self.torpedoed
    }

    pub fn received(&self) -> TargetDamage {
        TargetDamage {
            damage: self.damage,
            critical: match self.hit {
                HitKind::Critical => Some(crate::battle::hit::CRITICAL_FLAG),
                HitKind::Normal => Some(1),
                HitKind::Miss => None,
            },
            protected: self.protected,
        }
    }
}

/// One side's air strike with per-target outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAirStrike")]
pub struct AirStrike {
    /// Contact plane template id, when a scout made contact.
    pub touch_plane: Option<i64>,
    /// Positions of the launching ships.
    pub plane_from: Vec<usize>,
    /// Template ids of the squadrons that took part, in feed order.
    pub squadrons: Vec<i64>,
    pub targets: Vec<StrikeEntry>,
}

impl AirStrike {
    fn damage_by_position(&self) -> Vec<i64> {
        self.targets.iter().map(|entry| entry.damage).collect()
    }

    pub fn shown_targets(&self) -> impl Iterator<Item = &StrikeEntry> {
        self.targets.iter().filter(|entry| entry.shown())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAirStrike {
    touch_plane: i64,
    plane_from: Vec<i64>,
    squadrons: Vec<i64>,
    now_hps: Vec<i64>,
    total_damages: Vec<f64>,
    bak_flag: Vec<i64>,
    rai_flag: Vec<i64>,
    protect_flag: Vec<i64>,
    critical_flags: Vec<i64>,
}

fn flag_at(flags: &[i64], index: usize) -> bool {
    flags.get(index).is_some_and(|&flag| flag > 0)
}

fn positions(raw: &[i64]) -> Vec<usize> {
    raw.iter().filter_map(|&p| usize::try_from(p).ok()).collect()
}

impl From<RawAirStrike> for AirStrike {
    fn from(raw: RawAirStrike) -> Self {
        let len = [
            raw.now_hps.len(),
            raw.total_damages.len(),
            raw.bak_flag.len(),
            raw.rai_flag.len(),
            raw.critical_flags.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        let targets = (0..len)
            .map(|index| {
                let damage = decode_damage(raw.total_damages.get(index).copied().unwrap_or(0.0));
                StrikeEntry {
                    index,
                    now_hp: raw.now_hps.get(index).copied(),
                    damage: damage.amount,
                    bombed: flag_at(&raw.bak_flag, index),
                    torpedoed: flag_at(&raw.rai_flag, index),
                    protected: damage.protected || flag_at(&raw.protect_flag, index),
                    hit: classify_hit(Some(damage.amount), raw.critical_flags.get(index).copied()),
                }
            })
            .collect();

        Self {
            touch_plane: (raw.touch_plane > 0).then_some(raw.touch_plane),
            plane_from: positions(&raw.plane_from),
            squadrons: raw.squadrons,
            targets,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorpedoStage {
    Opening,
    Closing,
}

impl TorpedoStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening_torpedo",
            Self::Closing => "closing_torpedo",
        }
    }
}

/// Torpedo phase; `friendly` is the salvo fired by the friendly side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorpedoPhase {
    pub stage: TorpedoStage,
    #[serde(default)]
    pub friendly: Option<Salvo>,
    #[serde(default)]
    pub enemy: Option<Salvo>,
}

impl TorpedoPhase {
    pub fn salvo(&self, by: Side) -> Option<&Salvo> {
        match by {
            Side::Friendly => self.friendly.as_ref(),
            Side::Enemy => self.enemy.as_ref(),
        }
    }
}

/// Torpedo salvo: per-launcher target lists plus per-target damage on the opposing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSalvo")]
pub struct Salvo {
    pub launchers: Vec<Launcher>,
    pub received: Vec<TargetDamage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TargetList {
    One(i64),
    Many(Vec<i64>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSalvo {
    /// Per launcher: one target position, a list of them, or -1 for no fire.
    targets: Vec<Option<TargetList>>,
    damage: Vec<f64>,
    critical: Vec<i64>,
}

impl From<RawSalvo> for Salvo {
    fn from(raw: RawSalvo) -> Self {
        let launchers = raw
            .targets
            .into_iter()
            .enumerate()
            .map(|(index, targets)| Launcher {
                index,
                targets: match targets {
                    Some(TargetList::One(target)) => vec![target],
                    Some(TargetList::Many(targets)) => targets,
                    None => Vec::new(),
                },
            })
            .collect();

        let len = raw.damage.len().max(raw.critical.len());
        let received = (0..len)
            .map(|index| {
                let damage = decode_damage(raw.damage.get(index).copied().unwrap_or(0.0));
                TargetDamage {
                    damage: damage.amount,
                    critical: raw.critical.get(index).copied(),
                    protected: damage.protected,
                }
            })
            .collect();

        Self {
            launchers,
            received,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellingStage {
    OpeningAsw,
    First,
    Second,
    Third,
    Night,
}

impl ShellingStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpeningAsw => "opening_asw",
            Self::First => "shelling_1",
            Self::Second => "shelling_2",
            Self::Third => "shelling_3",
            Self::Night => "night_shelling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellingPhase {
    pub stage: ShellingStage,
    #[serde(default)]
    pub attacks: Vec<ShellingAttack>,
}

impl ShellingPhase {
    fn damage_to(&self, side: Side) -> Option<Vec<i64>> {
        let hits: Vec<&TargetHit> = self
            .attacks
            .iter()
            .filter(|attack| attack.side == side.opponent())
            .flat_map(|attack| attack.hits.iter())
            .filter(|hit| hit.target < COMBINED_FLEET_SIZE)
            .collect();
        if hits.is_empty() {
            return None;
        }
        let len = hits.iter().map(|hit| hit.target + 1).max().unwrap_or(0);
        let mut damage = vec![0i64; len];
        for hit in hits {
            damage[hit.target] = damage[hit.target].saturating_add(hit.damage);
        }
        Some(damage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetHit {
    pub target: usize,
    pub damage: i64,
    pub critical: Option<i64>,
    pub protected: bool,
    pub hit: HitKind,
}

/// One shelling attack: a single attacker, one or more hits on the opposing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawShellingAttack")]
pub struct ShellingAttack {
    pub side: Side,
    pub attacker: usize,
    pub attack_type: i64,
    pub hits: Vec<TargetHit>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawShellingAttack {
    side: Side,
    attacker: usize,
    #[serde(default)]
    attack_type: i64,
    #[serde(default)]
    targets: Vec<i64>,
    #[serde(default)]
    damage: Vec<f64>,
    #[serde(default)]
    critical: Vec<i64>,
}

impl From<RawShellingAttack> for ShellingAttack {
    fn from(raw: RawShellingAttack) -> Self {
        let hits = raw
            .targets
            .iter()
            .enumerate()
            .filter_map(|(i, &target)| {
                let target = usize::try_from(target).ok()?;
                let damage = decode_damage(raw.damage.get(i).copied().unwrap_or(0.0));
                let critical = raw.critical.get(i).copied();
                Some(TargetHit {
                    target,
                    damage: damage.amount,
                    critical,
                    protected: damage.protected,
                    hit: classify_hit(Some(damage.amount), critical),
                })
            })
            .collect();
        Self {
            side: raw.side,
            attacker: raw.attacker,
            attack_type: raw.attack_type,
            hits,
        }
    }
}

/// Friendly support expedition: an air strike, a barrage, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportPhase {
    #[serde(default)]
    pub air: Option<AirStrike>,
    #[serde(default)]
    pub barrage: Option<Barrage>,
}

impl SupportPhase {
    fn damage_by_position(&self) -> Vec<i64> {
        let air = self.air.as_ref().map(AirStrike::damage_by_position);
        let barrage = self
            .barrage
            .as_ref()
            .map(|b| b.targets.iter().map(|t| t.damage).collect::<Vec<_>>());
        accumulate_damage(&[air.as_deref(), barrage.as_deref()])
    }
}

/// Support shelling/torpedo barrage: per enemy position, no launcher attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBarrage")]
pub struct Barrage {
    pub targets: Vec<TargetDamage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawBarrage {
    damage: Vec<f64>,
    critical: Vec<i64>,
}

impl From<RawBarrage> for Barrage {
    fn from(raw: RawBarrage) -> Self {
        let targets = raw
            .damage
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let damage = decode_damage(value);
                TargetDamage {
                    damage: damage.amount,
                    critical: raw.critical.get(i).copied(),
                    protected: damage.protected,
                }
            })
            .collect();
        Self { targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_strike_decodes_parallel_arrays_into_entries() {
        let strike: AirStrike = serde_json::from_str(
            r#"{
                "touch_plane": 0,
                "plane_from": [0, 2, -1],
                "total_damages": [0, 35.1, 12],
                "bak_flag": [0, 1, 0],
                "rai_flag": [0, 0, 1],
                "critical_flags": [0, 2, 1]
            }"#,
        )
        .expect("parse");
        assert_eq!(strike.touch_plane, None);
        assert_eq!(strike.plane_from, vec![0, 2]);
        assert_eq!(strike.targets.len(), 3);
        let shown: Vec<usize> = strike.shown_targets().map(|e| e.index).collect();
        assert_eq!(shown, vec![1, 2]);
        assert_eq!(strike.targets[1].damage, 35);
        assert!(strike.targets[1].protected);
        assert_eq!(strike.targets[1].hit, HitKind::Critical);
        assert_eq!(strike.targets[2].hit, HitKind::Normal);
    }

    #[test]
    fn missing_flag_arrays_never_mark_a_hit() {
        let strike: AirStrike =
            serde_json::from_str(r#"{"total_damages": [10, 20]}"#).expect("parse");
        assert_eq!(strike.shown_targets().count(), 0);
    }

    #[test]
    fn salvo_accepts_single_or_list_targets() {
        let salvo: Salvo = serde_json::from_str(
            r#"{"targets": [2, -1, [2, 4], null], "damage": [0, 0, 40, 0, 10.1], "critical": [0, 0, 1, 0, 2]}"#,
        )
        .expect("parse");
        assert_eq!(salvo.launchers.len(), 4);
        assert_eq!(salvo.launchers[1].targets, vec![-1]);
        assert_eq!(salvo.launchers[2].targets, vec![2, 4]);
        assert!(salvo.launchers[3].targets.is_empty());
        assert_eq!(salvo.received[4].damage, 10);
        assert!(salvo.received[4].protected);
    }

    #[test]
    fn shelling_damage_is_summed_per_target_for_the_receiving_side() {
        let phase: Phase = serde_json::from_str(
            r#"{"kind": "shelling", "stage": "first", "attacks": [
                {"side": "friendly", "attacker": 0, "targets": [1, 1], "damage": [10, 15]},
                {"side": "enemy", "attacker": 1, "targets": [3], "damage": [7]},
                {"side": "friendly", "attacker": 2, "targets": [-1], "damage": [0]}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(phase.damage_to(Side::Enemy), Some(vec![0, 25]));
        assert_eq!(phase.damage_to(Side::Friendly), Some(vec![0, 0, 0, 7]));
        assert_eq!(phase.label(), "shelling_1");
    }

    #[test]
    fn shelling_targets_past_the_last_position_are_ignored() {
        let phase: Phase = serde_json::from_str(
            r#"{"kind": "shelling", "stage": "night", "attacks": [
                {"side": "friendly", "attacker": 0, "targets": [9000000000000000], "damage": [10]},
                {"side": "friendly", "attacker": 1, "targets": [12, 2], "damage": [4, 6]}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(phase.damage_to(Side::Enemy), Some(vec![0, 0, 6]));
    }

    #[test]
    fn segment_damage_accumulates_across_phases() {
        let segment: BattleSegment = serde_json::from_str(
            r#"{
                "friendly": {"now_hps": [40, 30, 20], "max_hps": [40, 30, 20]},
                "enemy": {"now_hps": [50, 50], "max_hps": [50, 50]},
                "phases": [
                    {"kind": "air", "stage": "opening",
                     "enemy": {"total_damages": [5, 0, 0], "bak_flag": [1, 0, 0]}},
                    {"kind": "torpedo", "stage": "opening",
                     "friendly": {"targets": [1], "damage": [0, 22]}},
                    {"kind": "support", "barrage": {"damage": [3, 4]}}
                ]
            }"#,
        )
        .expect("parse");
        assert_eq!(segment.damage_taken(Side::Friendly), vec![5, 0, 0]);
        assert_eq!(segment.damage_taken(Side::Enemy), vec![3, 26]);
    }

    #[test]
    fn segment_without_phases_takes_zero_damage_per_position() {
        let segment: BattleSegment =
            serde_json::from_str(r#"{"friendly": {"now_hps": [1, 2]}}"#).expect("parse");
        assert_eq!(segment.damage_taken(Side::Friendly), vec![0; 12]);
        assert_eq!(segment.side(Side::Enemy).start(), None);
    }
}
