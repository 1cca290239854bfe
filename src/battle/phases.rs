//! Per-phase attack tables.
//!
//! Torpedo, air, and support phases are grouped by target so every struck position is one row
//! listing all its attackers. Shelling phases stay per attack.

use serde::Serialize;

use crate::battle::grouping::{group_attacks, Launcher, TargetDamage, TargetGroups};
use crate::battle::planes::{carrier_pool, land_base_pool, resolve_plane_slots, PlaneSlot};
use crate::battle::record::{
    AirPhase, AirStage, AirStrike, BattleRecord, Phase, SegmentKind, ShellingAttack, Side,
    SupportPhase, TorpedoPhase,
};
use crate::data::fleet::{resolve_fleet, FleetSlots};
use crate::data::join::{join_equipment_list, UNKNOWN_NAME};
use crate::data::store::NormalizedStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneRef {
    pub equipment_id: i64,
    pub template_id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPlane {
    pub side: Side,
    pub template_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum PhaseBody {
    /// Rows keyed by target. `by_friendly` holds attacks the friendly side made (targets are
    /// enemy positions) and `by_enemy` the reverse.
    Grouped {
        by_friendly: TargetGroups,
        by_enemy: TargetGroups,
        /// Friendly plane slots that flew in this phase, when they could be resolved.
        planes: Vec<PlaneRef>,
        contacts: Vec<ContactPlane>,
    },
    Shelling {
        attacks: Vec<ShellingAttack>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTable {
    pub segment: SegmentKind,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave: Option<u32>,
    pub body: PhaseBody,
}

impl PhaseTable {
    /// Grouped rows for attacks made by `side`; empty for shelling tables.
    pub fn grouped_by(&self, side: Side) -> Option<&TargetGroups> {
        match &self.body {
            PhaseBody::Grouped {
                by_friendly,
                by_enemy,
                ..
            } => Some(match side {
                Side::Friendly => by_friendly,
                Side::Enemy => by_enemy,
            }),
            PhaseBody::Shelling { .. } => None,
        }
    }
}

/// Group an air strike: launchers are the `plane_from` positions and each struck position
/// lists every launcher. A strike with no launching ships still records its targets.
fn group_air_strike(strike: Option<&AirStrike>) -> TargetGroups {
    let Some(strike) = strike else {
        return TargetGroups::default();
    };
    if strike.plane_from.is_empty() {
        let mut groups = TargetGroups::default();
        for entry in strike.shown_targets() {
            groups.record_hit(entry.index, None, entry.received());
        }
        return groups;
    }

    let received: Vec<TargetDamage> = strike.targets.iter().map(|e| e.received()).collect();
    let struck: Vec<i64> = strike
        .shown_targets()
        .filter_map(|e| i64::try_from(e.index).ok())
        .collect();

    let launchers: Vec<Launcher> = strike
        .plane_from
        .iter()
        .map(|&index| Launcher {
            index,
            targets: struck.clone(),
        })
        .collect();
    group_attacks(&launchers, &received)
}

struct PhaseContext<'a> {
    store: &'a NormalizedStore,
    battle: &'a BattleRecord,
    fleet: FleetSlots,
}

impl PhaseContext<'_> {
    fn plane_refs(&self, slots: &[PlaneSlot], squadrons: &[i64]) -> Vec<PlaneRef> {
        let resolved = resolve_plane_slots(squadrons, slots);
        join_equipment_list(self.store, resolved)
            .into_iter()
            .map(|join| PlaneRef {
                equipment_id: join.equipment_id,
                template_id: join.item.found().map(|item| item.template_id),
                name: join.display_name().to_string(),
            })
            .collect()
    }

    fn contacts(&self, air: &AirPhase) -> Vec<ContactPlane> {
        [Side::Friendly, Side::Enemy]
            .into_iter()
            .filter_map(|side| {
                let template_id = air.strike(side)?.touch_plane?;
                let name = self
                    .store
                    .equipment_templates
                    .get(template_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string());
                Some(ContactPlane {
                    side,
                    template_id,
                    name,
                })
            })
            .collect()
    }

    fn air_body(&self, air: &AirPhase) -> PhaseBody {
        let planes = match air.friendly.as_ref() {
            Some(strike) => {
                let pool = match air.stage {
                    AirStage::LandBase => land_base_pool(self.store, self.battle.area_id),
                    AirStage::Opening | AirStage::CarrierBase => {
                        carrier_pool(self.store, &self.fleet, &strike.plane_from)
                    }
                };
                self.plane_refs(&pool, &strike.squadrons)
            }
            None => Vec::new(),
        };
        PhaseBody::Grouped {
            by_friendly: group_air_strike(air.friendly.as_ref()),
            by_enemy: group_air_strike(air.enemy.as_ref()),
            planes,
            contacts: self.contacts(air),
        }
    }
}

fn torpedo_body(torpedo: &TorpedoPhase) -> PhaseBody {
    let group = |side| {
        torpedo
            .salvo(side)
            .map(|salvo| group_attacks(&salvo.launchers, &salvo.received))
            .unwrap_or_default()
    };
    PhaseBody::Grouped {
        by_friendly: group(Side::Friendly),
        by_enemy: group(Side::Enemy),
        planes: Vec::new(),
        contacts: Vec::new(),
    }
}

/// Support attacks carry no ship attribution; every target with damage or a hit flag is a row.
fn support_body(support: &SupportPhase) -> PhaseBody {
    let mut by_friendly = group_air_strike(support.air.as_ref());
    if let Some(barrage) = &support.barrage {
        for (target, received) in barrage.targets.iter().enumerate() {
            if received.damage > 0 || received.critical.is_some_and(|flag| flag > 0) {
                by_friendly.merge_hit(target, *received);
            }
        }
    }
    PhaseBody::Grouped {
        by_friendly,
        by_enemy: TargetGroups::default(),
        planes: Vec::new(),
        contacts: Vec::new(),
    }
}

/// Build the attack table of every phase in battle order (day phases, then night).
pub fn phase_tables(store: &NormalizedStore, battle: &BattleRecord) -> Vec<PhaseTable> {
    let ctx = PhaseContext {
        store,
        battle,
        fleet: resolve_fleet(&store.fleets, battle.fleet_id, battle.combined),
    };

    battle
        .segments()
        .flat_map(|(segment, data)| data.phases.iter().map(move |phase| (segment, phase)))
        .map(|(segment, phase)| {
            let (wave, body) = match phase {
                Phase::Air(air) => (air.wave, ctx.air_body(air)),
                Phase::Torpedo(torpedo) => (None, torpedo_body(torpedo)),
                Phase::Shelling(shelling) => (
                    None,
                    PhaseBody::Shelling {
                        attacks: shelling.attacks.clone(),
                    },
                ),
                Phase::Support(support) => (None, support_body(support)),
            };
            PhaseTable {
                segment,
                label: phase.label(),
                wave,
                body,
            }
        })
        .collect()
}
