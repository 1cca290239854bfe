//! Plane-slot resolver: match the squadron templates that took part in an attack against the
//! physical plane slots they came from.

use serde::Serialize;

use crate::data::equipment::EquipmentTemplate;
use crate::data::fleet::FleetSlots;
use crate::data::store::NormalizedStore;

/// One equipped plane instance available to an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaneSlot {
    pub equipment_id: i64,
    pub template_id: i64,
}

/// Resolve squadron template ids to equipment instance ids.
///
/// Greedy and order-sensitive: each template takes the first unclaimed slot of that template
/// in pool order, and a claimed slot is never reused. Templates without a free slot are
/// dropped. Zero or negative template ids are skipped.
pub fn resolve_plane_slots(squadrons: &[i64], pool: &[PlaneSlot]) -> Vec<i64> {
    let mut remaining = pool.to_vec();
    let mut resolved = Vec::with_capacity(squadrons.len());
    for &template_id in squadrons {
        if template_id <= 0 {
            continue;
        }
        if let Some(pos) = remaining.iter().position(|slot| slot.template_id == template_id) {
            resolved.push(remaining.remove(pos).equipment_id);
        }
    }
    resolved
}

fn plane_slot(store: &NormalizedStore, equipment_id: i64) -> Option<PlaneSlot> {
    let item = store.equipment.get(equipment_id)?;
    Some(PlaneSlot {
        equipment_id,
        template_id: item.template_id,
    })
}

/// Squadrons stationed in `area_id`, in base then slot order. Empty slots and equipment not
/// in the store are left out.
pub fn land_base_pool(store: &NormalizedStore, area_id: i64) -> Vec<PlaneSlot> {
    store
        .air_bases_in(area_id)
        .flat_map(|base| base.squadrons.iter())
        .filter(|squadron| squadron.equipment_id > 0)
        .filter_map(|squadron| plane_slot(store, squadron.equipment_id))
        .collect()
}

/// Plane items equipped on the launching ships: main fleet positions first, escort after,
/// then slot order with the expansion slot last. Items whose template is known and is not an
/// aircraft are left out; unknown templates stay in the pool.
pub fn carrier_pool(store: &NormalizedStore, fleet: &FleetSlots, plane_from: &[usize]) -> Vec<PlaneSlot> {
    let mut positions = plane_from.to_vec();
    positions.sort_unstable();
    positions.dedup();
    positions
        .into_iter()
        .filter_map(|position| fleet.ship_at(position))
        .filter_map(|ship_id| store.ships.get(ship_id))
        .flat_map(|ship| ship.equipped_ids())
        .filter_map(|equipment_id| plane_slot(store, equipment_id))
        .filter(|slot| {
            store
                .equipment_templates
                .get(slot.template_id)
                .map_or(true, EquipmentTemplate::is_plane)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fleet::{resolve_fleet, CombinedFleetType};

    fn slot(equipment_id: i64, template_id: i64) -> PlaneSlot {
        PlaneSlot {
            equipment_id,
            template_id,
        }
    }

    #[test]
    fn each_slot_is_claimed_at_most_once() {
        let pool = [slot(100, 9), slot(101, 9)];
        assert_eq!(resolve_plane_slots(&[9, 9, 9], &pool), vec![100, 101]);
    }

    #[test]
    fn pool_order_breaks_ties_and_output_follows_request_order() {
        let pool = [slot(1, 5), slot(2, 7), slot(3, 5)];
        assert_eq!(resolve_plane_slots(&[7, 5, 0, 5, 8], &pool), vec![2, 1, 3]);
    }

    #[test]
    fn empty_inputs_resolve_to_nothing() {
        assert!(resolve_plane_slots(&[], &[slot(1, 1)]).is_empty());
        assert!(resolve_plane_slots(&[1], &[]).is_empty());
    }

    fn store() -> NormalizedStore {
        NormalizedStore::from_json_str(
            r#"{
                "ships": [
                    {"id": 1, "template_id": 83, "now_hp": 1, "max_hp": 1, "slots": [10, 11]},
                    {"id": 2, "template_id": 84, "now_hp": 1, "max_hp": 1, "slots": [12], "expansion_slot": 13}
                ],
                "equipment": [
                    {"id": 10, "template_id": 20}, {"id": 11, "template_id": 23},
                    {"id": 12, "template_id": 20}, {"id": 13, "template_id": 43},
                    {"id": 30, "template_id": 168}, {"id": 31, "template_id": 168}
                ],
                "equipment_templates": [
                    {"id": 20, "name": "Type 0 Fighter Model 21", "category": [3, 5, 6, 6, 0]},
                    {"id": 43, "name": "Emergency Repair Goddess", "category": [17, 23, 23, 27, 0]}
                ],
                "fleets": [{"id": 1, "ship_ids": [1, -1, 2]}],
                "air_bases": [
                    {"area_id": 45, "base_id": 1, "squadrons": [
                        {"slot_id": 1, "equipment_id": 30}, {"slot_id": 2, "equipment_id": -1}
                    ]},
                    {"area_id": 45, "base_id": 2, "squadrons": [
                        {"slot_id": 1, "equipment_id": 31}, {"slot_id": 2, "equipment_id": 99}
                    ]},
                    {"area_id": 44, "base_id": 1, "squadrons": [{"slot_id": 1, "equipment_id": 10}]}
                ]
            }"#,
        )
        .expect("parse")
    }

    #[test]
    fn land_base_pool_is_area_scoped() {
        let pool = land_base_pool(&store(), 45);
        assert_eq!(pool, vec![slot(30, 168), slot(31, 168)]);
        assert_eq!(resolve_plane_slots(&[168, 168], &pool), vec![30, 31]);
    }

    #[test]
    fn carrier_pool_orders_launchers_by_position_and_keeps_planes() {
        let store = store();
        let fleet = resolve_fleet(&store.fleets, 1, CombinedFleetType::Single);
        let pool = carrier_pool(&store, &fleet, &[2, 0, 1, 2]);
        let ids: Vec<i64> = pool.iter().map(|s| s.equipment_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(resolve_plane_slots(&[20, 20], &pool), vec![10, 12]);
    }
}
