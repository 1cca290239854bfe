use std::path::PathBuf;

use fleetview::battle::{
    load_battle_dir, load_battle_file, phase_tables, summarize_battle, summarize_battles,
    BattleRecord, Hp, HpSource, PhaseBody, SegmentKind, Side,
};
use fleetview::battle::hit::HitKind;
use fleetview::data::{
    join_ships, load_snapshot, resolve_fleet, validate_snapshot, Lookup, NormalizedStore,
    UNKNOWN_NAME,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn store() -> NormalizedStore {
    load_snapshot(&fixture("snapshot.json")).expect("fixture snapshot should load")
}

fn combined_battle() -> BattleRecord {
    load_battle_file(&fixture("battles/7-2-M.json")).expect("fixture battle should load")
}

#[test]
fn combined_fleet_splits_at_position_six() {
    let store = store();
    let fleet = resolve_fleet(&store.fleets, 1, store.combined);
    assert!(fleet.combined);
    assert_eq!(fleet.main.len(), 6);
    assert_eq!(fleet.escort.len(), 6);
    assert_eq!(fleet.main_ids(), vec![101, 102, 103, 104, 105, 106]);
    assert_eq!(fleet.escort_ids(), vec![107, 108, 109, 110]);
    assert_eq!(fleet.ship_at(10), None);
}

#[test]
fn second_fleet_never_has_an_escort() {
    let store = store();
    let fleet = resolve_fleet(&store.fleets, 2, store.combined);
    assert!(!fleet.combined);
    assert!(fleet.escort.is_empty());
    assert_eq!(fleet.main_ids(), vec![111, 112]);
}

#[test]
fn ship_join_degrades_to_unknown_at_each_level() {
    let store = store();
    let joined = join_ships(&store, [101, 109, 999]);

    let akagi = &joined[&101];
    assert_eq!(akagi.display_name(), "Akagi");
    assert_eq!(akagi.slots.len(), 2);
    assert_eq!(
        akagi.item_template(1002).map(|t| t.name.as_str()),
        Some("Type 99 Dive Bomber")
    );

    let unnamed = &joined[&109];
    assert!(unnamed.ship.is_found());
    assert_eq!(unnamed.template, Lookup::Missing { id: Some(6) });
    assert_eq!(unnamed.display_name(), UNKNOWN_NAME);

    let absent = &joined[&999];
    assert_eq!(absent.ship, Lookup::Missing { id: Some(999) });
    assert_eq!(absent.template, Lookup::Missing { id: None });
}

#[test]
fn expansion_slot_is_part_of_the_join() {
    let store = store();
    let joined = join_ships(&store, [105]);
    assert_eq!(
        joined[&105].item_template(1004).map(|t| t.name.as_str()),
        Some("Emergency Repair Goddess")
    );
}

#[test]
fn combined_summary_reconciles_day_and_night() {
    let summary = summarize_battle(&store(), &combined_battle());
    assert!(summary.combined);

    let friendly = &summary.friendly;
    assert_eq!(friendly.hp_source, HpSource::Night);
    assert_eq!(friendly.main.len(), 6);
    assert_eq!(friendly.escort.len(), 6);

    let tone = &friendly.main[2];
    assert_eq!(tone.name, "Tone");
    assert_eq!((tone.start_hp, tone.now_hp, tone.damage), (Some(40), Hp::Known(35), 5));

    let yuubari = &friendly.escort[1];
    assert_eq!(yuubari.position, 7);
    assert_eq!((yuubari.now_hp, yuubari.damage), (Hp::Known(36), 9));

    assert_eq!(friendly.escort[0].now_hp, Hp::Known(33));
    assert_eq!(friendly.escort[2].name, UNKNOWN_NAME);
    assert!(friendly.escort[3].escaped);
    assert_eq!(friendly.escort[3].max_hp, Some(32));

    let empty = &friendly.escort[4];
    assert_eq!(empty.ship_id, None);
    assert_eq!(empty.now_hp, Hp::Unknown);
    assert_eq!(empty.damage, 0);

    let enemy = &summary.enemy;
    assert_eq!(enemy.hp_source, HpSource::Night);
    assert_eq!(enemy.main.len(), 3);
    assert!(enemy.escort.is_empty());
    assert_eq!(enemy.main[0].name, "Light Cruiser Ho-Class");
    assert!(enemy.rows().all(|row| row.now_hp == Hp::Known(0)));
    assert_eq!(enemy.main[0].damage, 36);
    assert_eq!(enemy.total_damage(), 76);
}

#[test]
fn phase_tables_group_every_launcher_per_target() {
    let tables = phase_tables(&store(), &combined_battle());
    assert_eq!(tables.len(), 5);
    assert_eq!(tables[4].segment, SegmentKind::Night);

    let land = tables[0].grouped_by(Side::Friendly).expect("grouped");
    assert_eq!(land.order, vec![1]);
    assert!(land.get(1).map(|r| r.attackers.is_empty()).unwrap_or(false));

    let opening = &tables[1];
    let by_friendly = opening.grouped_by(Side::Friendly).expect("grouped");
    assert_eq!(by_friendly.order, vec![0, 2]);
    assert_eq!(by_friendly.get(0).map(|r| r.attackers.clone()), Some(vec![0, 1]));
    assert_eq!(by_friendly.get(0).map(|r| r.hit), Some(HitKind::Critical));
    let PhaseBody::Grouped { planes, contacts, .. } = &opening.body else {
        panic!("opening air should be grouped");
    };
    let plane_ids: Vec<i64> = planes.iter().map(|p| p.equipment_id).collect();
    assert_eq!(plane_ids, vec![1002, 1003]);
    assert_eq!(contacts.len(), 1);

    let torpedo = tables[2].grouped_by(Side::Friendly).expect("grouped");
    let record = torpedo.get(2).expect("target 2 struck");
    assert_eq!(record.attackers, vec![6, 7]);
    assert_eq!(record.damage, 14);
    assert!(record.protected);
}

#[test]
fn land_base_planes_come_from_the_battle_area() {
    let tables = phase_tables(&store(), &combined_battle());
    let PhaseBody::Grouped { planes, .. } = &tables[0].body else {
        panic!("land-based air should be grouped");
    };
    assert_eq!(planes.len(), 1);
    assert_eq!(planes[0].equipment_id, 2001);
}

#[test]
fn aggregation_is_idempotent() {
    let store = store();
    let battle = combined_battle();
    assert_eq!(summarize_battle(&store, &battle), summarize_battle(&store, &battle));
    assert_eq!(phase_tables(&store, &battle), phase_tables(&store, &battle));
}

#[test]
fn battle_dir_summaries_follow_file_order() {
    let battles = load_battle_dir(&fixture("battles"));
    let ids: Vec<&str> = battles.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["1-1-A", "7-2-M"]);

    let summaries = summarize_battles(&store(), &battles);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].fleet_id, 2);
    assert_eq!(summaries[0].friendly.hp_source, HpSource::Day);
    assert_eq!(summaries[0].friendly.main.len(), 2);
    assert_eq!(summaries[0].enemy.main[0].now_hp, Hp::Known(0));
}

#[test]
fn fixture_snapshot_has_only_warnings() {
    let report = validate_snapshot(&store());
    assert!(!report.has_errors(), "{:?}", report.diagnostics);
}

#[test]
fn broken_snapshot_reports_dangling_references() {
    let store = load_snapshot(&fixture("snapshot_broken.json")).expect("broken snapshot parses");
    let report = validate_snapshot(&store);
    assert!(report.has_errors());
    let text: Vec<String> = report.diagnostics.iter().map(ToString::to_string).collect();
    assert!(text.iter().any(|line| line.contains("ship 404 not in store")));
    assert!(text.iter().any(|line| line.contains("equipment 9999 not in store")));
}
