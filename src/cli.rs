use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use serde::Serialize;

use crate::battle::export::write_phase_csv;
use crate::battle::ingest::{load_battle_dir, load_battle_file};
use crate::battle::phases::phase_tables;
use crate::battle::record::BattleRecord;
use crate::battle::summary::{summarize_battle, summarize_battles, BattleSummary};
use crate::config::AppConfig;
use crate::data::fleet::resolve_fleet;
use crate::data::loader::load_snapshot;
use crate::data::store::NormalizedStore;
use crate::data::validate::{validate_snapshot, ValidationSeverity};
use crate::server;
use crate::telemetry;

const USAGE: &str = "usage: fleetview <serve|summary|phases|export|batch|fleet|validate>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Summary,
    Phases,
    Export,
    Batch,
    Fleet,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("summary") => Some(Command::Summary),
        Some("phases") => Some(Command::Phases),
        Some("export") => Some(Command::Export),
        Some("batch") => Some(Command::Batch),
        Some("fleet") => Some(Command::Fleet),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    telemetry::init(&config.log_filter);

    match command {
        Command::Serve => handle_serve(&config),
        Command::Summary => handle_summary(args),
        Command::Phases => handle_phases(args),
        Command::Export => handle_export(args),
        Command::Batch => handle_batch(args),
        Command::Fleet => handle_fleet(args),
        Command::Validate => handle_validate(args),
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

fn open_snapshot(path: &str) -> Result<NormalizedStore, i32> {
    load_snapshot(Path::new(path)).map_err(|err| {
        eprintln!("snapshot error: {err}");
        1
    })
}

/// Load `<snapshot> <battle>` from positions 2 and 3.
fn snapshot_and_battle(args: &[String], command: &str) -> Result<(NormalizedStore, BattleRecord), i32> {
    let (Some(snapshot), Some(battle)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: fleetview {command} <snapshot.json> <battle.json>");
        return Err(2);
    };
    let store = open_snapshot(snapshot)?;
    let battle = load_battle_file(Path::new(battle)).map_err(|err| {
        eprintln!("battle error: {err}");
        1
    })?;
    Ok((store, battle))
}

fn print_summary_table(summary: &BattleSummary) {
    println!("side\tposition\tname\tstart_hp\tnow_hp\tmax_hp\tdamage\tescaped");
    for (side, rows) in [("friendly", &summary.friendly), ("enemy", &summary.enemy)] {
        for row in rows.rows() {
            let hp = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
            println!(
                "{side}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.position,
                row.name,
                hp(row.start_hp),
                hp(row.now_hp.known()),
                hp(row.max_hp),
                row.damage,
                row.escaped
            );
        }
    }
}

fn handle_summary(args: &[String]) -> i32 {
    let (store, battle) = match snapshot_and_battle(args, "summary") {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let summary = summarize_battle(&store, &battle);
    if args.iter().any(|arg| arg == "--table") {
        print_summary_table(&summary);
        return 0;
    }
    print_json(&summary, "battle summary")
}

fn handle_phases(args: &[String]) -> i32 {
    let (store, battle) = match snapshot_and_battle(args, "phases") {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    print_json(&phase_tables(&store, &battle), "phase tables")
}

fn handle_export(args: &[String]) -> i32 {
    let (store, battle) = match snapshot_and_battle(args, "export") {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let tables = phase_tables(&store, &battle);
    let written = match args.get(4) {
        Some(out) => match File::create(out) {
            Ok(file) => write_phase_csv(BufWriter::new(file), &tables),
            Err(err) => {
                eprintln!("could not create {out}: {err}");
                return 1;
            }
        },
        None => write_phase_csv(io::stdout().lock(), &tables),
    };
    match written {
        Ok(rows) => {
            if let Some(out) = args.get(4) {
                println!("export complete: rows={rows}, path='{out}'");
            }
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn handle_batch(args: &[String]) -> i32 {
    let (Some(snapshot), Some(dir)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: fleetview batch <snapshot.json> <battle-dir>");
        return 2;
    };
    let store = match open_snapshot(snapshot) {
        Ok(store) => store,
        Err(code) => return code,
    };
    let battles = load_battle_dir(Path::new(dir));
    print_json(&summarize_battles(&store, &battles), "battle summaries")
}

fn handle_fleet(args: &[String]) -> i32 {
    let (Some(snapshot), Some(raw_id)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: fleetview fleet <snapshot.json> <fleet_id>");
        return 2;
    };
    let Ok(fleet_id) = raw_id.parse::<i64>() else {
        eprintln!("invalid fleet_id '{raw_id}'");
        return 2;
    };
    let store = match open_snapshot(snapshot) {
        Ok(store) => store,
        Err(code) => return code,
    };
    print_json(&resolve_fleet(&store.fleets, fleet_id, store.combined), "fleet")
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(snapshot) = args.get(2) else {
        eprintln!("usage: fleetview validate <snapshot.json>");
        return 2;
    };
    let store = match open_snapshot(snapshot) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let report = validate_snapshot(&store);
    for diag in &report.diagnostics {
        println!("{diag}");
    }
    let errors = report.count(ValidationSeverity::Error);
    let warnings = report.count(ValidationSeverity::Warning);
    if report.has_errors() {
        eprintln!("validation failed: {errors} error(s), {warnings} warning(s)");
        1
    } else {
        println!("validation passed: {snapshot} ({warnings} warning(s))");
        0
    }
}
