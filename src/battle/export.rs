//! CSV export of phase tables.

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::battle::grouping::TargetGroups;
use crate::battle::phases::{PhaseBody, PhaseTable};
use crate::battle::record::{SegmentKind, Side};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One CSV row: a single target of a single phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub segment: SegmentKind,
    pub phase: &'static str,
    /// Attacking side.
    pub side: Side,
    pub target: usize,
    /// Attacker positions joined with `;`; empty when unattributed.
    pub attackers: String,
    pub damage: i64,
    pub hit: &'static str,
    pub protected: bool,
}

fn join_positions(positions: &[usize]) -> String {
    positions
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

fn grouped_rows<'a>(
    table: &'a PhaseTable,
    side: Side,
    groups: &'a TargetGroups,
) -> impl Iterator<Item = ExportRow> + 'a {
    groups.rows().map(move |record| ExportRow {
        segment: table.segment,
        phase: table.label,
        side,
        target: record.target,
        attackers: join_positions(&record.attackers),
        damage: record.damage,
        hit: record.hit.as_str(),
        protected: record.protected,
    })
}

/// Flatten phase tables into export rows, in table order. Grouped tables list friendly
/// attacks before enemy ones; shelling tables list one row per hit.
pub fn export_rows(tables: &[PhaseTable]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for table in tables {
        match &table.body {
            PhaseBody::Grouped {
                by_friendly,
                by_enemy,
                ..
            } => {
                rows.extend(grouped_rows(table, Side::Friendly, by_friendly));
                rows.extend(grouped_rows(table, Side::Enemy, by_enemy));
            }
            PhaseBody::Shelling { attacks } => {
                for attack in attacks {
                    rows.extend(attack.hits.iter().map(|hit| ExportRow {
                        segment: table.segment,
                        phase: table.label,
                        side: attack.side,
                        target: hit.target,
                        attackers: attack.attacker.to_string(),
                        damage: hit.damage,
                        hit: hit.hit.as_str(),
                        protected: hit.protected,
                    }));
                }
            }
        }
    }
    rows
}

/// Write phase tables as CSV with a header row.
pub fn write_phase_csv<W: Write>(writer: W, tables: &[PhaseTable]) -> Result<usize, ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    let rows = export_rows(tables);
    if rows.is_empty() {
        csv.write_record([
            "segment", "phase", "side", "target", "attackers", "damage", "hit", "protected",
        ])?;
    }
    for row in &rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ingest::parse_battle_json;
    use crate::battle::phases::phase_tables;
    use crate::data::store::NormalizedStore;

    const BATTLE: &str = r#"{
        "id": "2-4-J",
        "day": {
            "phases": [
                {"kind": "torpedo", "stage": "closing",
                 "friendly": {"targets": [3, 3], "damage": [0, 0, 0, 51.1], "critical": [0, 0, 0, 2]}},
                {"kind": "shelling", "stage": "first", "attacks": [
                    {"side": "enemy", "attacker": 4, "targets": [0], "damage": [0]}
                ]}
            ]
        }
    }"#;

    fn write(tables: &[PhaseTable]) -> (usize, String) {
        let mut out = Vec::new();
        let count = write_phase_csv(&mut out, tables).expect("csv");
        (count, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn grouped_and_shelling_rows_are_flattened() {
        let tables = phase_tables(
            &NormalizedStore::default(),
            &parse_battle_json(BATTLE).expect("battle"),
        );
        let (count, text) = write(&tables);
        assert_eq!(count, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "segment,phase,side,target,attackers,damage,hit,protected",
                "day,closing_torpedo,friendly,3,0;1,51,critical,true",
                "day,shelling_1,enemy,0,4,0,miss,false",
            ]
        );
    }

    #[test]
    fn empty_tables_still_write_header() {
        let (count, text) = write(&[]);
        assert_eq!(count, 0);
        assert_eq!(
            text.trim_end(),
            "segment,phase,side,target,attackers,damage,hit,protected"
        );
    }
}
