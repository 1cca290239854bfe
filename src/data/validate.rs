//! Snapshot integrity report: dangling references between store tables.
//! Nothing here is fatal for the dashboard (joins degrade to "Unknown"); the report is for
//! spotting a half-synced or corrupted snapshot.

use std::collections::HashSet;
use std::fmt;

use crate::data::fleet::{COMBINED_FLEET_ID, COMBINED_FLEET_SIZE, SUB_FLEET_SIZE};
use crate::data::store::NormalizedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Check cross-table references in a snapshot.
///
/// Errors: a fleet slot naming a ship that does not exist, or a ship slot naming missing
/// equipment. Warnings: missing ship/equipment templates, the same ship in two fleets, or a
/// roster longer than its mode allows. Info: unknown air-base squadron equipment.
pub fn validate_snapshot(store: &NormalizedStore) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen_in_fleet = HashSet::new();
    for fleet in store.fleets.iter() {
        let context = format!("fleet[{}]", fleet.id);
        let limit = if fleet.id == COMBINED_FLEET_ID && store.combined.is_combined() {
            COMBINED_FLEET_SIZE
        } else {
            SUB_FLEET_SIZE
        };
        if fleet.ship_ids.len() > limit {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                format!(
                    "{} slots exceed the {limit} usable in this mode",
                    fleet.ship_ids.len()
                ),
            );
        }
        for (position, &ship_id) in fleet.ship_ids.iter().enumerate() {
            if ship_id <= 0 {
                continue;
            }
            if !store.ships.contains(ship_id) {
                report.push(
                    ValidationSeverity::Error,
                    format!("{context}.ship_ids[{position}]"),
                    format!("ship {ship_id} not in store"),
                );
            }
            if !seen_in_fleet.insert(ship_id) {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.ship_ids[{position}]"),
                    format!("ship {ship_id} assigned to more than one fleet slot"),
                );
            }
        }
    }

    for ship in store.ships.iter() {
        let context = format!("ship[{}]", ship.id);
        if !store.ship_templates.contains(ship.template_id) {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                format!("template {} not in store", ship.template_id),
            );
        }
        for equipment_id in ship.equipped_ids() {
            if !store.equipment.contains(equipment_id) {
                report.push(
                    ValidationSeverity::Error,
                    format!("{context}.slots"),
                    format!("equipment {equipment_id} not in store"),
                );
            }
        }
    }

    for item in store.equipment.iter() {
        if !store.equipment_templates.contains(item.template_id) {
            report.push(
                ValidationSeverity::Warning,
                format!("equipment[{}]", item.id),
                format!("template {} not in store", item.template_id),
            );
        }
    }

    for base in &store.air_bases {
        for squadron in &base.squadrons {
            if squadron.equipment_id > 0 && !store.equipment.contains(squadron.equipment_id) {
                report.push(
                    ValidationSeverity::Info,
                    format!("air_base[{}:{}].slot[{}]", base.area_id, base.base_id, squadron.slot_id),
                    format!("squadron equipment {} not in store", squadron.equipment_id),
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_snapshot_has_no_diagnostics() {
        let store = NormalizedStore::from_json_str(
            r#"{
                "ships": [{"id": 1, "template_id": 100, "now_hp": 1, "max_hp": 1, "slots": [5]}],
                "ship_templates": [{"id": 100, "name": "Fubuki"}],
                "equipment": [{"id": 5, "template_id": 2}],
                "equipment_templates": [{"id": 2, "name": "12.7cm Twin Gun Mount"}],
                "fleets": [{"id": 1, "ship_ids": [1, -1]}]
            }"#,
        )
        .expect("parse");
        let report = validate_snapshot(&store);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn dangling_references_are_graded() {
        let store = NormalizedStore::from_json_str(
            r#"{
                "ships": [{"id": 1, "template_id": 100, "now_hp": 1, "max_hp": 1, "slots": [5]}],
                "fleets": [
                    {"id": 1, "ship_ids": [1, 2]},
                    {"id": 2, "ship_ids": [1]}
                ]
            }"#,
        )
        .expect("parse");
        let report = validate_snapshot(&store);
        assert!(report.has_errors());
        // ship 2 missing, equipment 5 missing
        assert_eq!(report.count(ValidationSeverity::Error), 2);
        // template 100 missing, ship 1 in two fleets
        assert_eq!(report.count(ValidationSeverity::Warning), 2);
    }

    #[test]
    fn long_roster_warns_unless_combined() {
        let json = |combined: u8| {
            format!(
                r#"{{"fleets": [{{"id": 1, "ship_ids": [-1,-1,-1,-1,-1,-1,-1,-1]}}], "combined": {combined}}}"#
            )
        };
        let single = NormalizedStore::from_json_str(&json(0)).expect("parse");
        assert_eq!(validate_snapshot(&single).count(ValidationSeverity::Warning), 1);
        let combined = NormalizedStore::from_json_str(&json(1)).expect("parse");
        assert!(validate_snapshot(&combined).diagnostics.is_empty());
    }
}
