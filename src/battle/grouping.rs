//! Attack-target grouping: invert "launcher -> targets" into "target -> launchers".
//!
//! Torpedo salvos and air strikes report which targets each launcher hit, while damage and
//! critical flags are kept per target. One row per distinct target is rendered, with every
//! contributing launcher stacked in that row.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::battle::hit::{classify_hit, HitKind};

/// Target value that means "this launcher did not fire".
pub const NO_TARGET: i64 = -1;

/// One launching ship and the target positions it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Launcher {
    pub index: usize,
    pub targets: Vec<i64>,
}

/// Damage received by one target position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TargetDamage {
    pub damage: i64,
    pub critical: Option<i64>,
    pub protected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRecord {
    pub target: usize,
    pub damage: i64,
    pub critical: Option<i64>,
    pub hit: HitKind,
    pub protected: bool,
    pub attackers: Vec<usize>,
}

impl TargetRecord {
    fn new(target: usize, received: TargetDamage) -> Self {
        Self {
            target,
            damage: received.damage,
            critical: received.critical,
            hit: classify_hit(Some(received.damage), received.critical),
            protected: received.protected,
            attackers: Vec::new(),
        }
    }
}

/// Distinct targets in first-seen order plus their grouped records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetGroups {
    pub order: Vec<usize>,
    pub by_target: BTreeMap<usize, TargetRecord>,
}

impl TargetGroups {
    /// Records in first-seen order.
    pub fn rows(&self) -> impl Iterator<Item = &TargetRecord> {
        self.order.iter().filter_map(|t| self.by_target.get(t))
    }

    pub fn get(&self, target: usize) -> Option<&TargetRecord> {
        self.by_target.get(&target)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Record that `attacker` hit `target`, creating the target's record on first sight.
    /// `attacker` is `None` when the hit has no ship attribution (land-based squadrons,
    /// support barrages).
    pub fn record_hit(&mut self, target: usize, attacker: Option<usize>, received: TargetDamage) {
        if !self.by_target.contains_key(&target) {
            self.order.push(target);
        }
        let record = self
            .by_target
            .entry(target)
            .or_insert_with(|| TargetRecord::new(target, received));
        if let Some(attacker) = attacker {
            record.attackers.push(attacker);
        }
    }

    /// Fold another unattributed hit into `target`'s record. Damage is summed and the
    /// strongest critical flag kept.
    pub fn merge_hit(&mut self, target: usize, received: TargetDamage) {
        let Some(record) = self.by_target.get_mut(&target) else {
            self.record_hit(target, None, received);
            return;
        };
        record.damage = record.damage.saturating_add(received.damage);
        record.critical = record.critical.max(received.critical);
        record.protected |= received.protected;
        record.hit = classify_hit(Some(record.damage), record.critical);
    }
}

/// Group one side's launchers by target.
///
/// `received` is indexed by target position; a target beyond its end reads as zero damage.
/// Negative target entries are skipped.
pub fn group_attacks(launchers: &[Launcher], received: &[TargetDamage]) -> TargetGroups {
    let mut groups = TargetGroups::default();
    for launcher in launchers {
        for &target in &launcher.targets {
            let Ok(target) = usize::try_from(target) else {
                continue;
            };
            let damage = received.get(target).copied().unwrap_or_default();
            groups.record_hit(target, Some(launcher.index), damage);
        }
    }
    groups
}
