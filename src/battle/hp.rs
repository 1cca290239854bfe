//! HP reconciliation across the day and night segments of one battle, and the damage
//! accumulator that sums per-phase damage.

use serde::{Serialize, Serializer};

use crate::data::fleet::COMBINED_FLEET_SIZE;

/// Positions reported when no input carries a concrete length.
pub const DEFAULT_POSITIONS: usize = COMBINED_FLEET_SIZE;

/// HP value that may be unknown. Serialized as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hp {
    Known(i64),
    Unknown,
}

impl Hp {
    pub fn known(self) -> Option<i64> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown => None,
        }
    }
}

impl Serialize for Hp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => serializer.serialize_i64(*value),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

/// Starting HP and cumulative damage of one segment, for one side.
#[derive(Debug, Clone, Copy)]
pub struct HpLedger<'a> {
    pub start: &'a [i64],
    /// Absent damage counts as zero everywhere.
    pub damage: Option<&'a [i64]>,
}

/// Which series the reconciled HP came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HpSource {
    Day,
    Night,
    /// Both series present and identical.
    Agreed,
    /// Neither series dominates the other.
    Conflict,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub hps: Vec<Hp>,
    pub source: HpSource,
}

impl Reconciled {
    fn unknown(len: usize, source: HpSource) -> Self {
        Self {
            hps: vec![Hp::Unknown; len],
            source,
        }
    }

    fn known(series: Vec<i64>, source: HpSource) -> Self {
        Self {
            hps: series.into_iter().map(Hp::Known).collect(),
            source,
        }
    }

    pub fn get(&self, position: usize) -> Hp {
        self.hps.get(position).copied().unwrap_or(Hp::Unknown)
    }
}

/// HP after one segment: `max(start - damage, 0)` per position.
pub fn hp_after(ledger: &HpLedger<'_>) -> Vec<i64> {
    ledger
        .start
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let damage = ledger
                .damage
                .and_then(|damage| damage.get(i).copied())
                .unwrap_or(0);
            start.saturating_sub(damage).max(0)
        })
        .collect()
}

/// Reconstruct current HP from the day and night ledgers.
pub fn reconcile_hp(day: Option<HpLedger<'_>>, night: Option<HpLedger<'_>>) -> Reconciled {
    reconcile_series(day.as_ref().map(hp_after), night.as_ref().map(hp_after))
}

/// Combine two independently derived HP series.
///
/// The elementwise minimum must equal one of the inputs in full; a partial disagreement
/// marks every position unknown rather than splicing the two series together.
pub fn reconcile_series(day: Option<Vec<i64>>, night: Option<Vec<i64>>) -> Reconciled {
    match (day, night) {
        (None, None) => Reconciled::unknown(DEFAULT_POSITIONS, HpSource::NoData),
        (Some(day), None) => Reconciled::known(day, HpSource::Day),
        (None, Some(night)) => Reconciled::known(night, HpSource::Night),
        (Some(day), Some(night)) => {
            if day.len() != night.len() {
                tracing::debug!(
                    target: "fleetview::battle",
                    day_len = day.len(),
                    night_len = night.len(),
                    "hp.reconcile.length_mismatch"
                );
                return Reconciled::unknown(day.len().max(night.len()), HpSource::Conflict);
            }
            let min: Vec<i64> = day.iter().zip(&night).map(|(d, n)| *d.min(n)).collect();
            match (min == day, min == night) {
                (true, true) => Reconciled::known(min, HpSource::Agreed),
                (true, false) => Reconciled::known(min, HpSource::Day),
                (false, true) => Reconciled::known(min, HpSource::Night),
                (false, false) => {
                    tracing::debug!(
                        target: "fleetview::battle",
                        ?day,
                        ?night,
                        "hp.reconcile.conflict"
                    );
                    Reconciled::unknown(min.len(), HpSource::Conflict)
                }
            }
        }
    }
}

/// Elementwise sum of per-phase damage arrays.
///
/// Absent or empty arrays contribute zeros. The output length is the longest concrete input,
/// or [DEFAULT_POSITIONS] when there is none.
pub fn accumulate_damage(series: &[Option<&[i64]>]) -> Vec<i64> {
    let len = series
        .iter()
        .flatten()
        .map(|values| values.len())
        .max()
        .filter(|&len| len > 0)
        .unwrap_or(DEFAULT_POSITIONS);

    let mut total = vec![0i64; len];
    for values in series.iter().flatten() {
        for (slot, value) in total.iter_mut().zip(values.iter()) {
            *slot = slot.saturating_add(*value);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_after_clamps_at_zero_and_treats_missing_damage_as_zero() {
        let ledger = HpLedger {
            start: &[30, 10, 5],
            damage: Some(&[12, 40]),
        };
        assert_eq!(hp_after(&ledger), vec![18, 0, 5]);
        let ledger = HpLedger {
            start: &[30],
            damage: None,
        };
        assert_eq!(hp_after(&ledger), vec![30]);
    }

    #[test]
    fn day_series_dominates_when_lower() {
        let day = HpLedger {
            start: &[100],
            damage: Some(&[30]),
        };
        let night = HpLedger {
            start: &[100],
            damage: Some(&[20]),
        };
        let result = reconcile_hp(Some(day), Some(night));
        assert_eq!(result.hps, vec![Hp::Known(70)]);
        assert_eq!(result.source, HpSource::Day);
    }

    #[test]
    fn night_follows_day() {
        let day = HpLedger {
            start: &[40, 32],
            damage: Some(&[10, 0]),
        };
        let night = HpLedger {
            start: &[30, 32],
            damage: Some(&[5, 32]),
        };
        let result = reconcile_hp(Some(day), Some(night));
        assert_eq!(result.hps, vec![Hp::Known(25), Hp::Known(0)]);
        assert_eq!(result.source, HpSource::Night);
    }

    #[test]
    fn partial_disagreement_is_unknown_everywhere() {
        let result = reconcile_series(Some(vec![70, 40]), Some(vec![60, 50]));
        assert_eq!(result.hps, vec![Hp::Unknown, Hp::Unknown]);
        assert_eq!(result.source, HpSource::Conflict);
    }

    #[test]
    fn single_segment_passes_through() {
        let result = reconcile_series(None, Some(vec![3, 0]));
        assert_eq!(result.hps, vec![Hp::Known(3), Hp::Known(0)]);
        assert_eq!(result.source, HpSource::Night);
    }

    #[test]
    fn no_data_is_twelve_unknowns() {
        let result = reconcile_hp(None, None);
        assert_eq!(result.hps.len(), DEFAULT_POSITIONS);
        assert!(result.hps.iter().all(|hp| *hp == Hp::Unknown));
        assert_eq!(result.get(40), Hp::Unknown);
    }

    #[test]
    fn length_mismatch_is_a_conflict() {
        let result = reconcile_series(Some(vec![1, 2, 3]), Some(vec![1, 2]));
        assert_eq!(result.source, HpSource::Conflict);
        assert_eq!(result.hps.len(), 3);
    }

    #[test]
    fn hp_serializes_unknown_as_null() {
        let json = serde_json::to_string(&vec![Hp::Known(5), Hp::Unknown]).expect("serialize");
        assert_eq!(json, "[5,null]");
    }

    #[test]
    fn accumulate_treats_absent_as_zero() {
        assert_eq!(accumulate_damage(&[None, Some(&[1, 2, 3])]), vec![1, 2, 3]);
        assert_eq!(accumulate_damage(&[Some(&[]), Some(&[])]), vec![0; 12]);
        assert_eq!(accumulate_damage(&[]), vec![0; 12]);
        assert_eq!(
            accumulate_damage(&[Some(&[1, 1]), Some(&[2, 2, 2])]),
            vec![3, 3, 2]
        );
    }

    #[test]
    fn saturated_damage_never_raises_hp() {
        let total = accumulate_damage(&[Some(&[i64::MAX, 1]), Some(&[i64::MAX, 1])]);
        assert_eq!(total, vec![i64::MAX, 2]);
        let ledger = HpLedger {
            start: &[20, 5],
            damage: Some(total.as_slice()),
        };
        assert_eq!(hp_after(&ledger), vec![0, 3]);
        let negative_start = HpLedger {
            start: &[i64::MIN],
            damage: Some(&[i64::MAX]),
        };
        assert_eq!(hp_after(&negative_start), vec![0]);
    }
}
