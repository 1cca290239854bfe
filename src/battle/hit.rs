//! Hit classification and raw damage decoding.

use serde::{Deserialize, Serialize};

/// Flag code the feed uses for a critical hit.
pub const CRITICAL_FLAG: i64 = 2;

/// Raw damage values carry a fractional marker when a fleet-mate took the hit in the
/// target's place.
const PROTECT_MARKER_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    Miss,
    Normal,
    Critical,
}

impl HitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miss => "miss",
            Self::Normal => "normal",
            Self::Critical => "critical",
        }
    }
}

/// Classify a hit for display. Zero or absent damage is a miss regardless of the flag.
pub fn classify_hit(damage: Option<i64>, flag: Option<i64>) -> HitKind {
    match damage {
        None | Some(0) => HitKind::Miss,
        Some(_) if flag == Some(CRITICAL_FLAG) => HitKind::Critical,
        Some(_) => HitKind::Normal,
    }
}

/// Decoded per-target damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Damage {
    pub amount: i64,
    pub protected: bool,
}

/// Split a raw damage value into its integer amount and protection marker.
/// Negative and non-finite values decode to zero.
pub fn decode_damage(raw: f64) -> Damage {
    if !raw.is_finite() || raw <= 0.0 {
        return Damage::default();
    }
    let amount = raw.floor();
    Damage {
        amount: amount as i64,
        protected: raw - amount > PROTECT_MARKER_THRESHOLD,
    }
}
