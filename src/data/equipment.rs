//! Equipment data: gear instances (including plane squadrons) and gear templates.

use serde::{Deserialize, Serialize};

/// Index into [EquipmentTemplate::category] holding the icon/category code.
const CATEGORY_KIND: usize = 2;

/// Category codes that denote aircraft (fighters, bombers, seaplanes, flying boats,
/// land-based attackers, jets and the like).
const PLANE_CATEGORIES: &[i64] = &[6, 7, 8, 9, 10, 11, 25, 26, 41, 45, 47, 48, 49, 56, 57, 58, 59];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentInstance {
    pub id: i64,
    pub template_id: i64,
    /// Improvement level (0..=10).
    #[serde(default)]
    pub improvement: i64,
    /// Aircraft proficiency (0..=7); absent for non-planes.
    #[serde(default)]
    pub proficiency: Option<i64>,
    /// Remaining aircraft when the item is a land-based squadron.
    #[serde(default)]
    pub aircraft: Option<i64>,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    pub id: i64,
    pub name: String,
    /// Type vector: `[large, medium, category, icon, aircraft]`.
    #[serde(default)]
    pub category: Vec<i64>,
    #[serde(default)]
    pub firepower: i64,
    #[serde(default)]
    pub torpedo: i64,
    #[serde(default)]
    pub bombing: i64,
    #[serde(default)]
    pub anti_air: i64,
    #[serde(default)]
    pub armor: i64,
    #[serde(default)]
    pub line_of_sight: i64,
}

impl EquipmentTemplate {
    pub fn category_code(&self) -> Option<i64> {
        self.category.get(CATEGORY_KIND).copied()
    }

    pub fn is_plane(&self) -> bool {
        self.category_code()
            .is_some_and(|code| PLANE_CATEGORIES.contains(&code))
    }
}
