pub mod equipment;
pub mod fleet;
pub mod join;
pub mod loader;
pub mod ship;
pub mod store;
pub mod validate;

pub use equipment::{EquipmentInstance, EquipmentTemplate};
pub use fleet::{resolve_fleet, CombinedFleetType, FleetRoster, FleetSlots, RosterSlot};
pub use join::{
    join_equipment, join_equipment_list, join_ship, join_ships, EquipSlot, EquipmentJoin, Lookup,
    ShipJoin, SlotRef, UNKNOWN_NAME,
};
pub use loader::{load_snapshot, load_snapshot_or_empty, save_snapshot, DEFAULT_SNAPSHOT_PATH};
pub use ship::{ShipInstance, ShipTemplate, StatPair};
pub use store::{
    AirBase, AirSquadron, ApplyReport, Keyed, NormalizedStore, StoreError, StoreUpdate, Table,
};
pub use validate::{validate_snapshot, ValidationDiagnostic, ValidationReport, ValidationSeverity};
