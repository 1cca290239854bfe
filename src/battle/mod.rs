pub mod archive;
pub mod export;
pub mod grouping;
pub mod hit;
pub mod hp;
pub mod ingest;
pub mod phases;
pub mod planes;
pub mod record;
pub mod summary;

pub use archive::{ArchiveEntry, BattleArchive, DEFAULT_ARCHIVE_CAPACITY};
pub use export::{export_rows, write_phase_csv, ExportError, ExportRow};
pub use grouping::{group_attacks, Launcher, TargetDamage, TargetGroups, TargetRecord};
pub use hit::{classify_hit, decode_damage, HitKind};
pub use hp::{accumulate_damage, reconcile_hp, reconcile_series, Hp, HpLedger, HpSource, Reconciled};
pub use ingest::{load_battle_dir, load_battle_file, parse_battle_json, IngestError};
pub use phases::{phase_tables, PhaseBody, PhaseTable};
pub use planes::{resolve_plane_slots, PlaneSlot};
pub use record::{BattleRecord, BattleSegment, Phase, SegmentKind, Side};
pub use summary::{summarize_battle, summarize_battles, BattleSummary, CombatantRow, SideSummary};
