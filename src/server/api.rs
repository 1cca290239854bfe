use serde::Serialize;
use thiserror::Error;

use crate::battle::ingest::{parse_battle_json, IngestError};
use crate::battle::phases::phase_tables;
use crate::battle::summary::summarize_battle;
use crate::data::fleet::resolve_fleet;
use crate::data::join::{join_equipment_list, join_ships};
use crate::server::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Route not found")]
    RouteNotFound,
    #[error("Battle not found: {0}")]
    BattleNotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid battle record: {0}")]
    Ingest(#[from] IngestError),
    #[error("Could not encode response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::RouteNotFound | Self::BattleNotFound(_) => (404, "Not Found"),
            Self::BadRequest(_) | Self::Ingest(_) => (400, "Bad Request"),
            Self::Serialize(_) => (500, "Internal Server Error"),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Parse `ids=1,2,3` out of a query string. A missing parameter is an empty list.
fn parse_ids(query: &str) -> Result<Vec<i64>, ApiError> {
    let Some(raw) = query
        .split('&')
        .find_map(|pair| pair.trim().strip_prefix("ids="))
    else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("ids must be integers, got {id:?}")))
        })
        .collect()
}

pub fn health_payload(state: &AppState) -> Result<String, ApiError> {
    let battles = state.read_archive().len();
    let store = state.read_store();
    to_json(&serde_json::json!({
        "status": "ok",
        "service": "fleetview-api",
        "version": env!("CARGO_PKG_VERSION"),
        "ships": store.ships.len(),
        "equipment": store.equipment.len(),
        "fleets": store.fleets.len(),
        "battles": battles,
    }))
}

pub fn fleet_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    let fleet_id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("fleet id must be an integer, got {id:?}")))?;
    let store = state.read_store();
    let fleet = resolve_fleet(&store.fleets, fleet_id, store.combined);
    to_json(&serde_json::json!({
        "fleet": fleet,
        "main_ids": fleet.main_ids(),
        "escort_ids": fleet.escort_ids(),
    }))
}

pub fn ships_payload(state: &AppState, query: &str) -> Result<String, ApiError> {
    let ids = parse_ids(query)?;
    let store = state.read_store();
    to_json(&join_ships(&store, ids))
}

pub fn equipment_payload(state: &AppState, query: &str) -> Result<String, ApiError> {
    let ids = parse_ids(query)?;
    let store = state.read_store();
    to_json(&join_equipment_list(&store, ids))
}

pub fn battles_list_payload(state: &AppState) -> Result<String, ApiError> {
    let archive = state.read_archive();
    to_json(&serde_json::json!({ "battles": archive.list() }))
}

pub fn battle_ingest_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let record = parse_battle_json(body)?;
    let id = record.id.clone();
    let replaced = state.write_archive().insert(record);
    tracing::info!(
        target: "fleetview::server",
        battle_id = %id,
        "battle.received"
    );
    to_json(&serde_json::json!({
        "status": "ok",
        "id": id,
        "displaced": replaced.map(|r| r.id),
    }))
}

pub fn summary_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    let archive = state.read_archive();
    let battle = archive
        .get(id)
        .ok_or_else(|| ApiError::BattleNotFound(id.to_string()))?;
    let store = state.read_store();
    to_json(&summarize_battle(&store, battle))
}

pub fn phases_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    let archive = state.read_archive();
    let battle = archive
        .get(id)
        .ok_or_else(|| ApiError::BattleNotFound(id.to_string()))?;
    let store = state.read_store();
    to_json(&serde_json::json!({
        "battle_id": battle.id,
        "phases": phase_tables(&store, battle),
    }))
}
