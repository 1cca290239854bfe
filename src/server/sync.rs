//! Store sync ingress: accepts a JSON array of `StoreUpdate`s and applies them to the shared
//! store in one write.

use crate::data::loader::save_snapshot;
use crate::data::store::StoreUpdate;
use crate::server::routes::{json_error, HttpResponse};
use crate::server::AppState;

/// Handles POST /api/sync: checks the token, decodes each update, and applies the valid ones.
/// Entries that do not decode are counted as rejected and skipped.
pub fn sync_payload(body: &str, sync_token: Option<&str>, state: &AppState) -> HttpResponse {
    if let Some(expected) = state.sync_token.as_deref() {
        if sync_token.unwrap_or("").trim() != expected {
            return json_error(401, "Unauthorized", "Invalid or missing x-sync-token");
        }
    }

    let payload: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(items) => items,
        Err(e) => {
            return json_error(
                400,
                "Bad Request",
                &format!("Request body must be a JSON array: {e}"),
            );
        }
    };

    let mut rejected = 0usize;
    let updates: Vec<StoreUpdate> = payload
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(update) => Some(update),
            Err(err) => {
                rejected += 1;
                tracing::warn!(target: "fleetview::server", error = %err, "sync.update.rejected");
                None
            }
        })
        .collect();

    let report = {
        let mut store = state.write_store();
        let report = store.apply_all(updates);
        if report.accepted > 0 {
            if let Some(path) = &state.snapshot_path {
                if let Err(err) = save_snapshot(path, &store) {
                    tracing::warn!(
                        target: "fleetview::server",
                        path = %path.display(),
                        error = %err,
                        "sync.snapshot.write_failed"
                    );
                }
            }
        }
        report
    };

    let body = serde_json::json!({
        "status": "ok",
        "accepted": report.accepted,
        "ignored": report.ignored,
        "rejected": rejected,
    });
    match serde_json::to_string_pretty(&body) {
        Ok(body) => HttpResponse::json(body),
        Err(err) => json_error(500, "Internal Server Error", &err.to_string()),
    }
}
