//! Concurrent population of player availability.
//!
//! The roster is scanned sequentially so role inheritance is settled before
//! anything is spawned. Each player's sheet is then fetched on its own task;
//! results come back over a bounded channel, one message per task, in
//! completion order. The first failure cancels the remaining fetches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thonky_sheets::{DocumentProvider, Sheet, SheetError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{LayoutConfig, ThonkyConfig};
use crate::error::{Result, ScheduleError};
use crate::schedule::{Player, RosterEntry, roster_entries};

/// Run a remote call under a deadline, mapping both failure kinds onto
/// [`ScheduleError`].
pub(crate) async fn timed<T>(
    timeout: Duration,
    what: &str,
    call: impl Future<Output = std::result::Result<T, SheetError>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(ScheduleError::from),
        Err(_elapsed) => Err(ScheduleError::Timeout(format!(
            "{what} after {}s",
            timeout.as_secs_f32()
        ))),
    }
}

/// What one player task reports back.
enum FetchOutcome {
    Loaded(Player),
    Failed(ScheduleError),
    Cancelled,
}

struct PlayerMessage {
    /// Spawn index of the reporting task.
    task: usize,
    outcome: FetchOutcome,
}

/// Fetch the roster and every listed player's availability.
///
/// # Errors
///
/// - [`ScheduleError::Malformed`] when the roster lists more players than
///   `fetch.max_players`
/// - [`ScheduleError::PartialFetchFailure`] when any player sheet could not
///   be fetched; no partial list is returned
/// - any error from fetching the roster sheet itself
pub(crate) async fn fetch_players<P>(
    provider: &Arc<P>,
    doc_id: &str,
    config: &ThonkyConfig,
) -> Result<Vec<Player>>
where
    P: DocumentProvider + 'static,
{
    let layout = &config.layout;
    let timeout = config.fetch.timeout();

    let roster = timed(
        timeout,
        "roster sheet",
        provider.fetch_sheet(doc_id, &layout.roster_sheet),
    )
    .await?;
    let entries = roster_entries(&roster, layout);
    let max_players = config.fetch.max_players;
    if entries.len() > max_players {
        return Err(ScheduleError::Malformed(format!(
            "roster lists {} players, at most {max_players} are supported",
            entries.len()
        )));
    }

    let (tx, mut rx) = mpsc::channel::<PlayerMessage>(max_players.max(1));
    let cancel = CancellationToken::new();
    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();

    for (task, entry) in entries.into_iter().enumerate() {
        let provider = Arc::clone(provider);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let doc_id = doc_id.to_string();
        let layout = layout.clone();
        tokio::spawn(async move {
            let outcome = fetch_one(provider.as_ref(), &doc_id, entry, &layout, timeout, &cancel).await;
            if matches!(outcome, FetchOutcome::Failed(_)) {
                cancel.cancel();
            }
            // The receiver only goes away if the update itself was dropped.
            let _ = tx.send(PlayerMessage { task, outcome }).await;
        });
    }
    drop(tx);

    let mut reported = vec![false; names.len()];
    let mut players = Vec::with_capacity(names.len());
    let mut failed: Vec<String> = Vec::new();
    let mut first_error: Option<ScheduleError> = None;
    let mut cancelled = 0usize;

    for _ in 0..names.len() {
        let Some(message) = rx.recv().await else {
            break;
        };
        let Some(slot) = reported.get_mut(message.task) else {
            continue;
        };
        *slot = true;
        let name = &names[message.task];
        match message.outcome {
            FetchOutcome::Loaded(player) => {
                debug!(doc_id, player = %player.name, "player sheet loaded");
                players.push(player);
            }
            FetchOutcome::Failed(err) => {
                warn!(doc_id, player = %name, error = %err, "player sheet fetch failed");
                failed.push(name.clone());
                first_error.get_or_insert(err);
            }
            FetchOutcome::Cancelled => cancelled += 1,
        }
    }

    // Tasks that ended without reporting (a panic) count as failures.
    let lost: Vec<String> = reported
        .iter()
        .zip(&names)
        .filter(|(reported, _)| !**reported)
        .map(|(_, name)| name.clone())
        .collect();
    if !lost.is_empty() {
        warn!(doc_id, players = ?lost, "player tasks ended without reporting");
        failed.extend(lost);
        first_error.get_or_insert(ScheduleError::Malformed("player task aborted".into()));
    }

    if let Some(err) = first_error {
        debug!(doc_id, cancelled, "player population aborted");
        return Err(ScheduleError::PartialFetchFailure {
            failed,
            reason: err.to_string(),
        });
    }
    Ok(players)
}

async fn fetch_one<P: DocumentProvider>(
    provider: &P,
    doc_id: &str,
    entry: RosterEntry,
    layout: &LayoutConfig,
    timeout: Duration,
    cancel: &CancellationToken,
) -> FetchOutcome {
    let what = format!("sheet {:?}", entry.name);
    let fetched: Result<Sheet> = tokio::select! {
        _ = cancel.cancelled() => return FetchOutcome::Cancelled,
        result = timed(timeout, &what, provider.fetch_sheet(doc_id, &entry.name)) => result,
    };
    match fetched {
        Ok(sheet) => FetchOutcome::Loaded(Player::from_sheet(entry, &sheet, layout)),
        Err(err) => FetchOutcome::Failed(err),
    }
}
