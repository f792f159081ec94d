//! Snapshot, speculative apply, commit-or-revert for one drag-and-drop move.
//!
//! # Responsibility
//! - Translate displayed indexes into absolute collection positions.
//! - Mutate the cached page before the relocation request resolves.
//! - Restore the pre-move snapshot when the request fails or times out.
//!
//! # Invariants
//! - A refused move (wrong sort, filtered view, no-op, bad index) issues no
//!   request and leaves the cache untouched.
//! - A failed move restores exactly the page it snapshotted; it never
//!   retries.

use crate::config::ReorderConfig;
use crate::model::todo::{Todo, TodoId};
use crate::reorder::cache::{CachedPage, PageCache};
use crate::reorder::notify::Notifier;
use crate::reorder::transport::{RelocationTransport, ReorderError};
use crate::repo::todo_repo::{SortDirection, SortField, TodoListQuery};
use log::{debug, info, warn};
use std::time::Instant;

/// Why the current view does not accept manual moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderBlock {
    /// Cache holds no page yet.
    NoPage,
    /// Active sort is not manual order.
    NotManualSort(SortField),
    /// Status or search filter hides part of the collection.
    Filtered,
}

impl ReorderBlock {
    fn as_str(self) -> &'static str {
        match self {
            Self::NoPage => "no_page",
            Self::NotManualSort(_) => "not_manual_sort",
            Self::Filtered => "filtered_view",
        }
    }
}

/// An optimistic move that has been applied locally and awaits its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub todo_id: TodoId,
    pub source_index: usize,
    pub destination_index: usize,
    /// Absolute position sent to the store.
    pub new_order: i64,
    snapshot: CachedPage,
}

impl PendingMove {
    /// Page as it was right before this move's optimistic write.
    pub fn snapshot(&self) -> &CachedPage {
        &self.snapshot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing was applied and no request was issued.
    Skipped,
    /// Store accepted the move; the optimistic page stays.
    Committed(Todo),
    /// Request failed; the snapshot was restored.
    RolledBack(ReorderError),
}

/// Checks whether manual reordering is allowed for `query`.
pub fn reorder_block(query: &TodoListQuery) -> Option<ReorderBlock> {
    if query.sort_by != SortField::Order {
        return Some(ReorderBlock::NotManualSort(query.sort_by));
    }
    if query.is_filtered() {
        return Some(ReorderBlock::Filtered);
    }
    None
}

/// Maps a displayed row index to the absolute `order` it represents.
///
/// Valid only for unfiltered views sorted by `order`; pagination and
/// descending direction are accounted for.
pub fn displayed_to_absolute(query: &TodoListQuery, total: i64, index: usize) -> i64 {
    let position = query.offset() + index as i64;
    match query.direction {
        SortDirection::Asc => position,
        SortDirection::Desc => total - 1 - position,
    }
}

/// Coordinates optimistic moves against a cache, a transport, and a
/// notification sink.
pub struct ReorderCoordinator<C, T, N> {
    cache: C,
    transport: T,
    notifier: N,
    config: ReorderConfig,
}

impl<C, T, N> ReorderCoordinator<C, T, N>
where
    C: PageCache,
    T: RelocationTransport,
    N: Notifier,
{
    pub fn new(cache: C, transport: T, notifier: N, config: ReorderConfig) -> Self {
        Self {
            cache,
            transport,
            notifier,
            config,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Returns `None` when the cached view accepts moves.
    pub fn current_block(&self) -> Option<ReorderBlock> {
        match self.cache.read() {
            Some(cached) => reorder_block(&cached.query),
            None => Some(ReorderBlock::NoPage),
        }
    }

    /// Moves the row at `source_index` to `destination_index`.
    ///
    /// Applies the new order locally first, then awaits the relocation
    /// request (bounded by `request_timeout`) and keeps or reverts.
    pub async fn move_item(&self, source_index: usize, destination_index: usize) -> MoveOutcome {
        let Some(pending) = self.begin_move(source_index, destination_index) else {
            return MoveOutcome::Skipped;
        };

        let started_at = Instant::now();
        let request = self.transport.relocate(pending.todo_id, pending.new_order);
        let result = match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ReorderError::Timeout(self.config.request_timeout)),
        };
        debug!(
            "event=reorder_request module=reorder status=done todo_id={} duration_ms={}",
            pending.todo_id,
            started_at.elapsed().as_millis()
        );
        self.settle(pending, result)
    }

    /// Snapshots the cached page and applies the move optimistically.
    ///
    /// Returns `None`, without touching the cache, when the move is refused.
    pub fn begin_move(&self, source_index: usize, destination_index: usize) -> Option<PendingMove> {
        let Some(snapshot) = self.cache.read() else {
            debug!("event=reorder_begin module=reorder status=skipped reason=no_page");
            return None;
        };
        if let Some(block) = reorder_block(&snapshot.query) {
            debug!(
                "event=reorder_begin module=reorder status=skipped reason={}",
                block.as_str()
            );
            return None;
        }
        if source_index == destination_index {
            return None;
        }
        let len = snapshot.page.todos.len();
        if source_index >= len || destination_index >= len {
            warn!(
                "event=reorder_begin module=reorder status=skipped reason=index_out_of_bounds source={source_index} destination={destination_index} len={len}"
            );
            return None;
        }

        let total = snapshot.page.total;
        let mut next = snapshot.clone();
        let moved = next.page.todos.remove(source_index);
        let todo_id = moved.id;
        next.page.todos.insert(destination_index, moved);
        for (index, todo) in next.page.todos.iter_mut().enumerate() {
            todo.order = displayed_to_absolute(&next.query, total, index);
        }
        let new_order = displayed_to_absolute(&next.query, total, destination_index);

        self.cache.overwrite(next);
        info!(
            "event=reorder_begin module=reorder status=applied todo_id={todo_id} source={source_index} destination={destination_index} new_order={new_order}"
        );

        Some(PendingMove {
            todo_id,
            source_index,
            destination_index,
            new_order,
            snapshot,
        })
    }

    /// Resolves a pending move with its request result.
    ///
    /// Success leaves the optimistic page in place; failure restores the
    /// move's own snapshot. Either way a notification is emitted.
    pub fn settle(&self, pending: PendingMove, result: Result<Todo, ReorderError>) -> MoveOutcome {
        match result {
            Ok(todo) => {
                info!(
                    "event=reorder_settle module=reorder status=ok todo_id={} order={}",
                    todo.id, todo.order
                );
                self.notifier.notify_success(&self.config.success_message);
                MoveOutcome::Committed(todo)
            }
            Err(err) => {
                warn!(
                    "event=reorder_settle module=reorder status=rolled_back todo_id={} error_code={} error={err}",
                    pending.todo_id,
                    err.code()
                );
                self.cache.overwrite(pending.snapshot);
                let text = err
                    .server_message()
                    .unwrap_or(self.config.failure_fallback_message.as_str());
                self.notifier.notify_failure(text);
                MoveOutcome::RolledBack(err)
            }
        }
    }
}
