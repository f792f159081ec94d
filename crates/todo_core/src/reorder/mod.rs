//! Optimistic manual reordering of a displayed todo page.
//!
//! # Responsibility
//! - Apply a drag-and-drop move to the locally cached page immediately.
//! - Issue one relocation request and keep or revert the optimistic view.
//!
//! # Invariants
//! - Each move owns its own rollback snapshot, taken right before its own
//!   optimistic write.
//! - The local page is never treated as authoritative; the store is.
//! - Moves are refused unless the view is sorted by manual order with no
//!   status/search filter.
//! - Rolling back restores the exact snapshot of the failed move. When an
//!   earlier move fails after a later one has committed, the later move also
//!   disappears from the local page until it is refetched from the store
//!   (`CachedPage::fetch` followed by `PageCache::overwrite`).

pub mod cache;
pub mod coordinator;
pub mod notify;
pub mod transport;
