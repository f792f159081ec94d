//! Local page cache read and overwritten by the reorder coordinator.

use crate::repo::todo_repo::{RepoResult, TodoListQuery, TodoPage, TodoRepository};
use crate::service::todo_service::TodoService;
use parking_lot::Mutex;

/// One cached listing result together with the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub query: TodoListQuery,
    pub page: TodoPage,
}

impl CachedPage {
    /// Runs `query` against the store and wraps the result.
    pub fn fetch<R: TodoRepository>(
        service: &TodoService<R>,
        query: TodoListQuery,
    ) -> RepoResult<Self> {
        let page = service.list_todos(&query)?;
        Ok(Self { query, page })
    }
}

/// Reactive cache contract: read current page, overwrite current page.
pub trait PageCache: Send + Sync {
    fn read(&self) -> Option<CachedPage>;
    fn overwrite(&self, page: CachedPage);
}

/// Single-slot in-memory cache.
#[derive(Debug, Default)]
pub struct InMemoryPageCache {
    slot: Mutex<Option<CachedPage>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(page: CachedPage) -> Self {
        Self {
            slot: Mutex::new(Some(page)),
        }
    }
}

impl PageCache for InMemoryPageCache {
    fn read(&self) -> Option<CachedPage> {
        self.slot.lock().clone()
    }

    fn overwrite(&self, page: CachedPage) {
        *self.slot.lock() = Some(page);
    }
}

#[cfg(test)]
mod tests {
    use super::{CachedPage, InMemoryPageCache, PageCache};
    use crate::repo::todo_repo::{TodoListQuery, TodoPage};

    fn empty_page(query: TodoListQuery) -> CachedPage {
        CachedPage {
            page: TodoPage {
                todos: Vec::new(),
                total: 0,
                page: query.effective_page(),
                limit: query.effective_limit(),
                total_pages: 0,
            },
            query,
        }
    }

    #[test]
    fn new_cache_holds_no_page() {
        assert_eq!(InMemoryPageCache::new().read(), None);
    }

    #[test]
    fn overwrite_replaces_current_page() {
        let cache = InMemoryPageCache::with_page(empty_page(TodoListQuery::default()));
        let manual = empty_page(TodoListQuery::manual_order());

        cache.overwrite(manual.clone());

        assert_eq!(cache.read(), Some(manual));
    }
}
