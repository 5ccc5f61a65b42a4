use std::{sync::Arc, time::Duration};

use shared::domain::{ExportMode, PageSize, SortField};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub mod bindings;
pub mod config;
pub mod debounce;
pub mod directory;
pub mod error;
pub mod export;
pub mod list_fetch;
pub mod query_state;

pub use bindings::{FetchPhase, TableBindings, TableSnapshot};
pub use config::{load_settings, ClientSettings, ConfigError};
pub use directory::{EmployeeDirectory, HttpEmployeeDirectory};
pub use error::DirectoryError;
pub use export::{DirectoryFileSaver, ExportOrchestrator, ExportOutcome, FileSaver};
pub use list_fetch::{ListFetchOrchestrator, RequestEpoch};
pub use query_state::{
    DerivedQueryParams, ExportParams, FilterField, FilterState, QueryStateError, QueryStateStore,
};

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One mounted employee table. Mounting issues the initial list query.
pub struct EmployeeTable {
    store: QueryStateStore,
    bindings: Arc<TableBindings>,
    list: Arc<ListFetchOrchestrator>,
    export: ExportOrchestrator,
    subscription: Option<JoinHandle<()>>,
}

impl EmployeeTable {
    pub fn mount(
        settings: &ClientSettings,
        directory: Arc<dyn EmployeeDirectory>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let store = QueryStateStore::new(settings.debounce_window(), settings.default_page_size);
        let bindings = Arc::new(TableBindings::new());
        let list = ListFetchOrchestrator::new(Arc::clone(&directory), Arc::clone(&bindings));
        let export = ExportOrchestrator::new(directory, saver, Arc::clone(&bindings));
        let subscription = Some(list.bind(store.subscribe()));

        info!(
            base_url = settings.base_url(),
            debounce_ms = settings.debounce_ms,
            "table: mounted"
        );

        Self {
            store,
            bindings,
            list,
            export,
            subscription,
        }
    }

    pub fn connect(settings: &ClientSettings) -> Result<Self, DirectoryError> {
        let directory = Arc::new(HttpEmployeeDirectory::new(settings)?);
        let saver = Arc::new(DirectoryFileSaver::new(settings.export_dir.clone()));
        Ok(Self::mount(settings, directory, saver))
    }

    pub fn set_filter(&mut self, field: FilterField, value: &str) -> Result<(), QueryStateError> {
        self.store.set_filter(field, value)
    }

    pub fn set_sort(&mut self, field: SortField) {
        self.store.set_sort(field);
    }

    pub fn set_page(&mut self, page_index: u32) {
        self.store.set_page(page_index);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.store.set_page_size(page_size);
    }

    pub fn set_export_mode(&mut self, mode: ExportMode) {
        self.store.set_export_mode(mode);
    }

    pub fn store(&self) -> &QueryStateStore {
        &self.store
    }

    pub fn bindings(&self) -> &Arc<TableBindings> {
        &self.bindings
    }

    pub fn list(&self) -> &Arc<ListFetchOrchestrator> {
        &self.list
    }

    pub fn export_available(&self) -> bool {
        self.export.is_available()
    }

    pub async fn export(&self) -> ExportOutcome {
        self.export.export(self.store.export_params()).await
    }

    /// Waits for unsettled input to commit, for the subscription to pick up
    /// the resulting params and for the shared loading flag to drop.
    pub async fn settle(&self) {
        loop {
            if self.store.has_pending_input() {
                tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
                continue;
            }
            let current = self.store.derive_params();
            if self.list.last_issued().await.as_ref() == Some(&current) {
                break;
            }
            if self.list.is_closed() {
                return;
            }
            tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
        }
        self.bindings.wait_until_idle().await;
    }

    pub async fn teardown(&mut self) {
        self.store.cancel_pending();
        self.list.shutdown();
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
        debug!(epoch = %self.list.latest_epoch().await, "table: torn down");
    }
}

impl Drop for EmployeeTable {
    fn drop(&mut self) {
        self.list.shutdown();
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
