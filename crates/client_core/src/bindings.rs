use shared::{domain::EmployeeRecord, protocol::ListResult};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

// The loading flag is up while either hold is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LoadingHolds {
    list: bool,
    export: bool,
}

impl LoadingHolds {
    fn any(self) -> bool {
        self.list || self.export
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub items: Vec<EmployeeRecord>,
    pub total: u64,
    pub departments: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: FetchPhase,
}

pub struct TableBindings {
    items: watch::Sender<Vec<EmployeeRecord>>,
    total: watch::Sender<u64>,
    departments: watch::Sender<Vec<String>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    phase: watch::Sender<FetchPhase>,
    holds: watch::Sender<LoadingHolds>,
}

impl Default for TableBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBindings {
    pub fn new() -> Self {
        Self {
            items: watch::Sender::new(Vec::new()),
            total: watch::Sender::new(0),
            departments: watch::Sender::new(Vec::new()),
            loading: watch::Sender::new(false),
            error: watch::Sender::new(None),
            phase: watch::Sender::new(FetchPhase::Idle),
            holds: watch::Sender::new(LoadingHolds::default()),
        }
    }

    pub(crate) fn begin_list(&self) {
        self.phase.send_replace(FetchPhase::Loading);
        self.update_holds(|holds| holds.list = true);
    }

    pub(crate) fn apply_list_success(&self, result: ListResult) {
        self.items.send_replace(result.items);
        self.total.send_replace(result.total);
        if let Some(departments) = result.departments {
            self.departments.send_replace(departments);
        }
        self.error.send_replace(None);
        self.phase.send_replace(FetchPhase::Success);
        self.update_holds(|holds| holds.list = false);
    }

    /// Rows from the last good fetch stay on screen.
    pub(crate) fn apply_list_failure(&self, message: String) {
        self.error.send_replace(Some(message));
        self.phase.send_replace(FetchPhase::Error);
        self.update_holds(|holds| holds.list = false);
    }

    pub(crate) fn release_list(&self) {
        self.update_holds(|holds| holds.list = false);
    }

    /// `false` when an export already holds the flag.
    pub(crate) fn begin_export(&self) -> bool {
        let mut started = false;
        self.holds.send_if_modified(|holds| {
            started = !holds.export;
            holds.export = true;
            started
        });
        self.publish_loading();
        started
    }

    pub(crate) fn finish_export(&self, error: Option<String>) {
        if let Some(message) = error {
            self.error.send_replace(Some(message));
        }
        self.update_holds(|holds| holds.export = false);
    }

    fn update_holds(&self, update: impl FnOnce(&mut LoadingHolds)) {
        self.holds.send_modify(update);
        self.publish_loading();
    }

    fn publish_loading(&self) {
        let loading = self.holds.borrow().any();
        self.loading.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }

    pub fn items(&self) -> Vec<EmployeeRecord> {
        self.items.borrow().clone()
    }

    pub fn total(&self) -> u64 {
        *self.total.borrow()
    }

    pub fn departments(&self) -> Vec<String> {
        self.departments.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn is_exporting(&self) -> bool {
        self.holds.borrow().export
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn phase(&self) -> FetchPhase {
        *self.phase.borrow()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            items: self.items(),
            total: self.total(),
            departments: self.departments(),
            loading: self.is_loading(),
            error: self.error(),
            phase: self.phase(),
        }
    }

    pub fn subscribe_items(&self) -> watch::Receiver<Vec<EmployeeRecord>> {
        self.items.subscribe()
    }

    pub fn subscribe_total(&self) -> watch::Receiver<u64> {
        self.total.subscribe()
    }

    pub fn subscribe_departments(&self) -> watch::Receiver<Vec<String>> {
        self.departments.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<FetchPhase> {
        self.phase.subscribe()
    }

    pub async fn wait_until_idle(&self) {
        let mut loading = self.loading.subscribe();
        let _ = loading.wait_for(|loading| !*loading).await;
    }
}

#[cfg(test)]
#[path = "tests/bindings_tests.rs"]
mod tests;
