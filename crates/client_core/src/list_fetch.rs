use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::protocol::ListResult;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    bindings::TableBindings,
    directory::EmployeeDirectory,
    error::DirectoryError,
    query_state::{DerivedQueryParams, ParamsSubscription},
};

const LIST_FAILURE_FALLBACK: &str = "Failed to load employees";

// Completions are applied only for the latest epoch; nothing is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestEpoch(pub u64);

impl fmt::Display for RequestEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Default)]
struct EpochState {
    latest: RequestEpoch,
    last_issued: Option<DerivedQueryParams>,
}

pub struct ListFetchOrchestrator {
    directory: Arc<dyn EmployeeDirectory>,
    bindings: Arc<TableBindings>,
    state: Mutex<EpochState>,
    closed: AtomicBool,
}

impl ListFetchOrchestrator {
    pub fn new(directory: Arc<dyn EmployeeDirectory>, bindings: Arc<TableBindings>) -> Arc<Self> {
        Arc::new(Self {
            directory,
            bindings,
            state: Mutex::new(EpochState::default()),
            closed: AtomicBool::new(false),
        })
    }

    pub async fn on_params_changed(
        self: &Arc<Self>,
        params: DerivedQueryParams,
    ) -> Option<RequestEpoch> {
        {
            let guard = self.state.lock().await;
            if guard.last_issued.as_ref() == Some(&params) {
                debug!(epoch = %guard.latest, "list: params unchanged, not refetching");
                return None;
            }
        }
        self.issue(params).await
    }

    pub async fn issue(self: &Arc<Self>, params: DerivedQueryParams) -> Option<RequestEpoch> {
        let epoch = {
            let mut guard = self.state.lock().await;
            if self.is_closed() {
                return None;
            }
            guard.latest = RequestEpoch(guard.latest.0 + 1);
            guard.last_issued = Some(params.clone());
            self.bindings.begin_list();
            guard.latest
        };

        debug!(%epoch, query = %params.query_string(), "list: issuing query");

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let result = orchestrator.directory.list_employees(&params).await;
            orchestrator.complete(epoch, result).await;
        });

        Some(epoch)
    }

    /// Applies a completion if it belongs to the latest epoch. Returns whether
    /// it was applied.
    pub async fn complete(
        &self,
        epoch: RequestEpoch,
        result: Result<ListResult, DirectoryError>,
    ) -> bool {
        let guard = self.state.lock().await;
        let closed = self.is_closed();
        if closed || epoch != guard.latest {
            debug!(
                %epoch,
                latest = %guard.latest,
                closed,
                "list: discarding stale response"
            );
            return false;
        }

        match result {
            Ok(page) => {
                info!(
                    %epoch,
                    rows = page.items.len(),
                    total = page.total,
                    "list: applied response"
                );
                self.bindings.apply_list_success(page);
            }
            Err(err) => {
                warn!(%epoch, "list: query failed: {err}");
                self.bindings
                    .apply_list_failure(err.user_message(LIST_FAILURE_FALLBACK));
            }
        }
        true
    }

    pub fn bind(self: &Arc<Self>, mut subscription: ParamsSubscription) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(params) = subscription.next().await {
                if orchestrator.on_params_changed(params).await.is_none()
                    && orchestrator.is_closed()
                {
                    break;
                }
            }
            debug!("list: params subscription finished");
        })
    }

    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.bindings.release_list();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn latest_epoch(&self) -> RequestEpoch {
        self.state.lock().await.latest
    }

    pub async fn last_issued(&self) -> Option<DerivedQueryParams> {
        self.state.lock().await.last_issued.clone()
    }

    pub fn bindings(&self) -> &Arc<TableBindings> {
        &self.bindings
    }
}

#[cfg(test)]
#[path = "tests/list_fetch_tests.rs"]
mod tests;
