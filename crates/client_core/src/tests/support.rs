use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Map;
use shared::{
    domain::{EmployeeId, EmployeeRecord},
    protocol::ListResult,
};
use tokio::sync::oneshot;

use crate::{
    directory::EmployeeDirectory,
    error::DirectoryError,
    export::FileSaver,
    query_state::{DerivedQueryParams, ExportParams},
};

type ListReply = oneshot::Sender<Result<ListResult, DirectoryError>>;
type ExportReply = oneshot::Sender<Result<Vec<u8>, DirectoryError>>;

/// Directory whose calls stay pending until the test answers them, in
/// whatever order it likes.
#[derive(Default)]
pub(crate) struct ScriptedDirectory {
    lists: Mutex<Vec<(DerivedQueryParams, Option<ListReply>)>>,
    exports: Mutex<Vec<(ExportParams, Option<ExportReply>)>>,
}

impl ScriptedDirectory {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn list_requests(&self) -> Vec<DerivedQueryParams> {
        self.lists
            .lock()
            .expect("lock")
            .iter()
            .map(|(params, _)| params.clone())
            .collect()
    }

    pub(crate) fn export_requests(&self) -> Vec<ExportParams> {
        self.exports
            .lock()
            .expect("lock")
            .iter()
            .map(|(params, _)| params.clone())
            .collect()
    }

    /// Answers the `index`-th list call (0-based, in issuance order).
    pub(crate) fn reply_list(&self, index: usize, result: Result<ListResult, DirectoryError>) {
        let reply = self.lists.lock().expect("lock")[index]
            .1
            .take()
            .expect("list call already answered");
        let _ = reply.send(result);
    }

    pub(crate) fn reply_export(&self, index: usize, result: Result<Vec<u8>, DirectoryError>) {
        let reply = self.exports.lock().expect("lock")[index]
            .1
            .take()
            .expect("export call already answered");
        let _ = reply.send(result);
    }
}

#[async_trait]
impl EmployeeDirectory for ScriptedDirectory {
    async fn list_employees(
        &self,
        params: &DerivedQueryParams,
    ) -> Result<ListResult, DirectoryError> {
        let (tx, rx) = oneshot::channel();
        self.lists
            .lock()
            .expect("lock")
            .push((params.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(DirectoryError::Transport("reply dropped".into())))
    }

    async fn export_employees(&self, params: &ExportParams) -> Result<Vec<u8>, DirectoryError> {
        let (tx, rx) = oneshot::channel();
        self.exports
            .lock()
            .expect("lock")
            .push((params.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(DirectoryError::Transport("reply dropped".into())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SavedFile {
    pub payload: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

#[derive(Default)]
pub(crate) struct RecordingSaver {
    saved: Mutex<Vec<SavedFile>>,
    fail_with: Option<String>,
}

impl RecordingSaver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        })
    }

    pub(crate) fn saved(&self) -> Vec<SavedFile> {
        self.saved.lock().expect("lock").clone()
    }
}

#[async_trait]
impl FileSaver for RecordingSaver {
    async fn save(&self, payload: &[u8], filename: &str, content_type: &str) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!(message.clone()));
        }
        self.saved.lock().expect("lock").push(SavedFile {
            payload: payload.to_vec(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }
}

pub(crate) fn employee(id: i64, first_name: &str) -> EmployeeRecord {
    let mut attributes = Map::new();
    attributes.insert("first_name".into(), first_name.into());
    EmployeeRecord {
        employee_id: EmployeeId(id),
        attributes,
    }
}

pub(crate) fn page_of(ids: &[i64], total: u64) -> ListResult {
    ListResult {
        items: ids
            .iter()
            .map(|id| employee(*id, &format!("employee-{id}")))
            .collect(),
        total,
        departments: Some(vec!["IT".into(), "Sales".into()]),
    }
}

pub(crate) fn ids(items: &[EmployeeRecord]) -> Vec<i64> {
    items.iter().map(|record| record.employee_id.0).collect()
}

/// Lets spawned tasks run until they block again.
pub(crate) async fn flush() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
