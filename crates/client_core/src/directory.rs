use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use shared::{
    error::{ApiError, ApiException},
    protocol::ListResult,
};
use tracing::{debug, warn};

use crate::{
    config::ClientSettings,
    error::DirectoryError,
    query_state::{DerivedQueryParams, ExportParams},
};

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn list_employees(
        &self,
        params: &DerivedQueryParams,
    ) -> Result<ListResult, DirectoryError>;
    async fn export_employees(&self, params: &ExportParams) -> Result<Vec<u8>, DirectoryError>;
}

pub struct HttpEmployeeDirectory {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEmployeeDirectory {
    pub fn new(settings: &ClientSettings) -> Result<Self, DirectoryError> {
        let timeout = settings.request_timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url().to_string(),
            timeout,
        })
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Response, DirectoryError> {
        let res = self
            .http
            .get(format!("{}/{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = match res.bytes().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status = status.as_u16(), "failed to read error body: {err}");
                Default::default()
            }
        };
        match ApiError::message_from_body(&body) {
            Some(message) => Err(ApiException::new(status.as_u16(), message).into()),
            None => Err(DirectoryError::Status {
                status: status.as_u16(),
            }),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> DirectoryError {
        if err.is_timeout() {
            DirectoryError::Timeout(self.timeout)
        } else {
            DirectoryError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl EmployeeDirectory for HttpEmployeeDirectory {
    async fn list_employees(
        &self,
        params: &DerivedQueryParams,
    ) -> Result<ListResult, DirectoryError> {
        let body = self
            .get("employees", &params.query_pairs())
            .await?
            .bytes()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let value = match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(err) => {
                warn!("list: response body is not json, showing empty page: {err}");
                return Ok(ListResult::default());
            }
        };
        let (result, skipped) = ListResult::from_value(value);
        if skipped > 0 {
            warn!(skipped, "list: dropped rows without employee_id");
        }
        Ok(result)
    }

    async fn export_employees(&self, params: &ExportParams) -> Result<Vec<u8>, DirectoryError> {
        let bytes = self
            .get("export", &params.query_pairs())
            .await?
            .bytes()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
