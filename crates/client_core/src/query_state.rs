use std::{sync::Arc, time::Duration};

use shared::domain::{ExportMode, PageSize, SortField, SortOrder};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;
use url::form_urlencoded;

use crate::debounce::Debouncer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryStateError {
    #[error("salary must be a number, got '{0}'")]
    InvalidSalary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Department,
    SalaryMin,
    SalaryMax,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub department: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageState {
    pub page_index: u32,
    pub page_size: PageSize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommittedQuery {
    pub filters: FilterState,
    pub sort: SortState,
    pub page: PageState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQueryParams {
    pub department: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: u32,
    pub per_page: PageSize,
}

impl DerivedQueryParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("department", self.department.clone()),
            ("salary_min", format_salary(self.salary_min)),
            ("salary_max", format_salary(self.salary_max)),
            ("sort_by", self.sort_by.as_wire().to_string()),
            ("sort_order", self.sort_order.as_wire().to_string()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.rows().to_string()),
        ]
    }

    pub fn query_string(&self) -> String {
        encode_pairs(&self.query_pairs())
    }
}

impl From<&CommittedQuery> for DerivedQueryParams {
    fn from(state: &CommittedQuery) -> Self {
        Self {
            department: state.filters.department.clone(),
            salary_min: state.filters.salary_min,
            salary_max: state.filters.salary_max,
            sort_by: state.sort.field,
            sort_order: state.sort.direction,
            page: state.page.page_index.saturating_add(1),
            per_page: state.page.page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    pub department: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub export_type: ExportMode,
}

impl ExportParams {
    pub fn new(state: &CommittedQuery, export_type: ExportMode) -> Self {
        Self {
            department: state.filters.department.clone(),
            salary_min: state.filters.salary_min,
            salary_max: state.filters.salary_max,
            sort_by: state.sort.field,
            sort_order: state.sort.direction,
            export_type,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("department", self.department.clone()),
            ("salary_min", format_salary(self.salary_min)),
            ("salary_max", format_salary(self.salary_max)),
            ("sort_by", self.sort_by.as_wire().to_string()),
            ("sort_order", self.sort_order.as_wire().to_string()),
            ("export_type", self.export_type.as_wire().to_string()),
        ]
    }
}

fn format_salary(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn encode_pairs(pairs: &[(&'static str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(key, value)| (*key, value.as_str())))
        .finish()
}

/// Parses the text of a salary input. Empty means "no bound"; the inputs
/// have a floor of zero, so negative amounts are raised to it.
pub fn parse_salary(raw: &str) -> Result<Option<f64>, QueryStateError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QueryStateError::InvalidSalary(raw.to_string()))?;
    Ok(Some(value.max(0.0)))
}

type SalaryBounds = (Option<f64>, Option<f64>);

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

pub struct QueryStateStore {
    draft: FilterState,
    committed: Arc<watch::Sender<CommittedQuery>>,
    salary: Debouncer<SalaryBounds>,
    export_mode: ExportMode,
}

impl QueryStateStore {
    pub fn new(debounce: Duration, page_size: PageSize) -> Self {
        let initial = CommittedQuery {
            page: PageState {
                page_index: 0,
                page_size,
            },
            ..CommittedQuery::default()
        };
        let (committed, _) = watch::channel(initial);
        let committed = Arc::new(committed);

        let salary = {
            let committed = Arc::clone(&committed);
            Debouncer::new(debounce, move |(min, max): SalaryBounds| {
                committed.send_if_modified(|q| {
                    let min_changed = replace(&mut q.filters.salary_min, min);
                    replace(&mut q.filters.salary_max, max) || min_changed
                });
                debug!(?min, ?max, "salary range settled");
            })
        };

        Self {
            draft: FilterState::default(),
            committed,
            salary,
            export_mode: ExportMode::default(),
        }
    }

    pub fn set_filter(&mut self, field: FilterField, value: &str) -> Result<(), QueryStateError> {
        match field {
            FilterField::Department => {
                let department = value.to_string();
                self.draft.department = department.clone();
                self.committed.send_if_modified(|q| {
                    let changed = replace(&mut q.filters.department, department);
                    replace(&mut q.page.page_index, 0) || changed
                });
            }
            FilterField::SalaryMin => {
                let min = parse_salary(value)?;
                self.draft.salary_min = min;
                if let (Some(min), Some(max)) = (min, self.draft.salary_max) {
                    if max < min {
                        self.draft.salary_max = Some(min);
                    }
                }
                self.push_salary();
            }
            FilterField::SalaryMax => {
                let mut max = parse_salary(value)?;
                if let (Some(min), Some(requested)) = (self.draft.salary_min, max) {
                    if requested < min {
                        max = Some(min);
                    }
                }
                self.draft.salary_max = max;
                self.push_salary();
            }
        }
        Ok(())
    }

    // Both bounds settle together so the committed range is always ordered.
    fn push_salary(&mut self) {
        self.salary
            .push((self.draft.salary_min, self.draft.salary_max));
    }

    pub fn set_sort(&mut self, field: SortField) {
        self.committed.send_modify(|q| {
            if q.sort.field == field {
                q.sort.direction = q.sort.direction.toggled();
            } else {
                q.sort = SortState {
                    field,
                    direction: SortOrder::Asc,
                };
            }
            q.page.page_index = 0;
        });
    }

    pub fn set_page(&mut self, page_index: u32) {
        self.committed
            .send_if_modified(|q| replace(&mut q.page.page_index, page_index));
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.committed.send_if_modified(|q| {
            let changed = replace(&mut q.page.page_size, page_size);
            replace(&mut q.page.page_index, 0) || changed
        });
    }

    pub fn set_export_mode(&mut self, mode: ExportMode) {
        self.export_mode = mode;
    }

    pub fn derive_params(&self) -> DerivedQueryParams {
        DerivedQueryParams::from(&*self.committed.borrow())
    }

    pub fn export_params(&self) -> ExportParams {
        ExportParams::new(&self.committed.borrow(), self.export_mode)
    }

    pub fn subscribe(&self) -> ParamsSubscription {
        ParamsSubscription {
            rx: self.committed.subscribe(),
            last: None,
        }
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    pub fn sort(&self) -> SortState {
        self.committed.borrow().sort
    }

    pub fn page(&self) -> PageState {
        self.committed.borrow().page
    }

    pub fn export_mode(&self) -> ExportMode {
        self.export_mode
    }

    pub fn has_pending_input(&self) -> bool {
        self.salary.is_pending()
    }

    pub fn debounce_window(&self) -> Duration {
        self.salary.delay()
    }

    pub fn cancel_pending(&mut self) {
        self.salary.cancel();
    }
}

/// Yields each distinct [`DerivedQueryParams`] by value, starting with the
/// current one.
pub struct ParamsSubscription {
    rx: watch::Receiver<CommittedQuery>,
    last: Option<DerivedQueryParams>,
}

impl ParamsSubscription {
    pub async fn next(&mut self) -> Option<DerivedQueryParams> {
        loop {
            if self.last.is_some() {
                self.rx.changed().await.ok()?;
            }
            let next = DerivedQueryParams::from(&*self.rx.borrow_and_update());
            if self.last.as_ref() != Some(&next) {
                self.last = Some(next.clone());
                return Some(next);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/query_state_tests.rs"]
mod tests;
