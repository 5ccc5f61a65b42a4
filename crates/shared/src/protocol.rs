use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::EmployeeRecord;

pub const EXPORT_FILENAME: &str = "employees.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub items: Vec<EmployeeRecord>,
    pub total: u64,
    pub departments: Option<Vec<String>>,
}

impl ListResult {
    /// Lenient decode of a list body. Anything that does not look like an
    /// envelope becomes an empty page; rows without a usable `employee_id`
    /// are dropped individually.
    pub fn from_value(value: Value) -> (Self, usize) {
        let Value::Object(mut body) = value else {
            return (Self::default(), 0);
        };

        let mut skipped = 0;
        let items = match body.remove("data") {
            Some(Value::Array(rows)) => rows
                .into_iter()
                .filter_map(|row| match serde_json::from_value::<EmployeeRecord>(row) {
                    Ok(record) => Some(record),
                    Err(_) => {
                        skipped += 1;
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        let meta = body
            .remove("meta")
            .and_then(|meta| serde_json::from_value::<ListMeta>(meta).ok())
            .unwrap_or_default();

        (
            Self {
                items,
                total: meta.total,
                departments: meta.departments,
            },
            skipped,
        )
    }
}
