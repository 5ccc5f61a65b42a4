use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseDomainError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseDomainError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    EmployeeId,
    FirstName,
    LastName,
    Email,
    Salary,
    HireDate,
    IsManager,
    PerformanceRating,
    #[serde(rename = "department_name")]
    Department,
    DepartmentBudget,
    ProjectsCount,
}

impl SortField {
    pub const ALL: [SortField; 11] = [
        SortField::EmployeeId,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::Salary,
        SortField::HireDate,
        SortField::IsManager,
        SortField::PerformanceRating,
        SortField::Department,
        SortField::DepartmentBudget,
        SortField::ProjectsCount,
    ];

    /// Column name accepted by the backend's `sort_by` parameter.
    pub fn as_wire(self) -> &'static str {
        match self {
            SortField::EmployeeId => "employee_id",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::Email => "email",
            SortField::Salary => "salary",
            SortField::HireDate => "hire_date",
            SortField::IsManager => "is_manager",
            SortField::PerformanceRating => "performance_rating",
            SortField::Department => "department_name",
            SortField::DepartmentBudget => "department_budget",
            SortField::ProjectsCount => "projects_count",
        }
    }
}

impl FromStr for SortField {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle == "department" {
            return Ok(SortField::Department);
        }
        SortField::ALL
            .into_iter()
            .find(|field| field.as_wire() == needle)
            .ok_or_else(|| ParseDomainError::new("sort column", s))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_wire(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Twenty, PageSize::Fifty];

    pub fn rows(self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
        }
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.rows()
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ParseDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.rows() == value)
            .ok_or_else(|| ParseDomainError::new("page size", &value.to_string()))
    }
}

impl FromStr for PageSize {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseDomainError::new("page size", s))?;
        PageSize::try_from(rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    #[default]
    Filtered,
    All,
}

impl ExportMode {
    pub fn as_wire(self) -> &'static str {
        match self {
            ExportMode::Filtered => "filtered",
            ExportMode::All => "all",
        }
    }
}

impl FromStr for ExportMode {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "filtered" => Ok(ExportMode::Filtered),
            "all" => Ok(ExportMode::All),
            _ => Err(ParseDomainError::new("export mode", s)),
        }
    }
}

/// A row of the employee table. Only the identity is interpreted; every other
/// column is carried through as the backend sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: EmployeeId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl EmployeeRecord {
    pub fn attribute(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }
}
