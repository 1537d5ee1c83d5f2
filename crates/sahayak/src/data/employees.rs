//! Employee roster loaded once at startup from CSV.
//!
//! The collection is a read-only ordered sequence; all lookups scan in load
//! order so that first-match-wins semantics are deterministic.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::DataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "Emp_ID")]
    pub id: i64,
    #[serde(rename = "Emp_Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Salary")]
    pub salary: f64,
    #[serde(rename = "Designation")]
    pub designation: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone_Number")]
    pub phone: String,
    #[serde(rename = "Experience_Years")]
    pub experience_years: f64,
}

/// Direction of a salary comparison extracted from a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryCmp {
    GreaterThan,
    LessThan,
}

pub struct EmployeeDirectory {
    employees: Vec<Employee>,
}

impl EmployeeDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut employees = Vec::new();
        for record in csv_reader.deserialize() {
            employees.push(record?);
        }
        tracing::info!(count = employees.len(), "Loaded employee roster");
        Ok(Self::new(employees))
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter()
    }

    pub fn by_id(&self, id: i64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// First employee (load order) whose lowercased name appears as a
    /// substring of the already-lowercased question. Load order wins even
    /// when a later name would be a longer/more specific match.
    pub fn first_name_match(&self, question_lower: &str) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| question_lower.contains(&e.name.to_lowercase()))
    }

    /// Employees whose salary is strictly above/below `amount`, load order.
    pub fn filter_by_salary(&self, cmp: SalaryCmp, amount: i64) -> Vec<&Employee> {
        let amount = amount as f64;
        self.employees
            .iter()
            .filter(|e| match cmp {
                SalaryCmp::GreaterThan => e.salary > amount,
                SalaryCmp::LessThan => e.salary < amount,
            })
            .collect()
    }
}
