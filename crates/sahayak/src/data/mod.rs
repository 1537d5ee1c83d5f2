pub mod employees;
pub mod holidays;

pub use employees::{Employee, EmployeeDirectory};
pub use holidays::{Holiday, HolidayCalendar};

/// Startup data-file problems. These surface before any question is served;
/// the routing path itself never raises.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed employee record: {0}")]
    BadEmployeeRecord(#[from] csv::Error),
    #[error("malformed holiday file: {0}")]
    BadHolidayFile(#[from] serde_json::Error),
    #[error("holiday '{occasion}' has unparseable date '{date}' (expected d-Mon-yy)")]
    BadHolidayDate { occasion: String, date: String },
}

/// Render a numeric field without a trailing `.0` when it is integral,
/// matching how the reference data reads (salaries, experience years).
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
