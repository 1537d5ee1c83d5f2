//! Company holiday calendar loaded once at startup from JSON.
//!
//! The raw date string is preserved verbatim so answers echo the file's
//! `d-Mon-yy` text exactly; a parsed `NaiveDate` sits alongside for the
//! chronological scan. Records are not assumed to be date-sorted.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::DataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    pub occasion: String,
    /// Textual date as it appears in the data file, e.g. `26-Jan-26`.
    pub date: String,
    /// Weekday name as it appears in the data file.
    pub day: String,
}

#[derive(Debug, Deserialize)]
struct HolidayFile {
    holidays: Vec<Holiday>,
}

pub struct HolidayCalendar {
    holidays: Vec<Holiday>,
    dates: Vec<NaiveDate>,
    /// Whole-word, case-insensitive occasion matchers, one per record.
    name_patterns: Vec<Regex>,
    year: i32,
}

impl HolidayCalendar {
    pub fn new(holidays: Vec<Holiday>) -> Result<Self, DataError> {
        let mut dates = Vec::with_capacity(holidays.len());
        let mut name_patterns = Vec::with_capacity(holidays.len());

        for holiday in &holidays {
            let parsed = NaiveDate::parse_from_str(&holiday.date, "%d-%b-%y").map_err(|_| {
                DataError::BadHolidayDate {
                    occasion: holiday.occasion.clone(),
                    date: holiday.date.clone(),
                }
            })?;
            dates.push(parsed);

            let pattern = format!(r"\b{}\b", regex::escape(&holiday.occasion.to_lowercase()));
            // Escaped literal patterns cannot fail to compile.
            let re = Regex::new(&pattern).expect("occasion pattern is valid");
            name_patterns.push(re);
        }

        let year = dates.first().map(|d| d.year()).unwrap_or(0);
        tracing::info!(count = holidays.len(), year, "Loaded holiday calendar");

        Ok(Self {
            holidays,
            dates,
            name_patterns,
            year,
        })
    }

    pub fn from_json_path(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: HolidayFile = serde_json::from_str(&content)?;
        Self::new(file.holidays)
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holiday> {
        self.holidays.iter()
    }

    /// Year the calendar covers, taken from the first loaded record.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Earliest holiday on-or-after `today`. Stable scan in load order: a
    /// strict less-than comparison never replaces an equal date, so ties go
    /// to the first record encountered.
    pub fn upcoming(&self, today: NaiveDate) -> Option<&Holiday> {
        let mut best: Option<(usize, NaiveDate)> = None;
        for (idx, date) in self.dates.iter().enumerate() {
            if *date >= today {
                match best {
                    Some((_, best_date)) if *date < best_date => best = Some((idx, *date)),
                    None => best = Some((idx, *date)),
                    _ => {}
                }
            }
        }
        best.map(|(idx, _)| &self.holidays[idx])
    }

    /// First holiday (load order) whose occasion appears as a whole word in
    /// the already-lowercased question.
    pub fn find_named(&self, question_lower: &str) -> Option<&Holiday> {
        self.name_patterns
            .iter()
            .position(|re| re.is_match(question_lower))
            .map(|idx| &self.holidays[idx])
    }
}
