//! Field-response formatter for employee-scoped questions.

use crate::data::{format_number, Employee};
use crate::types::NO_ANSWER_TEXT;

/// Build a templated sentence for the first field keyword found in the
/// question. The test order is fixed and is part of the contract: a
/// question containing both "salary" and "email" resolves to salary
/// because salary is tested first.
pub fn field_response(employee: &Employee, question_lower: &str) -> String {
    let q = question_lower;

    if q.contains("age") {
        return format!("{} is {} years old.", employee.name, employee.age);
    }
    if q.contains("gender") {
        return format!("{} is {}.", employee.name, employee.gender);
    }
    if q.contains("salary") {
        return format!(
            "{}'s salary is {}.",
            employee.name,
            format_number(employee.salary)
        );
    }
    if q.contains("designation") {
        return format!("{} works as {}.", employee.name, employee.designation);
    }
    if q.contains("email") {
        return format!("{}'s email is {}.", employee.name, employee.email);
    }
    if q.contains("phone") {
        return format!("{}'s phone number is {}.", employee.name, employee.phone);
    }
    if q.contains("experience") {
        return format!(
            "{} has {} years of experience.",
            employee.name,
            format_number(employee.experience_years)
        );
    }
    if q.contains("details") || q.contains("who is") {
        return format!(
            "{} is a {} with {} years of experience. Salary: {}.",
            employee.name,
            employee.designation,
            format_number(employee.experience_years),
            format_number(employee.salary)
        );
    }

    NO_ANSWER_TEXT.to_string()
}
