//! Predicate matchers: independent boolean tests deciding whether a
//! question belongs to one response category. All matchers take the
//! trimmed, lowercased question; each is cheap and side-effect free so the
//! rule table can probe them in priority order.

use regex::Regex;
use std::sync::LazyLock;

use crate::data::employees::SalaryCmp;

static SALARY_CMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(greater than|more than|above|less than|below|>|<)\s*(\d+)")
        .expect("salary comparison regex is valid")
});

/// Words that turn a "holiday" question into a list request.
const HOLIDAY_LIST_WORDS: [&str; 3] = ["list", "show", "what"];

/// Back-reference markers resolved against the conversation pointer.
/// Substring containment, matching the reference behavior.
const PRONOUNS: [&str; 5] = ["his", "her", "him", "he", "she"];

/// Vocabulary that sends an otherwise-unmatched question to the policy index.
const POLICY_VOCABULARY: [&str; 5] = ["policy", "leave", "break", "working hours", "attendance"];

/// A parsed salary-filter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryQuery {
    pub cmp: SalaryCmp,
    pub amount: i64,
    pub wants_list: bool,
}

/// Salary filter: requires the "salary" token plus a comparison phrase with
/// an integer amount. A non-parseable amount (e.g. overflow) means the
/// predicate does not match at all and the question falls through.
pub fn parse_salary_filter(q: &str) -> Option<SalaryQuery> {
    if !q.contains("salary") {
        return None;
    }
    let caps = SALARY_CMP_RE.captures(q)?;
    let amount: i64 = caps[2].parse().ok()?;
    let cmp = match &caps[1] {
        "greater than" | "more than" | "above" | ">" => SalaryCmp::GreaterThan,
        _ => SalaryCmp::LessThan,
    };
    Some(SalaryQuery {
        cmp,
        amount,
        wants_list: q.contains("list"),
    })
}

pub fn is_holiday_count(q: &str) -> bool {
    q.contains("holiday") && q.contains("how many")
}

pub fn is_holiday_list(q: &str) -> bool {
    q.contains("holiday") && HOLIDAY_LIST_WORDS.iter().any(|w| q.contains(w))
}

pub fn is_upcoming_holiday(q: &str) -> bool {
    q.contains("upcoming") && q.contains("holiday")
}

/// Strict full match; "how many employees are salaried" must NOT match.
pub fn is_exact_employee_count(q: &str) -> bool {
    q == "how many employees" || q == "how many employees?"
}

/// Purely-numeric whitespace tokens, in question order. Tokens that do not
/// fit an i64 are skipped rather than raised.
pub fn numeric_tokens(q: &str) -> impl Iterator<Item = i64> + '_ {
    q.split_whitespace()
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|t| t.parse().ok())
}

pub fn has_pronoun_reference(q: &str) -> bool {
    PRONOUNS.iter().any(|p| q.contains(p))
}

pub fn has_policy_vocabulary(q: &str) -> bool {
    POLICY_VOCABULARY.iter().any(|w| q.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_filter_parses_direction_and_amount() {
        let query = parse_salary_filter("how many employees have salary greater than 50000").unwrap();
        assert_eq!(query.cmp, SalaryCmp::GreaterThan);
        assert_eq!(query.amount, 50000);
        assert!(!query.wants_list);

        let query = parse_salary_filter("list employees with salary below 40000").unwrap();
        assert_eq!(query.cmp, SalaryCmp::LessThan);
        assert!(query.wants_list);

        let query = parse_salary_filter("salary > 60000").unwrap();
        assert_eq!(query.cmp, SalaryCmp::GreaterThan);
    }

    #[test]
    fn salary_filter_requires_both_token_and_comparison() {
        assert!(parse_salary_filter("employees greater than 50000").is_none());
        assert!(parse_salary_filter("what is the salary of rahul").is_none());
    }

    #[test]
    fn overflowing_amount_does_not_match() {
        let q = "salary greater than 99999999999999999999999999";
        assert!(parse_salary_filter(q).is_none());
    }

    #[test]
    fn exact_employee_count_is_a_full_match() {
        assert!(is_exact_employee_count("how many employees"));
        assert!(is_exact_employee_count("how many employees?"));
        assert!(!is_exact_employee_count("how many employees are there in total"));
        assert!(!is_exact_employee_count("how many employees are salaried"));
    }

    #[test]
    fn numeric_tokens_skip_mixed_words() {
        let tokens: Vec<i64> = numeric_tokens("show 101 and emp102 then 205").collect();
        assert_eq!(tokens, vec![101, 205]);
    }

    #[test]
    fn pronoun_test_is_substring_containment() {
        assert!(has_pronoun_reference("what is her salary"));
        assert!(has_pronoun_reference("what does he do"));
        // Inherited quirk: "the" contains "he".
        assert!(has_pronoun_reference("what is the salary"));
        assert!(!has_pronoun_reference("salary of 101"));
    }

    #[test]
    fn policy_vocabulary_detects_multiword_phrases() {
        assert!(has_policy_vocabulary("what are the working hours on friday"));
        assert!(has_policy_vocabulary("maternity leave rules"));
        assert!(!has_policy_vocabulary("who is rahul verma"));
    }
}
