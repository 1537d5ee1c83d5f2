//! Priority-ordered question router.
//!
//! Questions are probed against a fixed, data-driven rule table; the first
//! rule whose predicate matches wins and the ordering itself is part of the
//! contract (structured, unambiguous signals before loose substring
//! heuristics, with the semantic fallback last). A matched rule may still
//! decline to answer (an upcoming-holiday question with no future holiday,
//! a numeric token that resolves to no employee), in which case
//! evaluation continues down the table.

pub mod fields;
pub mod matchers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{format_number, EmployeeDirectory, HolidayCalendar};
use crate::session::ConversationState;
use crate::types::{Answer, PolicyHit};

use fields::field_response;
use matchers::SalaryQuery;

/// Similarity search over the pre-built policy index. The production
/// implementation embeds the query and asks LanceDB; tests stub it.
#[async_trait]
pub trait PolicySearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<PolicyHit>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    SalaryFilter,
    HolidayCount,
    HolidayList,
    UpcomingHoliday,
    NamedHoliday,
    EmployeeCount,
    EmployeeById,
    EmployeeByName,
    PronounFollowUp,
    PolicyFallback,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Self::SalaryFilter => "salary_filter",
            Self::HolidayCount => "holiday_count",
            Self::HolidayList => "holiday_list",
            Self::UpcomingHoliday => "upcoming_holiday",
            Self::NamedHoliday => "named_holiday",
            Self::EmployeeCount => "employee_count",
            Self::EmployeeById => "employee_by_id",
            Self::EmployeeByName => "employee_by_name",
            Self::PronounFollowUp => "pronoun_follow_up",
            Self::PolicyFallback => "policy_fallback",
        }
    }
}

/// The routing priority contract. Changing this order changes observable
/// behavior; see the ordering tests before touching it.
pub const RULE_ORDER: [Rule; 10] = [
    Rule::SalaryFilter,
    Rule::HolidayCount,
    Rule::HolidayList,
    Rule::UpcomingHoliday,
    Rule::NamedHoliday,
    Rule::EmployeeCount,
    Rule::EmployeeById,
    Rule::EmployeeByName,
    Rule::PronounFollowUp,
    Rule::PolicyFallback,
];

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub answer: Answer,
    /// The rule that produced the answer; `None` means the catch-all fired.
    pub rule: Option<Rule>,
}

pub struct Router {
    employees: Arc<EmployeeDirectory>,
    holidays: Arc<HolidayCalendar>,
    policies: Arc<dyn PolicySearch>,
    fallback_k: usize,
}

impl Router {
    pub fn new(
        employees: Arc<EmployeeDirectory>,
        holidays: Arc<HolidayCalendar>,
        policies: Arc<dyn PolicySearch>,
        fallback_k: usize,
    ) -> Self {
        Self {
            employees,
            holidays,
            policies,
            fallback_k,
        }
    }

    /// Route one question. Pure in `(question, state)`: the only mutation is
    /// the conversation pointer inside `state`, written on unambiguous
    /// ID/name resolution. Never fails: malformed input falls through to
    /// the catch-all and infrastructure errors degrade to no-answer.
    pub async fn route(&self, question: &str, state: &mut ConversationState) -> RouteOutcome {
        let q = question.trim().to_lowercase();

        for rule in RULE_ORDER {
            if let Some(answer) = self.apply(rule, &q, question, state).await {
                tracing::debug!(rule = rule.name(), "Routed question");
                return RouteOutcome {
                    answer,
                    rule: Some(rule),
                };
            }
        }

        tracing::debug!("No rule matched, returning no-answer");
        RouteOutcome {
            answer: Answer::NoAnswer,
            rule: None,
        }
    }

    async fn apply(
        &self,
        rule: Rule,
        q: &str,
        question: &str,
        state: &mut ConversationState,
    ) -> Option<Answer> {
        match rule {
            Rule::SalaryFilter => self.salary_filter(matchers::parse_salary_filter(q)?),
            Rule::HolidayCount => self.holiday_count(q),
            Rule::HolidayList => self.holiday_list(q),
            Rule::UpcomingHoliday => self.upcoming_holiday(q),
            Rule::NamedHoliday => self.named_holiday(q),
            Rule::EmployeeCount => self.employee_count(q),
            Rule::EmployeeById => self.employee_by_id(q, state),
            Rule::EmployeeByName => self.employee_by_name(q, state),
            Rule::PronounFollowUp => self.pronoun_follow_up(q, state),
            Rule::PolicyFallback => self.policy_fallback(q, question).await,
        }
    }

    fn salary_filter(&self, query: SalaryQuery) -> Option<Answer> {
        let matched = self.employees.filter_by_salary(query.cmp, query.amount);

        if query.wants_list {
            if matched.is_empty() {
                return Some(Answer::structured("No employees found."));
            }
            let names = matched
                .iter()
                .map(|e| format!("{} - {}", e.name, format_number(e.salary)))
                .collect::<Vec<_>>()
                .join("\n");
            return Some(Answer::structured(format!(
                "Employees matching salary condition:\n{}",
                names
            )));
        }

        Some(Answer::structured(format!(
            "{} employees match the salary condition.",
            matched.len()
        )))
    }

    fn holiday_count(&self, q: &str) -> Option<Answer> {
        if !matchers::is_holiday_count(q) {
            return None;
        }
        Some(Answer::structured(format!(
            "There are {} holidays in {}.",
            self.holidays.len(),
            self.holidays.year()
        )))
    }

    fn holiday_list(&self, q: &str) -> Option<Answer> {
        if !matchers::is_holiday_list(q) {
            return None;
        }
        let listing = self
            .holidays
            .iter()
            .map(|h| format!("{} - {} ({})", h.occasion, h.date, h.day))
            .collect::<Vec<_>>()
            .join("\n");
        Some(Answer::structured(format!(
            "Here are the company holidays:\n{}",
            listing
        )))
    }

    fn upcoming_holiday(&self, q: &str) -> Option<Answer> {
        if !matchers::is_upcoming_holiday(q) {
            return None;
        }
        // No qualifying future holiday: decline and let evaluation continue
        // down the table (compatibility with the reference behavior).
        let today = chrono::Local::now().date_naive();
        let upcoming = self.holidays.upcoming(today)?;
        Some(Answer::structured(format!(
            "Upcoming holiday is {} on {} ({}).",
            upcoming.occasion, upcoming.date, upcoming.day
        )))
    }

    fn named_holiday(&self, q: &str) -> Option<Answer> {
        let holiday = self.holidays.find_named(q)?;
        Some(Answer::structured(format!(
            "{} is on {} ({}).",
            holiday.occasion, holiday.date, holiday.day
        )))
    }

    fn employee_count(&self, q: &str) -> Option<Answer> {
        if !matchers::is_exact_employee_count(q) {
            return None;
        }
        Some(Answer::structured(format!(
            "There are {} employees.",
            self.employees.len()
        )))
    }

    fn employee_by_id(&self, q: &str, state: &mut ConversationState) -> Option<Answer> {
        for id in matchers::numeric_tokens(q) {
            if let Some(employee) = self.employees.by_id(id) {
                state.last_employee = Some(employee.clone());
                return Some(Answer::structured(field_response(employee, q)));
            }
        }
        None
    }

    fn employee_by_name(&self, q: &str, state: &mut ConversationState) -> Option<Answer> {
        let employee = self.employees.first_name_match(q)?;
        state.last_employee = Some(employee.clone());
        Some(Answer::structured(field_response(employee, q)))
    }

    fn pronoun_follow_up(&self, q: &str, state: &mut ConversationState) -> Option<Answer> {
        let employee = state.last_employee.as_ref()?;
        if !matchers::has_pronoun_reference(q) {
            return None;
        }
        // Read-only: the pointer is never updated here.
        Some(Answer::structured(field_response(employee, q)))
    }

    async fn policy_fallback(&self, q: &str, question: &str) -> Option<Answer> {
        if !matchers::has_policy_vocabulary(q) {
            return None;
        }

        // The raw, unlowercased question goes to the index; the
        // embedding model is case-sensitive.
        let hits = match self.policies.search(question, self.fallback_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "Policy search failed, degrading to no-answer");
                return Some(Answer::NoAnswer);
            }
        };

        let context = hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if context.is_empty() {
            return Some(Answer::NoAnswer);
        }

        tracing::debug!(passages = hits.len(), "Policy fallback assembled context");
        Some(Answer::Semantic { context })
    }
}
