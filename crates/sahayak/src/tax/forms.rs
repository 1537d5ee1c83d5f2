//! ITR form selection from income sources and taxpayer category.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    pub age: Option<u32>,
    /// Resident, NRI, RNOR
    pub residential_status: Option<String>,
    /// Individual, HUF, Firm, Company
    pub taxpayer_category: Option<String>,
    #[serde(default)]
    pub income_type: Vec<String>,
    pub pan_number: Option<String>,
    #[serde(default = "default_financial_year")]
    pub financial_year: String,
}

fn default_financial_year() -> String {
    "2024-25".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeDetails {
    #[serde(default)]
    pub salary_income: f64,
    #[serde(default)]
    pub business_income: f64,
    #[serde(default)]
    pub capital_gains_short: f64,
    #[serde(default)]
    pub capital_gains_long: f64,
    #[serde(default)]
    pub rental_income: f64,
    #[serde(default)]
    pub other_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItrRecommendation {
    pub recommended_form: String,
    pub reason: String,
    pub alternative_forms: Vec<String>,
}

/// Pick the ITR form: ITR-1 for plain salaried individuals, ITR-2 once
/// capital gains or rental income appear, ITR-3 for business income.
pub fn select_form(profile: &TaxpayerProfile, income: &IncomeDetails) -> ItrRecommendation {
    let is_individual = profile.taxpayer_category.as_deref() == Some("Individual");

    if income.salary_income > 0.0
        && income.business_income == 0.0
        && income.capital_gains_short == 0.0
        && income.capital_gains_long == 0.0
        && income.rental_income == 0.0
        && is_individual
    {
        return ItrRecommendation {
            recommended_form: "ITR-1".to_string(),
            reason: "Suitable for salaried individuals with salary and interest income only"
                .to_string(),
            alternative_forms: vec![],
        };
    }

    if income.capital_gains_short > 0.0
        || income.capital_gains_long > 0.0
        || income.rental_income > 0.0
    {
        return ItrRecommendation {
            recommended_form: "ITR-2".to_string(),
            reason: "Required for capital gains, foreign income, or income from multiple properties"
                .to_string(),
            alternative_forms: vec![],
        };
    }

    if income.business_income > 0.0 {
        return ItrRecommendation {
            recommended_form: "ITR-3".to_string(),
            reason: "Required for income from business or profession".to_string(),
            alternative_forms: vec!["ITR-4".to_string()],
        };
    }

    ItrRecommendation {
        recommended_form: "ITR-1".to_string(),
        reason: "Based on provided information".to_string(),
        alternative_forms: vec!["ITR-2".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual() -> TaxpayerProfile {
        TaxpayerProfile {
            taxpayer_category: Some("Individual".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn plain_salaried_individual_gets_itr1() {
        let income = IncomeDetails {
            salary_income: 900_000.0,
            ..Default::default()
        };
        let rec = select_form(&individual(), &income);
        assert_eq!(rec.recommended_form, "ITR-1");
        assert!(rec.alternative_forms.is_empty());
    }

    #[test]
    fn capital_gains_force_itr2_even_for_salaried() {
        let income = IncomeDetails {
            salary_income: 900_000.0,
            capital_gains_long: 50_000.0,
            ..Default::default()
        };
        assert_eq!(select_form(&individual(), &income).recommended_form, "ITR-2");
    }

    #[test]
    fn rental_income_forces_itr2() {
        let income = IncomeDetails {
            rental_income: 240_000.0,
            ..Default::default()
        };
        assert_eq!(select_form(&individual(), &income).recommended_form, "ITR-2");
    }

    #[test]
    fn business_income_gets_itr3_with_itr4_alternative() {
        let income = IncomeDetails {
            business_income: 1_500_000.0,
            ..Default::default()
        };
        let rec = select_form(&individual(), &income);
        assert_eq!(rec.recommended_form, "ITR-3");
        assert_eq!(rec.alternative_forms, vec!["ITR-4".to_string()]);
    }

    #[test]
    fn salaried_huf_is_not_itr1() {
        let profile = TaxpayerProfile {
            taxpayer_category: Some("HUF".to_string()),
            ..Default::default()
        };
        let income = IncomeDetails {
            salary_income: 900_000.0,
            ..Default::default()
        };
        let rec = select_form(&profile, &income);
        assert_eq!(rec.recommended_form, "ITR-1");
        assert_eq!(rec.alternative_forms, vec!["ITR-2".to_string()]);
    }
}
