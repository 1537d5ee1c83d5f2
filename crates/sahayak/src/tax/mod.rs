//! Rule-based Indian income-tax engine, FY 2024-25 (AY 2025-26).
//!
//! Slab arithmetic, §87A rebate, the 4% health-and-education cess, and the
//! old-vs-new regime comparison. Deterministic; the conversational layer
//! lives in [`advisor`].

pub mod advisor;
pub mod forms;
pub mod knowledge;

use serde::{Deserialize, Serialize};

/// Standard deduction available to salaried individuals in both regimes.
pub const STANDARD_DEDUCTION: f64 = 50_000.0;

/// (slab width, rate) pairs walked in order from the first rupee.
pub const NEW_REGIME_SLABS: [(f64, f64); 6] = [
    (300_000.0, 0.0),
    (300_000.0, 0.05),
    (300_000.0, 0.10),
    (300_000.0, 0.15),
    (300_000.0, 0.20),
    (f64::INFINITY, 0.30),
];

pub const OLD_REGIME_SLABS: [(f64, f64); 4] = [
    (250_000.0, 0.0),
    (250_000.0, 0.05),
    (500_000.0, 0.20),
    (f64::INFINITY, 0.30),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    New,
    Old,
}

/// Chapter VI-A deductions plus home-loan interest (§24b).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deductions {
    #[serde(default)]
    pub section_80c: f64,
    #[serde(default)]
    pub section_80d: f64,
    #[serde(default)]
    pub section_80e: f64,
    #[serde(default)]
    pub section_80g: f64,
    #[serde(default)]
    pub section_80tta: f64,
    #[serde(default)]
    pub home_loan_interest: f64,
}

impl Deductions {
    pub fn total(&self) -> f64 {
        self.section_80c
            + self.section_80d
            + self.section_80e
            + self.section_80g
            + self.section_80tta
            + self.home_loan_interest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub base_tax: f64,
    pub rebate_87a: f64,
    pub tax_after_rebate: f64,
    pub cess: f64,
    pub total_tax: f64,
    /// Tax charged per slab, in slab order, only for slabs actually reached.
    pub slab_amounts: Vec<f64>,
}

pub fn calculate_tax(taxable_income: f64, regime: Regime) -> TaxBreakdown {
    let slabs: &[(f64, f64)] = match regime {
        Regime::New => &NEW_REGIME_SLABS,
        Regime::Old => &OLD_REGIME_SLABS,
    };

    let mut tax = 0.0;
    let mut remaining = taxable_income;
    let mut slab_amounts = Vec::new();

    for &(width, rate) in slabs {
        if remaining <= 0.0 {
            break;
        }
        let taxable_in_slab = remaining.min(width);
        let tax_in_slab = taxable_in_slab * rate;
        tax += tax_in_slab;
        slab_amounts.push(tax_in_slab);
        remaining -= taxable_in_slab;
    }

    // Rebate u/s 87A
    let rebate_87a = match regime {
        Regime::New if taxable_income <= 700_000.0 => tax.min(25_000.0),
        Regime::Old if taxable_income <= 500_000.0 => tax.min(12_500.0),
        _ => 0.0,
    };

    let tax_after_rebate = (tax - rebate_87a).max(0.0);
    // Health and Education Cess (4%)
    let cess = tax_after_rebate * 0.04;

    TaxBreakdown {
        base_tax: tax,
        rebate_87a,
        tax_after_rebate,
        cess,
        total_tax: tax_after_rebate + cess,
        slab_amounts,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeRecommendation {
    pub recommended: Regime,
    pub old_regime_tax: f64,
    pub new_regime_tax: f64,
    pub savings: f64,
    pub old_details: TaxBreakdown,
    pub new_details: TaxBreakdown,
}

/// Compare both regimes for the given gross income. The old regime applies
/// itemized deductions plus the standard deduction; the new regime only the
/// standard deduction. Ties go to the new regime.
pub fn recommend_regime(gross_income: f64, deductions: &Deductions) -> RegimeRecommendation {
    let old_taxable = (gross_income - deductions.total() - STANDARD_DEDUCTION).max(0.0);
    let new_taxable = (gross_income - STANDARD_DEDUCTION).max(0.0);

    let old_details = calculate_tax(old_taxable, Regime::Old);
    let new_details = calculate_tax(new_taxable, Regime::New);

    let recommended = if new_details.total_tax <= old_details.total_tax {
        Regime::New
    } else {
        Regime::Old
    };

    RegimeRecommendation {
        recommended,
        old_regime_tax: old_details.total_tax,
        new_regime_tax: new_details.total_tax,
        savings: (new_details.total_tax - old_details.total_tax).abs(),
        old_details,
        new_details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn new_regime_ten_lakh_walks_four_slabs() {
        let result = calculate_tax(1_000_000.0, Regime::New);
        assert_close(result.base_tax, 60_000.0);
        assert_eq!(result.slab_amounts, vec![0.0, 15_000.0, 30_000.0, 15_000.0]);
        assert_close(result.rebate_87a, 0.0);
        assert_close(result.cess, 2_400.0);
        assert_close(result.total_tax, 62_400.0);
    }

    #[test]
    fn new_regime_rebate_zeroes_tax_up_to_seven_lakh() {
        let result = calculate_tax(700_000.0, Regime::New);
        assert_close(result.base_tax, 25_000.0);
        assert_close(result.rebate_87a, 25_000.0);
        assert_close(result.total_tax, 0.0);

        // One rupee over the threshold loses the rebate entirely.
        let result = calculate_tax(700_001.0, Regime::New);
        assert_close(result.rebate_87a, 0.0);
        assert!(result.total_tax > 25_000.0);
    }

    #[test]
    fn old_regime_rebate_zeroes_tax_up_to_five_lakh() {
        let result = calculate_tax(500_000.0, Regime::Old);
        assert_close(result.base_tax, 12_500.0);
        assert_close(result.rebate_87a, 12_500.0);
        assert_close(result.total_tax, 0.0);
    }

    #[test]
    fn old_regime_ten_lakh() {
        let result = calculate_tax(1_000_000.0, Regime::Old);
        assert_close(result.base_tax, 112_500.0);
        assert_close(result.cess, 4_500.0);
        assert_close(result.total_tax, 117_000.0);
    }

    #[test]
    fn zero_and_negative_income_owe_nothing() {
        assert_close(calculate_tax(0.0, Regime::New).total_tax, 0.0);
        assert!(calculate_tax(0.0, Regime::Old).slab_amounts.is_empty());
    }

    #[test]
    fn light_deductions_favour_the_new_regime() {
        let deductions = Deductions {
            section_80c: 150_000.0,
            section_80d: 25_000.0,
            ..Default::default()
        };
        let rec = recommend_regime(1_200_000.0, &deductions);
        assert_eq!(rec.recommended, Regime::New);
        assert_close(rec.savings, rec.old_regime_tax - rec.new_regime_tax);
    }

    #[test]
    fn heavy_deductions_favour_the_old_regime() {
        let deductions = Deductions {
            section_80c: 150_000.0,
            section_80d: 50_000.0,
            home_loan_interest: 200_000.0,
            ..Default::default()
        };
        let rec = recommend_regime(1_000_000.0, &deductions);
        assert_eq!(rec.recommended, Regime::Old);
        assert!(rec.old_regime_tax < rec.new_regime_tax);
    }

    #[test]
    fn deductions_never_push_taxable_below_zero() {
        let deductions = Deductions {
            section_80c: 150_000.0,
            home_loan_interest: 200_000.0,
            ..Default::default()
        };
        let rec = recommend_regime(100_000.0, &deductions);
        assert_close(rec.old_regime_tax, 0.0);
        assert_close(rec.new_regime_tax, 0.0);
        assert_eq!(rec.recommended, Regime::New);
    }
}
