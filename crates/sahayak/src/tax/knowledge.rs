//! Knowledge-base text embedded in the tax advisor's system prompt.

pub const TAX_KNOWLEDGE_BASE: &str = r#"# Indian Income Tax Knowledge Base

## Tax Slabs FY 2024-25 (AY 2025-26)

### New Tax Regime:
- Rs 0 to Rs 3,00,000: Nil
- Rs 3,00,001 to Rs 6,00,000: 5%
- Rs 6,00,001 to Rs 9,00,000: 10%
- Rs 9,00,001 to Rs 12,00,000: 15%
- Rs 12,00,001 to Rs 15,00,000: 20%
- Above Rs 15,00,000: 30%

### Old Tax Regime:
- Rs 0 to Rs 2,50,000: Nil
- Rs 2,50,001 to Rs 5,00,000: 5%
- Rs 5,00,001 to Rs 10,00,000: 20%
- Above Rs 10,00,000: 30%

## Major Deductions:

### Section 80C (Max Rs 1,50,000):
- Employee Provident Fund (EPF), Public Provident Fund (PPF)
- Life Insurance Premium (LIC), Equity Linked Savings Scheme (ELSS)
- National Savings Certificate (NSC), Sukanya Samriddhi Yojana
- Home Loan Principal Repayment, Tuition Fees (2 children)

### Section 80D (Health Insurance):
- Self, spouse, children: Up to Rs 25,000
- Parents (below 60): Additional Rs 25,000
- Parents (above 60): Additional Rs 50,000

### Section 80E: Interest on education loan (no limit)
### Section 80G: Donations to specified funds/charities (50% or 100%)
### Section 24(b): Home loan interest up to Rs 2,00,000

### Section 87A (Rebate):
- New Regime: Rs 25,000 rebate if income <= Rs 7,00,000
- Old Regime: Rs 12,500 rebate if income <= Rs 5,00,000

## ITR Forms:

### ITR-1 (Sahaj): resident individuals; salary, one house property,
other sources; total income up to Rs 50 lakhs.
### ITR-2: individuals/HUFs without business income; capital gains;
foreign assets/income; multiple house properties.
### ITR-3: income from business/profession; partners in firms.
### ITR-4 (Sugam): presumptive business income, turnover up to Rs 2 crores.

## Important Compliance:

### Filing Deadlines: non-audit cases July 31; audit cases October 31.
### Late Filing Penalties: up to Rs 5,000 after due date; Rs 1,000 if
income below Rs 5 lakhs.

## Full Forms & Abbreviations:

- ITR: Income Tax Return
- PAN: Permanent Account Number
- AIS: Annual Information Statement
- TDS: Tax Deducted at Source
- AY: Assessment Year / FY: Financial Year
- HRA: House Rent Allowance / LTA: Leave Travel Allowance
- EPF: Employee Provident Fund / PPF: Public Provident Fund
- ELSS: Equity Linked Savings Scheme / NSC: National Savings Certificate
- NRI: Non-Resident Indian / RNOR: Resident but Not Ordinarily Resident
- HUF: Hindu Undivided Family
- LTCG / STCG: Long / Short Term Capital Gains
- CBDT: Central Board of Direct Taxes

## Common Questions:

Q: Which regime should I choose?
A: Compare both regimes. New regime has lower rates but no deductions.
Old regime allows deductions but higher rates.

Q: What documents do I need?
A: Form 16, Form 26AS, AIS/TIS, bank interest certificates, investment
proofs, rent receipts, home loan certificates.

Q: How to claim HRA exemption?
A: Least of: (a) actual HRA received, (b) rent paid minus 10% of salary,
(c) 50% of salary (metro cities) or 40% (non-metro).

Q: What is standard deduction?
A: Rs 50,000 deduction available to salaried individuals in both regimes.
"#;
