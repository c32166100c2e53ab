use crate::payroll::{
    breakdown::{PayrollBreakdown, PayrollFigures},
    input::{PayrollInput, PayrollInputError, RawPayrollInput},
    month::PayrollMonth,
};

pub const DA_RATE: f64 = 0.25;
pub const HRA_RATE: f64 = 0.20;
pub const ESIC_RATE: f64 = 0.0075;
pub const ESIC_CONTRIBUTION_RATE: f64 = 0.0325;
/// Flat monthly provident fund deduction, not a percentage of pay.
pub const DEFAULT_PROVIDENT_FUND: f64 = 1800.0;

/// Rounds to the nearest whole unit, halves going up (`2.5 -> 3`, `-2.5 -> -2`).
pub fn round_unit(value: f64) -> f64 {
    let floor = value.floor();
    // `value - floor` is exact; adding 0.5 first would round 0.49999999999999994 up.
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Computes every payroll figure from already-defaulted inputs.
///
/// Each derived amount is rounded before it feeds the next step, so the
/// totals are sums of rounded parts. Zero reported days means attendance
/// has not been marked yet and the full basic is paid.
pub fn calculate(input: &PayrollInput) -> PayrollFigures {
    let pay_scale = if input.reported_days == 0.0 {
        input.basic
    } else {
        round_unit((input.reported_days / input.working_days) * input.basic)
    };

    let da = input.da.unwrap_or_else(|| round_unit(pay_scale * DA_RATE));
    let hra = input.hra.unwrap_or_else(|| round_unit(pay_scale * HRA_RATE));
    let gross_earning = pay_scale + input.special_pay + da + hra;

    let provident_fund = input.provident_fund.unwrap_or(DEFAULT_PROVIDENT_FUND);
    let esic = input.esic.unwrap_or_else(|| round_unit(gross_earning * ESIC_RATE));
    let total_deductions = provident_fund + input.professional + input.advance + input.tds + esic;
    let net_pay = gross_earning - total_deductions;

    let esic_contribution = input
        .esic_contribution
        .unwrap_or_else(|| round_unit(gross_earning * ESIC_CONTRIBUTION_RATE));

    PayrollFigures {
        working_days: input.working_days,
        reported_days: input.reported_days,
        basic: input.basic,
        special_pay: input.special_pay,
        pay_scale,
        da,
        hra,
        gross_earning,
        provident_fund,
        professional: input.professional,
        advance: input.advance,
        tds: input.tds,
        esic,
        total_deductions,
        net_pay,
        cpf: provident_fund,
        esic_contribution,
        medical_contribution: input.medical_contribution,
    }
}

/// Validates raw fields and computes the breakdown for one employee-month.
pub fn compute(
    employee_id: u64,
    month: PayrollMonth,
    raw: &RawPayrollInput,
) -> Result<PayrollBreakdown, PayrollInputError> {
    let input = PayrollInput::try_from_raw(raw)?;

    Ok(PayrollBreakdown {
        employee_id,
        month,
        figures: calculate(&input),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(basic: &str, special: &str, working: &str, reported: &str) -> RawPayrollInput {
        RawPayrollInput {
            basic: Some(basic.into()),
            special_pay: Some(special.into()),
            working_days: Some(working.into()),
            reported_days: Some(reported.into()),
            professional: Some("200".into()),
            ..Default::default()
        }
    }

    fn figures(raw: &RawPayrollInput) -> PayrollFigures {
        calculate(&PayrollInput::try_from_raw(raw).unwrap())
    }

    fn assert_consistent(f: &PayrollFigures) {
        assert_eq!(f.gross_earning, f.pay_scale + f.special_pay + f.da + f.hra);
        assert_eq!(
            f.total_deductions,
            f.provident_fund + f.professional + f.advance + f.tds + f.esic
        );
        assert_eq!(f.net_pay, f.gross_earning - f.total_deductions);
        assert_eq!(f.cpf, f.provident_fund);
    }

    #[test]
    fn round_unit_goes_half_up() {
        assert_eq!(round_unit(374.625), 375.0);
        assert_eq!(round_unit(200.5), 201.0);
        assert_eq!(round_unit(200.49), 200.0);
        assert_eq!(round_unit(-2.5), -2.0);
        assert_eq!(round_unit(-2.6), -3.0);
        assert_eq!(round_unit(0.49999999999999994), 0.0);
        assert_eq!(round_unit(-0.5), 0.0);
        assert_eq!(round_unit(4503599627370497.0), 4503599627370497.0);
    }

    #[test]
    fn full_attendance_pays_full_basic() {
        let f = figures(&raw("31000", "5000", "31", "31"));

        assert_eq!(f.pay_scale, 31000.0);
        assert_eq!(f.da, 7750.0);
        assert_eq!(f.hra, 6200.0);
        assert_eq!(f.gross_earning, 49950.0);
        assert_eq!(f.provident_fund, 1800.0);
        assert_eq!(f.esic, 375.0);
        assert_eq!(f.total_deductions, 2375.0);
        assert_eq!(f.net_pay, 47575.0);
        assert_eq!(f.cpf, 1800.0);
        assert_eq!(f.esic_contribution, 1623.0);
        assert_eq!(f.medical_contribution, 0.0);
        assert_consistent(&f);
    }

    #[test]
    fn zero_reported_days_skips_proration() {
        let full = figures(&raw("31000", "5000", "31", "31"));
        let unmarked = figures(&raw("31000", "5000", "31", "0"));

        assert_eq!(unmarked.pay_scale, 31000.0);
        assert_eq!(unmarked.reported_days, 0.0);
        assert_eq!(unmarked.gross_earning, full.gross_earning);
        assert_eq!(unmarked.total_deductions, full.total_deductions);
        assert_eq!(unmarked.net_pay, full.net_pay);
    }

    #[test]
    fn zero_reported_days_ignores_working_days() {
        for working in ["28", "30", "31", "0", "junk"] {
            let f = figures(&raw("27500", "0", working, "0"));
            assert_eq!(f.pay_scale, 27500.0, "working days {working}");
        }
    }

    #[test]
    fn partial_attendance_prorates_basic_only() {
        let f = figures(&raw("31000", "5000", "31", "15"));

        assert_eq!(f.pay_scale, 15000.0);
        assert_eq!(f.da, 3750.0);
        assert_eq!(f.hra, 3000.0);
        assert_eq!(f.special_pay, 5000.0);
        assert_eq!(f.gross_earning, 26750.0);
        assert_eq!(f.esic, 201.0);
        assert_eq!(f.total_deductions, 2201.0);
        assert_eq!(f.net_pay, 24549.0);
        assert_consistent(&f);
    }

    #[test]
    fn zero_working_days_divides_by_31() {
        let garbage = figures(&raw("31000", "0", "0", "15"));
        let explicit = figures(&raw("31000", "0", "31", "15"));

        assert_eq!(garbage.working_days, 31.0);
        assert_eq!(garbage.pay_scale, 15000.0);
        assert_eq!(garbage, explicit);
    }

    #[test]
    fn missing_working_days_divides_by_31() {
        let mut input = raw("62000", "0", "", "10");
        input.working_days = None;

        let f = figures(&input);

        assert_eq!(f.working_days, 31.0);
        assert_eq!(f.pay_scale, 20000.0);
    }

    #[test]
    fn reported_equal_to_working_gives_basic() {
        for (working, basic) in [("28", "25000"), ("30", "33333"), ("31", "47123"), ("29", "1")] {
            let f = figures(&raw(basic, "0", working, working));
            assert_eq!(f.pay_scale, basic.parse::<f64>().unwrap(), "{working} days, basic {basic}");
        }
    }

    #[test]
    fn overrides_replace_computed_values() {
        let input = RawPayrollInput {
            da: Some("1000".into()),
            hra: Some("500".into()),
            provident_fund: Some("2100".into()),
            esic: Some("50".into()),
            esic_contribution: Some("75".into()),
            advance: Some("300".into()),
            tds: Some("400".into()),
            medical_contribution: Some("250".into()),
            ..raw("31000", "5000", "31", "31")
        };

        let f = figures(&input);

        assert_eq!(f.da, 1000.0);
        assert_eq!(f.hra, 500.0);
        assert_eq!(f.gross_earning, 31000.0 + 5000.0 + 1000.0 + 500.0);
        assert_eq!(f.provident_fund, 2100.0);
        assert_eq!(f.cpf, 2100.0);
        assert_eq!(f.esic, 50.0);
        assert_eq!(f.esic_contribution, 75.0);
        assert_eq!(f.advance, 300.0);
        assert_eq!(f.tds, 400.0);
        assert_eq!(f.medical_contribution, 250.0);
        assert_eq!(f.total_deductions, 2100.0 + 200.0 + 300.0 + 400.0 + 50.0);
        assert_consistent(&f);
    }

    #[test]
    fn zero_overrides_fall_back_to_computed() {
        let input = RawPayrollInput {
            da: Some("0".into()),
            provident_fund: Some("0".into()),
            esic: Some("0".into()),
            ..raw("31000", "5000", "31", "31")
        };

        let f = figures(&input);

        assert_eq!(f.da, 7750.0);
        assert_eq!(f.provident_fund, 1800.0);
        assert_eq!(f.esic, 375.0);
    }

    #[test]
    fn advance_and_tds_reduce_net_pay_in_full() {
        let base = figures(&raw("31000", "5000", "31", "31"));
        let input = RawPayrollInput {
            advance: Some("1000".into()),
            tds: Some("2500".into()),
            ..raw("31000", "5000", "31", "31")
        };

        let f = figures(&input);

        assert_eq!(f.net_pay, base.net_pay - 3500.0);
    }

    #[test]
    fn missing_professional_tax_is_a_validation_error() {
        let mut input = raw("31000", "5000", "31", "31");
        input.professional = None;

        let month = PayrollMonth::new(2025, 1).unwrap();

        assert_eq!(
            compute(7, month, &input),
            Err(PayrollInputError::MissingProfessionalTax)
        );
    }

    #[test]
    fn invariants_hold_across_inputs() {
        for basic in ["0", "1", "9999", "18500.5", "31000", "123457"] {
            for special in ["0", "2500", "777.25"] {
                for reported in ["0", "1", "7", "15", "22", "30", "31", "35"] {
                    let f = figures(&raw(basic, special, "31", reported));
                    assert_consistent(&f);
                }
            }
        }
    }

    #[test]
    fn net_pay_never_drops_as_reported_days_grow() {
        for basic in ["15000", "31000", "45999", "100003"] {
            for working in [28u32, 30, 31] {
                let mut previous = f64::MIN;

                for reported in 1..=working {
                    let f = figures(&raw(basic, "1500", &working.to_string(), &reported.to_string()));
                    assert!(
                        f.net_pay >= previous,
                        "basic {basic}, {reported}/{working}: {} < {previous}",
                        f.net_pay
                    );
                    previous = f.net_pay;
                }
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let month = PayrollMonth::new(2025, 3).unwrap();
        let input = raw("31000", "5000", "31", "17");

        let first = serde_json::to_string(&compute(42, month, &input).unwrap()).unwrap();
        let second = serde_json::to_string(&compute(42, month, &input).unwrap()).unwrap();

        assert_eq!(first, second);
    }
}
