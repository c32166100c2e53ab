use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payroll::{
    calculator::{DA_RATE, ESIC_CONTRIBUTION_RATE, ESIC_RATE, HRA_RATE, round_unit},
    input::RawPayrollInput,
    month::PayrollMonth,
};

/// Computed figures of one employee-month. Amounts are whole currency
/// units except where an admin entered a fractional override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollFigures {
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "31")]
    pub working_days: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "15")]
    pub reported_days: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "31000")]
    pub basic: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "5000")]
    pub special_pay: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "15000")]
    pub pay_scale: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "3750")]
    pub da: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "3000")]
    pub hra: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "26750")]
    pub gross_earning: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "1800")]
    pub provident_fund: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "200")]
    pub professional: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "0")]
    pub advance: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "0")]
    pub tds: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "201")]
    pub esic: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "2201")]
    pub total_deductions: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "24549")]
    pub net_pay: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "1800")]
    pub cpf: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "869")]
    pub esic_contribution: f64,
    #[serde(with = "amount")]
    #[schema(value_type = String, example = "0")]
    pub medical_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollBreakdown {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(value_type = String, example = "01-2026")]
    pub month: PayrollMonth,
    #[serde(flatten)]
    pub figures: PayrollFigures,
}

/// What the calculator derives for the rate-based figures from this
/// record's own pay scale and gross. A stored value that differs was
/// entered by an admin.
impl PayrollFigures {
    pub fn derived_da(&self) -> f64 {
        round_unit(self.pay_scale * DA_RATE)
    }

    pub fn derived_hra(&self) -> f64 {
        round_unit(self.pay_scale * HRA_RATE)
    }

    pub fn derived_esic(&self) -> f64 {
        round_unit(self.gross_earning * ESIC_RATE)
    }

    pub fn derived_esic_contribution(&self) -> f64 {
        round_unit(self.gross_earning * ESIC_CONTRIBUTION_RATE)
    }
}

impl PayrollBreakdown {
    /// The admin-editable fields of a saved record, as overrides for the
    /// next computation of the same month.
    ///
    /// Basic and special pay are left out: they always come from the
    /// employee's current salary basis. DA, HRA, ESIC and ESIC contribution
    /// are carried only when they were overridden, so untouched ones follow
    /// a later salary change.
    pub fn to_overrides(&self) -> RawPayrollInput {
        let f = &self.figures;
        let edited = |value: f64, derived: f64| (value != derived).then(|| amount::format(value));

        RawPayrollInput {
            da: edited(f.da, f.derived_da()),
            hra: edited(f.hra, f.derived_hra()),
            esic: edited(f.esic, f.derived_esic()),
            esic_contribution: edited(f.esic_contribution, f.derived_esic_contribution()),
            working_days: Some(amount::format(f.working_days)),
            reported_days: Some(amount::format(f.reported_days)),
            provident_fund: Some(amount::format(f.provident_fund)),
            professional: Some(amount::format(f.professional)),
            advance: Some(amount::format(f.advance)),
            tds: Some(amount::format(f.tds)),
            medical_contribution: Some(amount::format(f.medical_contribution)),
            ..Default::default()
        }
    }
}

/// Amounts travel as decimal text (`"15000"`, `"250.5"`).
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::payroll::input::lenient_number;

    pub fn format(value: f64) -> String {
        // Avoid "-0" for amounts that round to zero from below.
        if value == 0.0 { "0".to_string() } else { value.to_string() }
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("amount out of range")),
            serde_json::Value::String(s) => {
                lenient_number(&s).ok_or_else(|| D::Error::custom(format!("invalid amount `{s}`")))
            }
            other => Err(D::Error::custom(format!("invalid amount {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::calculator::compute;

    fn sample() -> PayrollBreakdown {
        let raw = RawPayrollInput {
            basic: Some("31000".into()),
            special_pay: Some("5000".into()),
            working_days: Some("31".into()),
            reported_days: Some("15".into()),
            professional: Some("200".into()),
            advance: Some("250.5".into()),
            ..Default::default()
        };

        compute(9, PayrollMonth::new(2026, 1).unwrap(), &raw).unwrap()
    }

    #[test]
    fn serializes_every_number_as_text() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["employeeId"], 9);
        assert_eq!(json["month"], "01-2026");
        assert_eq!(json["payScale"], "15000");
        assert_eq!(json["grossEarning"], "26750");
        assert_eq!(json["advance"], "250.5");
        assert_eq!(json["netPay"], "24298.5");

        let object = json.as_object().unwrap();
        for (key, value) in object {
            if key != "employeeId" {
                assert!(value.is_string(), "{key} should be text");
            }
        }
    }

    #[test]
    fn reads_back_text_and_numbers() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed: PayrollBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());

        let mut value = serde_json::to_value(sample()).unwrap();
        value["tds"] = serde_json::json!(150);
        let parsed: PayrollBreakdown = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.figures.tds, 150.0);
    }

    #[test]
    fn overrides_leave_out_computed_rate_figures() {
        let overrides = sample().to_overrides();

        assert_eq!(overrides.reported_days.as_deref(), Some("15"));
        assert_eq!(overrides.advance.as_deref(), Some("250.5"));
        assert_eq!(overrides.professional.as_deref(), Some("200"));
        assert_eq!(overrides.provident_fund.as_deref(), Some("1800"));
        assert_eq!(overrides.basic, None);
        assert_eq!(overrides.special_pay, None);
        assert_eq!(overrides.da, None);
        assert_eq!(overrides.hra, None);
        assert_eq!(overrides.esic, None);
        assert_eq!(overrides.esic_contribution, None);
    }

    #[test]
    fn overrides_keep_edited_rate_figures() {
        let raw = RawPayrollInput {
            basic: Some("31000".into()),
            special_pay: Some("5000".into()),
            professional: Some("200".into()),
            da: Some("1000".into()),
            esic_contribution: Some("900".into()),
            ..Default::default()
        };
        let saved = compute(9, PayrollMonth::new(2026, 1).unwrap(), &raw).unwrap();

        let overrides = saved.to_overrides();

        assert_eq!(overrides.da.as_deref(), Some("1000"));
        assert_eq!(overrides.esic_contribution.as_deref(), Some("900"));
        // Derived from the overridden gross, so still the calculator's own value.
        assert_eq!(saved.figures.esic, saved.figures.derived_esic());
        assert_eq!(overrides.esic, None);
        assert_eq!(overrides.hra, None);
    }

    #[test]
    fn negative_zero_formats_as_zero() {
        assert_eq!(amount::format(-0.0), "0");
        assert_eq!(amount::format(-12.0), "-12");
    }
}
