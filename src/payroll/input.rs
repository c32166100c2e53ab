//! Parse-or-default rules for payroll inputs.
//!
//! Every field arrives as loosely typed text (an admin form, a saved record,
//! a spreadsheet cell). Parse failures never reject the input: each field
//! falls back to the default listed in [`PayrollInput::try_from_raw`]. The
//! one exception is professional tax, which has no statutory default.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_WORKING_DAYS: f64 = 31.0;

/// Raw payroll fields as they come from a form or a saved record.
///
/// Values may be JSON strings or numbers; both end up as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPayrollInput {
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "31", value_type = Option<String>)]
    pub working_days: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "28", value_type = Option<String>)]
    pub reported_days: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "31000", value_type = Option<String>)]
    pub basic: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "5000", value_type = Option<String>)]
    pub special_pay: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub da: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub hra: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "1800", value_type = Option<String>)]
    pub provident_fund: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "200", value_type = Option<String>)]
    pub professional: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "0", value_type = Option<String>)]
    pub advance: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "0", value_type = Option<String>)]
    pub tds: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub esic: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(value_type = Option<String>)]
    pub esic_contribution: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    #[schema(example = "0", value_type = Option<String>)]
    pub medical_contribution: Option<String>,
}

impl RawPayrollInput {
    /// Fields set on `other` replace the ones on `self`.
    pub fn overlay(mut self, other: &RawPayrollInput) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }

        take!(
            working_days,
            reported_days,
            basic,
            special_pay,
            da,
            hra,
            provident_fund,
            professional,
            advance,
            tds,
            esic,
            esic_contribution,
            medical_contribution
        );
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayrollInputError {
    #[error("professional tax is missing or not a number")]
    MissingProfessionalTax,
}

/// Inputs after the default table has been applied.
///
/// `None` on an override field means "compute it".
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollInput {
    pub working_days: f64,
    pub reported_days: f64,
    pub basic: f64,
    pub special_pay: f64,
    pub da: Option<f64>,
    pub hra: Option<f64>,
    pub provident_fund: Option<f64>,
    pub professional: f64,
    pub advance: f64,
    pub tds: f64,
    pub esic: Option<f64>,
    pub esic_contribution: Option<f64>,
    pub medical_contribution: f64,
}

impl PayrollInput {
    /// Applies the default table:
    ///
    /// | field | rule |
    /// |---|---|
    /// | working days | non-zero number, else 31 |
    /// | reported days | non-zero number, else 0 |
    /// | basic, special pay | number, else 0 |
    /// | da, hra, provident fund, esic, esic contribution | non-zero number, else computed |
    /// | advance, tds, medical contribution | non-zero number, else 0 |
    /// | professional | any number, else [`PayrollInputError::MissingProfessionalTax`] |
    pub fn try_from_raw(raw: &RawPayrollInput) -> Result<Self, PayrollInputError> {
        let professional = number(&raw.professional).ok_or(PayrollInputError::MissingProfessionalTax)?;

        Ok(Self {
            working_days: non_zero(&raw.working_days).unwrap_or(DEFAULT_WORKING_DAYS),
            reported_days: non_zero(&raw.reported_days).unwrap_or(0.0),
            basic: number(&raw.basic).unwrap_or(0.0),
            special_pay: number(&raw.special_pay).unwrap_or(0.0),
            da: non_zero(&raw.da),
            hra: non_zero(&raw.hra),
            provident_fund: non_zero(&raw.provident_fund),
            professional,
            advance: non_zero(&raw.advance).unwrap_or(0.0),
            tds: non_zero(&raw.tds).unwrap_or(0.0),
            esic: non_zero(&raw.esic),
            esic_contribution: non_zero(&raw.esic_contribution),
            medical_contribution: non_zero(&raw.medical_contribution).unwrap_or(0.0),
        })
    }
}

fn number(field: &Option<String>) -> Option<f64> {
    field.as_deref().and_then(lenient_number)
}

fn non_zero(field: &Option<String>) -> Option<f64> {
    number(field).filter(|v| *v != 0.0)
}

/// Reads the longest numeric prefix of `text`, e.g. `"28 days"` is 28.
///
/// Leading whitespace and an optional sign are accepted, followed by
/// digits, an optional fraction and an optional exponent. Returns `None`
/// when no digits are found or the value is not finite.
pub fn lenient_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
