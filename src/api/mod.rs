pub mod attendance;
pub mod dashboard;
pub mod employee;
pub mod leave_request;
pub mod payroll;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::ApiError, payroll::PayrollMonth};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// `MM-YYYY`; the current month when absent.
    #[param(example = "01-2026")]
    pub month: Option<String>,
}

impl MonthQuery {
    pub fn month(&self) -> Result<PayrollMonth, ApiError> {
        match self.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => Ok(m.parse::<PayrollMonth>()?),
            None => Ok(PayrollMonth::current()),
        }
    }
}
