use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payroll::{PayrollBreakdown, PayrollFigures, PayrollMonth};

/// Monthly pay set on the employee record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryBasis {
    #[schema(example = 31000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub special_salary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCount {
    #[schema(example = 31)]
    pub working_days: u32,
    #[schema(example = 22)]
    pub reported_days: u32,
}

/// A row of the `payrolls` table. `month` is the first day of the period.
#[derive(Debug, sqlx::FromRow)]
pub struct Payroll {
    pub employee_id: u64,
    pub month: NaiveDate,
    pub working_days: f64,
    pub reported_days: f64,
    pub basic: f64,
    pub special_pay: f64,
    pub pay_scale: f64,
    pub da: f64,
    pub hra: f64,
    pub gross_earning: f64,
    pub provident_fund: f64,
    pub professional: f64,
    pub advance: f64,
    pub tds: f64,
    pub esic: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
    pub cpf: f64,
    pub esic_contribution: f64,
    pub medical_contribution: f64,
}

impl From<Payroll> for PayrollBreakdown {
    fn from(row: Payroll) -> Self {
        PayrollBreakdown {
            employee_id: row.employee_id,
            month: PayrollMonth::of(row.month),
            figures: PayrollFigures {
                working_days: row.working_days,
                reported_days: row.reported_days,
                basic: row.basic,
                special_pay: row.special_pay,
                pay_scale: row.pay_scale,
                da: row.da,
                hra: row.hra,
                gross_earning: row.gross_earning,
                provident_fund: row.provident_fund,
                professional: row.professional,
                advance: row.advance,
                tds: row.tds,
                esic: row.esic,
                total_deductions: row.total_deductions,
                net_pay: row.net_pay,
                cpf: row.cpf,
                esic_contribution: row.esic_contribution,
                medical_contribution: row.medical_contribution,
            },
        }
    }
}
