//! Storage boundaries the payroll service depends on.
//!
//! The service only sees these traits; [`MySqlStore`] backs them in the
//! running server.

#![allow(async_fn_in_trait)]

pub mod mysql;

#[cfg(test)]
pub mod memory;

pub use mysql::MySqlStore;

use crate::{
    model::{
        employee::EmployeeSummary,
        payroll::{AttendanceCount, SalaryBasis},
    },
    payroll::{PayrollBreakdown, PayrollMonth},
};

/// Employee profiles, salary bases and daily attendance.
pub trait EmployeeAttendanceStore {
    async fn employees(&self) -> anyhow::Result<Vec<EmployeeSummary>>;

    async fn salary_basis(&self, employee_id: u64) -> anyhow::Result<Option<SalaryBasis>>;

    /// Working days are the calendar days of the month; reported days are
    /// the distinct dates with an attendance record.
    async fn attendance_count(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<AttendanceCount>;
}

/// Saved payroll breakdowns, one per (employee, month).
pub trait PayrollStore {
    async fn saved_breakdown(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<Option<PayrollBreakdown>>;

    /// Inserts or replaces the record for the breakdown's employee and month.
    async fn save(&self, breakdown: &PayrollBreakdown) -> anyhow::Result<()>;

    async fn breakdowns_for_month(&self, month: PayrollMonth) -> anyhow::Result<Vec<PayrollBreakdown>>;

    /// Deletes records for months strictly before `cutoff`, returning the count.
    async fn delete_older_than(&self, cutoff: PayrollMonth) -> anyhow::Result<u64>;
}
