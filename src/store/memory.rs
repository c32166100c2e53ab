use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Mutex, PoisonError},
};

use anyhow::bail;
use chrono::NaiveDate;

use crate::{
    model::{
        employee::EmployeeSummary,
        payroll::{AttendanceCount, SalaryBasis},
    },
    payroll::{PayrollBreakdown, PayrollMonth},
    store::{EmployeeAttendanceStore, PayrollStore},
};

/// Store backed by maps, for service tests.
#[derive(Default)]
pub struct MemoryStore {
    employees: Mutex<BTreeMap<u64, (EmployeeSummary, SalaryBasis)>>,
    attendance: Mutex<HashMap<u64, BTreeSet<NaiveDate>>>,
    payrolls: Mutex<BTreeMap<(u64, PayrollMonth), PayrollBreakdown>>,
    failing_saves: Mutex<BTreeSet<u64>>,
}

impl MemoryStore {
    pub fn add_employee(&self, id: u64, name: &str, base_salary: f64, special_salary: f64) {
        let summary = EmployeeSummary {
            id,
            employee_code: format!("EMP-{id:03}"),
            name: name.to_string(),
            designation: "Engineer".to_string(),
        };
        let basis = SalaryBasis {
            base_salary,
            special_salary,
        };

        lock(&self.employees).insert(id, (summary, basis));
    }

    pub fn set_salary(&self, id: u64, base_salary: f64, special_salary: f64) {
        if let Some((_, basis)) = lock(&self.employees).get_mut(&id) {
            *basis = SalaryBasis {
                base_salary,
                special_salary,
            };
        }
    }

    pub fn mark_present(&self, id: u64, dates: impl IntoIterator<Item = NaiveDate>) {
        lock(&self.attendance).entry(id).or_default().extend(dates);
    }

    /// Makes every later `save` for this employee fail.
    pub fn fail_saves_for(&self, id: u64) {
        lock(&self.failing_saves).insert(id);
    }

    pub fn saved_count(&self) -> usize {
        lock(&self.payrolls).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EmployeeAttendanceStore for MemoryStore {
    async fn employees(&self) -> anyhow::Result<Vec<EmployeeSummary>> {
        Ok(lock(&self.employees)
            .values()
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    async fn salary_basis(&self, employee_id: u64) -> anyhow::Result<Option<SalaryBasis>> {
        Ok(lock(&self.employees).get(&employee_id).map(|(_, basis)| *basis))
    }

    async fn attendance_count(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<AttendanceCount> {
        let reported = lock(&self.attendance)
            .get(&employee_id)
            .map(|dates| dates.iter().filter(|d| month.contains(**d)).count())
            .unwrap_or(0);

        Ok(AttendanceCount {
            working_days: month.days(),
            reported_days: reported as u32,
        })
    }
}

impl PayrollStore for MemoryStore {
    async fn saved_breakdown(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<Option<PayrollBreakdown>> {
        Ok(lock(&self.payrolls).get(&(employee_id, month)).cloned())
    }

    async fn save(&self, breakdown: &PayrollBreakdown) -> anyhow::Result<()> {
        if lock(&self.failing_saves).contains(&breakdown.employee_id) {
            bail!("simulated write failure for employee {}", breakdown.employee_id);
        }

        lock(&self.payrolls).insert((breakdown.employee_id, breakdown.month), breakdown.clone());
        Ok(())
    }

    async fn breakdowns_for_month(&self, month: PayrollMonth) -> anyhow::Result<Vec<PayrollBreakdown>> {
        Ok(lock(&self.payrolls)
            .values()
            .filter(|b| b.month == month)
            .cloned()
            .collect())
    }

    async fn delete_older_than(&self, cutoff: PayrollMonth) -> anyhow::Result<u64> {
        let mut payrolls = lock(&self.payrolls);
        let before = payrolls.len();
        payrolls.retain(|(_, month), _| *month >= cutoff);
        Ok((before - payrolls.len()) as u64)
    }
}
