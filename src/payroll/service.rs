//! The calling layer around the calculator: loads salary basis and
//! attendance, applies saved and admin overrides, persists results.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    model::employee::EmployeeSummary,
    payroll::{
        PayrollBreakdown, PayrollInputError, PayrollMonth, RawPayrollInput, breakdown::amount,
        compute,
    },
    store::{EmployeeAttendanceStore, PayrollStore},
};

#[derive(Debug, thiserror::Error)]
pub enum PayrollServiceError {
    #[error("employee {0} not found")]
    EmployeeNotFound(u64),
    #[error(transparent)]
    Input(#[from] PayrollInputError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// One line of a month's payroll sheet. Exactly one of `breakdown` and
/// `error` is set.
#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollSheetRow {
    pub employee: EmployeeSummary,
    /// Whether a saved record exists for this month.
    pub saved: bool,
    pub breakdown: Option<PayrollBreakdown>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveFailure {
    pub employee_id: u64,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveAllReport {
    #[schema(value_type = String, example = "01-2026")]
    pub month: PayrollMonth,
    pub saved: usize,
    pub failed: Vec<SaveFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeReport {
    /// Records for months before this one were deleted.
    #[schema(value_type = String, example = "01-2025")]
    pub cutoff: PayrollMonth,
    pub deleted: u64,
}

pub struct PayrollService<'a, S> {
    store: &'a S,
    professional_default: Option<f64>,
}

impl<'a, S> PayrollService<'a, S>
where
    S: EmployeeAttendanceStore + PayrollStore,
{
    /// `professional_default` fills professional tax when neither a saved
    /// record nor the admin supplied one.
    pub fn new(store: &'a S, professional_default: Option<f64>) -> Self {
        Self {
            store,
            professional_default,
        }
    }

    /// Inputs for a month before any admin edits of this request.
    ///
    /// Basic and special pay always come from the current salary basis.
    /// A saved record contributes its editable fields; without one, days
    /// come from the attendance count.
    async fn base_input(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> Result<(RawPayrollInput, bool), PayrollServiceError> {
        let basis = self
            .store
            .salary_basis(employee_id)
            .await?
            .ok_or(PayrollServiceError::EmployeeNotFound(employee_id))?;

        // Rate figures an admin edited come back through `to_overrides`.
        let saved = self.store.saved_breakdown(employee_id, month).await?;
        let is_saved = saved.is_some();

        let mut raw = match saved {
            Some(saved) => {
                debug!(employee_id, %month, "Using saved payroll fields");
                saved.to_overrides()
            }
            None => {
                let count = self.store.attendance_count(employee_id, month).await?;
                RawPayrollInput {
                    working_days: Some(count.working_days.to_string()),
                    reported_days: Some(count.reported_days.to_string()),
                    ..Default::default()
                }
            }
        };

        raw.basic = Some(amount::format(basis.base_salary));
        raw.special_pay = Some(amount::format(basis.special_salary));

        Ok((raw, is_saved))
    }

    fn finish(
        &self,
        employee_id: u64,
        month: PayrollMonth,
        mut raw: RawPayrollInput,
    ) -> Result<PayrollBreakdown, PayrollServiceError> {
        if raw.professional.is_none() {
            raw.professional = self.professional_default.map(amount::format);
        }

        Ok(compute(employee_id, month, &raw)?)
    }

    /// The breakdown shown for an employee-month.
    pub async fn resolve(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> Result<PayrollBreakdown, PayrollServiceError> {
        let (raw, _) = self.base_input(employee_id, month).await?;
        self.finish(employee_id, month, raw)
    }

    /// Recomputes with the admin's edits on top. Nothing is saved.
    ///
    /// Basic and special pay in `overrides` are ignored.
    pub async fn recalculate(
        &self,
        employee_id: u64,
        month: PayrollMonth,
        overrides: &RawPayrollInput,
    ) -> Result<PayrollBreakdown, PayrollServiceError> {
        let (raw, _) = self.base_input(employee_id, month).await?;

        let overrides = RawPayrollInput {
            basic: None,
            special_pay: None,
            ..overrides.clone()
        };

        self.finish(employee_id, month, raw.overlay(&overrides))
    }

    pub async fn save(
        &self,
        employee_id: u64,
        month: PayrollMonth,
        overrides: &RawPayrollInput,
    ) -> Result<PayrollBreakdown, PayrollServiceError> {
        let breakdown = self.recalculate(employee_id, month, overrides).await?;
        self.store.save(&breakdown).await?;

        info!(employee_id, %month, net_pay = breakdown.figures.net_pay, "Payroll saved");
        Ok(breakdown)
    }

    /// Every employee's breakdown for the month. A row that cannot be
    /// computed carries an error message instead of failing the sheet.
    pub async fn month_sheet(
        &self,
        month: PayrollMonth,
    ) -> Result<Vec<PayrollSheetRow>, PayrollServiceError> {
        let employees = self.store.employees().await?;
        let mut rows = Vec::with_capacity(employees.len());

        for employee in employees {
            let employee_id = employee.id;

            let row = match self.base_input(employee_id, month).await {
                Ok((raw, saved)) => match self.finish(employee_id, month, raw) {
                    Ok(breakdown) => PayrollSheetRow {
                        employee,
                        saved,
                        breakdown: Some(breakdown),
                        error: None,
                    },
                    Err(e) => PayrollSheetRow {
                        employee,
                        saved,
                        breakdown: None,
                        error: Some(e.to_string()),
                    },
                },
                Err(e) => {
                    warn!(employee_id, %month, error = %e, "Payroll row unavailable");
                    PayrollSheetRow {
                        employee,
                        saved: false,
                        breakdown: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            rows.push(row);
        }

        Ok(rows)
    }

    /// Resolves and saves every employee's month concurrently. Failures
    /// are collected per employee and do not stop the other saves.
    pub async fn save_all(&self, month: PayrollMonth) -> Result<SaveAllReport, PayrollServiceError> {
        let employees = self.store.employees().await?;

        let saves = employees.iter().map(|employee| async move {
            let breakdown = self.resolve(employee.id, month).await?;
            self.store.save(&breakdown).await?;
            Ok::<_, PayrollServiceError>(())
        });

        let results = join_all(saves).await;

        let mut saved = 0;
        let mut failed = Vec::new();

        for (employee, result) in employees.iter().zip(results) {
            match result {
                Ok(()) => saved += 1,
                Err(e) => {
                    warn!(employee_id = employee.id, %month, error = %e, "Payroll save failed");
                    failed.push(SaveFailure {
                        employee_id: employee.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(%month, saved, failed = failed.len(), "Saved all payrolls");
        Ok(SaveAllReport {
            month,
            saved,
            failed,
        })
    }

    /// Saved records of the month exactly as stored, without recomputation.
    pub async fn saved_for_month(
        &self,
        month: PayrollMonth,
    ) -> Result<Vec<PayrollBreakdown>, PayrollServiceError> {
        Ok(self.store.breakdowns_for_month(month).await?)
    }

    /// Deletes saved records for months more than `months` before `current`.
    pub async fn purge_older_than(
        &self,
        current: PayrollMonth,
        months: u32,
    ) -> Result<PurgeReport, PayrollServiceError> {
        let cutoff = current.months_back(months);
        let deleted = self.store.delete_older_than(cutoff).await?;

        info!(%cutoff, deleted, "Old payrolls deleted");
        Ok(PurgeReport { cutoff, deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn jan() -> PayrollMonth {
        PayrollMonth::new(2026, 1).unwrap()
    }

    fn days_of_jan(days: u32) -> impl Iterator<Item = NaiveDate> {
        (1..=days).map(|d| NaiveDate::from_ymd_opt(2026, 1, d).unwrap())
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store.add_employee(1, "Asha", 31000.0, 5000.0);
        store.add_employee(2, "Ravi", 62000.0, 0.0);
        store
    }

    #[actix_web::test]
    async fn fresh_month_uses_attendance_count() {
        let store = store();
        store.mark_present(1, days_of_jan(15));
        let service = PayrollService::new(&store, Some(200.0));

        let breakdown = service.resolve(1, jan()).await.unwrap();

        assert_eq!(breakdown.figures.working_days, 31.0);
        assert_eq!(breakdown.figures.reported_days, 15.0);
        assert_eq!(breakdown.figures.pay_scale, 15000.0);
        assert_eq!(breakdown.figures.net_pay, 24549.0);
    }

    #[actix_web::test]
    async fn unmarked_month_pays_full_basic() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        let breakdown = service.resolve(1, jan()).await.unwrap();

        assert_eq!(breakdown.figures.reported_days, 0.0);
        assert_eq!(breakdown.figures.pay_scale, 31000.0);
        assert_eq!(breakdown.figures.net_pay, 47575.0);
    }

    #[actix_web::test]
    async fn attendance_outside_the_month_is_ignored() {
        let store = store();
        store.mark_present(1, [NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()]);
        store.mark_present(1, days_of_jan(10));
        let service = PayrollService::new(&store, Some(200.0));

        let breakdown = service.resolve(1, jan()).await.unwrap();

        assert_eq!(breakdown.figures.reported_days, 10.0);
    }

    #[actix_web::test]
    async fn missing_professional_tax_without_default_is_an_error() {
        let store = store();
        let service = PayrollService::new(&store, None);

        let err = service.resolve(1, jan()).await.unwrap_err();

        assert!(matches!(
            err,
            PayrollServiceError::Input(PayrollInputError::MissingProfessionalTax)
        ));
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        let err = service.resolve(99, jan()).await.unwrap_err();

        assert!(matches!(err, PayrollServiceError::EmployeeNotFound(99)));
    }

    #[actix_web::test]
    async fn saved_fields_take_precedence_over_attendance() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        let edits = RawPayrollInput {
            reported_days: Some("20".into()),
            advance: Some("1500".into()),
            tds: Some("700".into()),
            professional: Some("300".into()),
            ..Default::default()
        };
        service.save(1, jan(), &edits).await.unwrap();

        // Attendance marked after saving does not change the saved days.
        store.mark_present(1, days_of_jan(25));

        let breakdown = service.resolve(1, jan()).await.unwrap();

        assert_eq!(breakdown.figures.reported_days, 20.0);
        assert_eq!(breakdown.figures.pay_scale, 20000.0);
        assert_eq!(breakdown.figures.advance, 1500.0);
        assert_eq!(breakdown.figures.tds, 700.0);
        assert_eq!(breakdown.figures.professional, 300.0);
    }

    #[actix_web::test]
    async fn saved_rate_overrides_survive_resolve_and_save_all() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        let edits = RawPayrollInput {
            da: Some("1000".into()),
            esic: Some("50".into()),
            ..Default::default()
        };
        let saved = service.save(1, jan(), &edits).await.unwrap();
        assert_eq!(saved.figures.net_pay, 41150.0);

        let resolved = service.resolve(1, jan()).await.unwrap();
        assert_eq!(resolved, saved);

        service.save_all(jan()).await.unwrap();

        let stored = service.saved_for_month(jan()).await.unwrap();
        let asha = stored.iter().find(|b| b.employee_id == 1).unwrap();
        assert_eq!(asha.figures.da, 1000.0);
        assert_eq!(asha.figures.esic, 50.0);
        assert_eq!(asha.figures.net_pay, 41150.0);

        // Untouched rate figures follow a salary change; edited ones stay.
        store.set_salary(1, 40000.0, 2000.0);
        let resolved = service.resolve(1, jan()).await.unwrap();
        assert_eq!(resolved.figures.da, 1000.0);
        assert_eq!(resolved.figures.hra, 8000.0);
        assert_eq!(resolved.figures.esic, 50.0);
    }

    #[actix_web::test]
    async fn salary_changes_reach_saved_months() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        service.save(1, jan(), &RawPayrollInput::default()).await.unwrap();
        store.set_salary(1, 40000.0, 2000.0);

        let breakdown = service.resolve(1, jan()).await.unwrap();

        assert_eq!(breakdown.figures.basic, 40000.0);
        assert_eq!(breakdown.figures.special_pay, 2000.0);
        assert_eq!(breakdown.figures.pay_scale, 40000.0);
    }

    #[actix_web::test]
    async fn recalculate_ignores_basic_and_does_not_save() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        let edits = RawPayrollInput {
            basic: Some("1".into()),
            special_pay: Some("1".into()),
            da: Some("100".into()),
            ..Default::default()
        };
        let breakdown = service.recalculate(1, jan(), &edits).await.unwrap();

        assert_eq!(breakdown.figures.basic, 31000.0);
        assert_eq!(breakdown.figures.special_pay, 5000.0);
        assert_eq!(breakdown.figures.da, 100.0);
        assert_eq!(store.saved_count(), 0);
    }

    #[actix_web::test]
    async fn month_sheet_reports_row_errors_without_failing() {
        let store = store();
        let service = PayrollService::new(&store, None);

        service
            .save(
                2,
                jan(),
                &RawPayrollInput {
                    professional: Some("200".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let rows = service.month_sheet(jan()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].breakdown.is_none());
        assert!(!rows[0].saved);
        assert_eq!(
            rows[0].error.as_deref(),
            Some("professional tax is missing or not a number")
        );
        assert!(rows[1].saved);
        assert!(rows[1].error.is_none());
        assert_eq!(rows[1].breakdown.as_ref().unwrap().figures.basic, 62000.0);
    }

    #[actix_web::test]
    async fn save_all_continues_past_failures() {
        let store = store();
        store.add_employee(3, "Meera", 20000.0, 0.0);
        store.fail_saves_for(2);
        let service = PayrollService::new(&store, Some(200.0));

        let report = service.save_all(jan()).await.unwrap();

        assert_eq!(report.saved, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].employee_id, 2);
        assert_eq!(store.saved_count(), 2);
    }

    #[actix_web::test]
    async fn saved_for_month_returns_stored_figures() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        service.save(2, jan(), &RawPayrollInput::default()).await.unwrap();
        store.set_salary(2, 70000.0, 0.0);

        let saved = service.saved_for_month(jan()).await.unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].employee_id, 2);
        assert_eq!(saved[0].figures.basic, 62000.0);
        assert!(service
            .saved_for_month(PayrollMonth::new(2026, 2).unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_web::test]
    async fn purge_deletes_months_before_cutoff() {
        let store = store();
        let service = PayrollService::new(&store, Some(200.0));

        for (year, month) in [(2024, 11), (2024, 12), (2025, 1), (2025, 6)] {
            let month = PayrollMonth::new(year, month).unwrap();
            service.save(1, month, &RawPayrollInput::default()).await.unwrap();
        }

        let report = service
            .purge_older_than(PayrollMonth::new(2026, 1).unwrap(), 12)
            .await
            .unwrap();

        assert_eq!(report.cutoff, PayrollMonth::new(2025, 1).unwrap());
        assert_eq!(report.deleted, 2);
        assert_eq!(store.saved_count(), 2);
    }
}
