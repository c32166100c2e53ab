use anyhow::Context;
use sqlx::MySqlPool;
use tracing::debug;

use crate::{
    model::{
        employee::EmployeeSummary,
        payroll::{AttendanceCount, Payroll, SalaryBasis},
    },
    payroll::{PayrollBreakdown, PayrollMonth},
    store::{EmployeeAttendanceStore, PayrollStore},
    utils::salary_cache::SalaryCache,
};

const PAYROLL_COLUMNS: &str = r#"
    employee_id, month, working_days, reported_days, basic, special_pay, pay_scale,
    da, hra, gross_earning, provident_fund, professional, advance, tds, esic,
    total_deductions, net_pay, cpf, esic_contribution, medical_contribution
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    salaries: SalaryCache,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, salaries: SalaryCache) -> Self {
        Self { pool, salaries }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn salary_cache(&self) -> &SalaryCache {
        &self.salaries
    }
}

impl EmployeeAttendanceStore for MySqlStore {
    async fn employees(&self) -> anyhow::Result<Vec<EmployeeSummary>> {
        sqlx::query_as::<_, EmployeeSummary>(
            "SELECT id, employee_code, name, designation FROM employees ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list employees")
    }

    async fn salary_basis(&self, employee_id: u64) -> anyhow::Result<Option<SalaryBasis>> {
        if let Some(basis) = self.salaries.get(employee_id).await {
            return Ok(Some(basis));
        }

        let generation = self.salaries.generation();
        let basis = sqlx::query_as::<_, SalaryBasis>(
            "SELECT base_salary, special_salary FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load salary basis of employee {employee_id}"))?;

        if let Some(basis) = basis {
            debug!(employee_id, "Salary basis cache miss");
            self.salaries.insert_loaded(employee_id, basis, generation).await;
        }

        Ok(basis)
    }

    async fn attendance_count(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<AttendanceCount> {
        let reported: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT date)
            FROM attendance
            WHERE employee_id = ?
            AND date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(month.first_day())
        .bind(month.last_day())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to count attendance of employee {employee_id} for {month}"))?;

        Ok(AttendanceCount {
            working_days: month.days(),
            reported_days: u32::try_from(reported).unwrap_or(0),
        })
    }
}

impl PayrollStore for MySqlStore {
    async fn saved_breakdown(
        &self,
        employee_id: u64,
        month: PayrollMonth,
    ) -> anyhow::Result<Option<PayrollBreakdown>> {
        let sql = format!(
            "SELECT {} FROM payrolls WHERE employee_id = ? AND month = ?",
            PAYROLL_COLUMNS
        );

        let row = sqlx::query_as::<_, Payroll>(&sql)
            .bind(employee_id)
            .bind(month.first_day())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load payroll of employee {employee_id} for {month}"))?;

        Ok(row.map(PayrollBreakdown::from))
    }

    async fn save(&self, breakdown: &PayrollBreakdown) -> anyhow::Result<()> {
        let f = &breakdown.figures;

        sqlx::query(
            r#"
            INSERT INTO payrolls
            (employee_id, month, working_days, reported_days, basic, special_pay, pay_scale,
             da, hra, gross_earning, provident_fund, professional, advance, tds, esic,
             total_deductions, net_pay, cpf, esic_contribution, medical_contribution)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                working_days = VALUES(working_days),
                reported_days = VALUES(reported_days),
                basic = VALUES(basic),
                special_pay = VALUES(special_pay),
                pay_scale = VALUES(pay_scale),
                da = VALUES(da),
                hra = VALUES(hra),
                gross_earning = VALUES(gross_earning),
                provident_fund = VALUES(provident_fund),
                professional = VALUES(professional),
                advance = VALUES(advance),
                tds = VALUES(tds),
                esic = VALUES(esic),
                total_deductions = VALUES(total_deductions),
                net_pay = VALUES(net_pay),
                cpf = VALUES(cpf),
                esic_contribution = VALUES(esic_contribution),
                medical_contribution = VALUES(medical_contribution)
            "#,
        )
        .bind(breakdown.employee_id)
        .bind(breakdown.month.first_day())
        .bind(f.working_days)
        .bind(f.reported_days)
        .bind(f.basic)
        .bind(f.special_pay)
        .bind(f.pay_scale)
        .bind(f.da)
        .bind(f.hra)
        .bind(f.gross_earning)
        .bind(f.provident_fund)
        .bind(f.professional)
        .bind(f.advance)
        .bind(f.tds)
        .bind(f.esic)
        .bind(f.total_deductions)
        .bind(f.net_pay)
        .bind(f.cpf)
        .bind(f.esic_contribution)
        .bind(f.medical_contribution)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "failed to save payroll of employee {} for {}",
                breakdown.employee_id, breakdown.month
            )
        })?;

        Ok(())
    }

    async fn breakdowns_for_month(&self, month: PayrollMonth) -> anyhow::Result<Vec<PayrollBreakdown>> {
        let sql = format!(
            "SELECT {} FROM payrolls WHERE month = ? ORDER BY employee_id",
            PAYROLL_COLUMNS
        );

        let rows = sqlx::query_as::<_, Payroll>(&sql)
            .bind(month.first_day())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to list payrolls for {month}"))?;

        Ok(rows.into_iter().map(PayrollBreakdown::from).collect())
    }

    async fn delete_older_than(&self, cutoff: PayrollMonth) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM payrolls WHERE month < ?")
            .bind(cutoff.first_day())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete payrolls older than {cutoff}"))?;

        Ok(result.rows_affected())
    }
}
