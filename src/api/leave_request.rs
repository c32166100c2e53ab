use crate::{
    error::ApiError,
    model::leave_request::{LeaveStatus, LeaveType},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "Fever")]
    pub cause: Option<String>,
}

impl CreateLeave {
    /// Calendar days covered, both ends included.
    fn duration(&self) -> Result<u32, ApiError> {
        if self.start_date > self.end_date {
            return Err(ApiError::validation("start_date cannot be after end_date"));
        }
        let days = (self.end_date - self.start_date).num_days() + 1;
        u32::try_from(days).map_err(|_| ApiError::validation("leave is too long"))
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "Asha Rao")]
    pub employee_name: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub duration: u32,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub cause: Option<String>,
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
}

const LEAVE_SELECT: &str = r#"
    SELECT l.id, l.employee_id, e.name AS employee_name, l.start_date, l.end_date,
           l.duration, l.leave_type, l.cause, l.status, l.submitted_at
    FROM leave_requests l
    JOIN employees e ON e.id = l.employee_id
"#;

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "Pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let duration = payload.duration()?;
    let employee_id = payload.employee_id;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, cause, start_date, end_date, duration, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.cause.as_deref().map(str::trim))
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(duration)
    .bind(LeaveStatus::Pending.to_string())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            tracing::info!(employee_id, leave_id = res.last_insert_id(), duration, "Leave request submitted");
            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "Leave request submitted",
                "id": res.last_insert_id(),
                "status": LeaveStatus::Pending
            })))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Err(ApiError::not_found("Employee not found").into())
        }
        Err(e) => {
            tracing::error!(error = %e, employee_id, "Failed to create leave request");
            Err(ApiError::Database(e).into())
        }
    }
}

/// Moves a pending request to `status`. Decided requests stay as they are.
async fn decide(
    pool: &MySqlPool,
    leave_id: u64,
    status: LeaveStatus,
) -> actix_web::Result<HttpResponse> {
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(status.to_string())
    .bind(leave_id)
    .bind(LeaveStatus::Pending.to_string())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, %status, "Leave decision failed");
        ApiError::Database(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::validation("Leave request not found or already processed").into());
    }

    tracing::info!(leave_id, %status, "Leave request decided");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {}", status.to_string().to_lowercase())
    })))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(pool.get_ref(), path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(pool.get_ref(), path.into_inner(), LeaveStatus::Rejected).await
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let sql = format!("{LEAVE_SELECT} WHERE l.id = ?");
    let leave = sqlx::query_as::<_, LeaveResponse>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            ApiError::Database(e)
        })?;

    match leave {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Err(ApiError::not_found("Leave request not found").into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND l.employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_ref() {
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::Str(status.as_ref()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests l{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        ApiError::Database(e)
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{LEAVE_SELECT}{where_sql} ORDER BY l.submitted_at DESC LIMIT ? OFFSET ?"
    );

    let mut data_q = sqlx::query_as::<_, LeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            ApiError::Database(e)
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[derive(Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// Calendar year; the current year when absent.
    #[param(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Debug, FromRow)]
pub struct ApprovedLeave {
    pub employee_id: u64,
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub duration: u32,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct EmployeeLeaveMonths {
    pub employee_id: u64,
    pub employee_name: String,
    /// Days of leave per month, January first.
    pub months: Vec<u32>,
    pub total: u32,
    /// Average days per month over the year.
    pub average: f64,
}

/// Sums approved leave per employee per month of `year`. A leave counts in
/// full toward the month it starts in.
pub fn leave_analytics(leaves: &[ApprovedLeave], year: i32) -> Vec<EmployeeLeaveMonths> {
    let mut by_employee: BTreeMap<u64, (String, [u32; 12])> = BTreeMap::new();

    for leave in leaves.iter().filter(|l| l.start_date.year() == year) {
        let (_, months) = by_employee
            .entry(leave.employee_id)
            .or_insert_with(|| (leave.employee_name.clone(), [0; 12]));
        months[leave.start_date.month0() as usize] += leave.duration;
    }

    by_employee
        .into_iter()
        .map(|(employee_id, (employee_name, months))| {
            let total: u32 = months.iter().sum();
            EmployeeLeaveMonths {
                employee_id,
                employee_name,
                months: months.to_vec(),
                total,
                average: (f64::from(total) / 12.0 * 100.0).round() / 100.0,
            }
        })
        .collect()
}

/// Approved leave per employee per month
#[utoipa::path(
    get,
    path = "/api/leave/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Monthly leave days per employee", body = [EmployeeLeaveMonths])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_analytics_report(
    pool: web::Data<MySqlPool>,
    query: web::Query<AnalyticsQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| Local::now().year());

    let leaves = sqlx::query_as::<_, ApprovedLeave>(
        r#"
        SELECT l.employee_id, e.name AS employee_name, l.start_date, l.duration
        FROM leave_requests l
        JOIN employees e ON e.id = l.employee_id
        WHERE l.status = ?
        AND YEAR(l.start_date) = ?
        "#,
    )
    .bind(LeaveStatus::Approved.to_string())
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, year, "Failed to fetch approved leaves");
        ApiError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(leave_analytics(&leaves, year)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leave(employee_id: u64, start: NaiveDate, duration: u32) -> ApprovedLeave {
        ApprovedLeave {
            employee_id,
            employee_name: format!("Employee {employee_id}"),
            start_date: start,
            duration,
        }
    }

    #[test]
    fn duration_counts_both_ends() {
        let request = CreateLeave {
            employee_id: 1,
            start_date: date(2026, 1, 5),
            end_date: date(2026, 1, 7),
            leave_type: LeaveType::Sick,
            cause: None,
        };
        assert_eq!(request.duration().unwrap(), 3);

        let same_day = CreateLeave {
            end_date: date(2026, 1, 5),
            ..request
        };
        assert_eq!(same_day.duration().unwrap(), 1);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let request = CreateLeave {
            employee_id: 1,
            start_date: date(2026, 1, 7),
            end_date: date(2026, 1, 5),
            leave_type: LeaveType::Annual,
            cause: None,
        };
        assert!(request.duration().is_err());
    }

    #[test]
    fn analytics_buckets_by_start_month() {
        let leaves = vec![
            leave(1, date(2026, 1, 30), 4),
            leave(1, date(2026, 1, 2), 1),
            leave(1, date(2026, 3, 10), 2),
            leave(2, date(2026, 12, 31), 5),
            leave(2, date(2025, 12, 20), 9),
        ];

        let report = leave_analytics(&leaves, 2026);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].months[0], 5);
        assert_eq!(report[0].months[2], 2);
        assert_eq!(report[0].total, 7);
        assert_eq!(report[0].average, 0.58);
        assert_eq!(report[1].months[11], 5);
        assert_eq!(report[1].total, 5);
    }

    #[test]
    fn leave_status_parses_stored_text() {
        assert_eq!("Approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert_eq!(LeaveType::Casual.to_string(), "casual");
    }
}
