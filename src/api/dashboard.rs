use crate::{error::ApiError, model::leave_request::LeaveStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 42)]
    pub total_employees: i64,
    #[schema(example = 35)]
    pub checked_in_today: i64,
    #[schema(example = 3)]
    pub on_leave_today: i64,
    #[schema(example = 5)]
    pub pending_leave_requests: i64,
}

/// Headline counts for the admin dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard counts", body = DashboardStats)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM employees) AS total_employees,
            (SELECT COUNT(DISTINCT employee_id) FROM attendance WHERE date = ?) AS checked_in_today,
            (SELECT COUNT(DISTINCT employee_id) FROM leave_requests
                WHERE status = ? AND ? BETWEEN start_date AND end_date) AS on_leave_today,
            (SELECT COUNT(*) FROM leave_requests WHERE status = ?) AS pending_leave_requests
        "#,
    )
    .bind(today)
    .bind(LeaveStatus::Approved.to_string())
    .bind(today)
    .bind(LeaveStatus::Pending.to_string())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to load dashboard stats");
        ApiError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(stats))
}
