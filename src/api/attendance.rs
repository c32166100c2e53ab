use crate::{
    api::MonthQuery,
    error::ApiError,
    model::{attendance::Attendance, employee::EmployeeSummary, payroll::AttendanceCount},
    store::{EmployeeAttendanceStore, MySqlStore},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::{HashMap, HashSet};
use strum_macros::{AsRefStr, Display};
use tracing::{debug, info};
use utoipa::ToSchema;

/// A check-in/out or location ping for one employee-day.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,
    /// Defaults to today.
    #[schema(example = "2026-01-15", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    #[schema(example = "09:05:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:10:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayStatus {
    Present,
    Leave,
    Absent,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LastLocation {
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub located_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyStatusRow {
    pub employee: EmployeeSummary,
    pub status: DayStatus,
    #[schema(value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub location: Option<LastLocation>,
}

/// One row per employee, present first, then on leave, then absent.
pub fn build_board(
    employees: Vec<EmployeeSummary>,
    today: &[Attendance],
    on_leave: &HashSet<u64>,
) -> Vec<DailyStatusRow> {
    let by_employee: HashMap<u64, &Attendance> =
        today.iter().map(|a| (a.employee_id, a)).collect();

    let mut rows: Vec<DailyStatusRow> = employees
        .into_iter()
        .map(|employee| match by_employee.get(&employee.id) {
            Some(record) => DailyStatusRow {
                status: DayStatus::Present,
                check_in: record.check_in,
                check_out: record.check_out,
                location: match (record.latitude, record.longitude) {
                    (Some(latitude), Some(longitude)) => Some(LastLocation {
                        address: record.address.clone(),
                        latitude,
                        longitude,
                        accuracy: record.accuracy,
                        located_at: record.located_at,
                    }),
                    _ => None,
                },
                employee,
            },
            None => DailyStatusRow {
                status: if on_leave.contains(&employee.id) {
                    DayStatus::Leave
                } else {
                    DayStatus::Absent
                },
                check_in: None,
                check_out: None,
                location: None,
                employee,
            },
        })
        .collect();

    // stable: keeps employee order within a status
    rows.sort_by_key(|row| row.status);
    rows
}

/// Record attendance
///
/// Creates the day's record or fills in the given fields of an existing one.
/// A check-in time already set is kept.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = RecordAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded"
        })),
        (status = 400, description = "Invalid location"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let date = payload.date.unwrap_or_else(|| Local::now().date_naive());

    let located_at = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ApiError::validation("latitude/longitude out of range").into());
            }
            Some(Utc::now())
        }
        (None, None) => None,
        _ => return Err(ApiError::validation("latitude and longitude go together").into()),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
        (employee_id, date, check_in, check_out, address, latitude, longitude, accuracy, located_at)
        VALUES (?, ?, COALESCE(?, CURTIME()), ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            check_in = COALESCE(check_in, VALUES(check_in)),
            check_out = COALESCE(VALUES(check_out), check_out),
            address = COALESCE(VALUES(address), address),
            latitude = COALESCE(VALUES(latitude), latitude),
            longitude = COALESCE(VALUES(longitude), longitude),
            accuracy = COALESCE(VALUES(accuracy), accuracy),
            located_at = COALESCE(VALUES(located_at), located_at)
        "#,
    )
    .bind(payload.employee_id)
    .bind(date)
    .bind(payload.check_in)
    .bind(payload.check_out)
    .bind(payload.address.as_deref().map(str::trim))
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.accuracy)
    .bind(located_at)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!(employee_id = payload.employee_id, %date, "Attendance recorded");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Attendance recorded"
            })))
        }
        // FK violation: unknown employee
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Err(ApiError::not_found("Employee not found").into())
        }
        Err(e) => {
            tracing::error!(error = %e, employee_id = payload.employee_id, "Recording attendance failed");
            Err(ApiError::Database(e).into())
        }
    }
}

/// Today's board
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Every employee with today's status", body = [DailyStatusRow])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_board(store: web::Data<MySqlStore>) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let employees = store.employees().await.map_err(ApiError::Internal)?;

    let records = sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE date = ?")
        .bind(today)
        .fetch_all(store.pool())
        .await
        .map_err(ApiError::Database)?;

    let on_leave: HashSet<u64> = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT DISTINCT employee_id
        FROM leave_requests
        WHERE status = 'Approved'
        AND ? BETWEEN start_date AND end_date
        "#,
    )
    .bind(today)
    .fetch_all(store.pool())
    .await
    .map_err(ApiError::Database)?
    .into_iter()
    .collect();

    debug!(employees = employees.len(), present = records.len(), "Built today's board");

    Ok(HttpResponse::Ok().json(build_board(employees, &records, &on_leave)))
}

/// Attendance history for a month, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Attendance records", body = [Attendance]),
        (status = 400, description = "Invalid month")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_history(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let month = query.month()?;

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT * FROM attendance
        WHERE employee_id = ?
        AND date BETWEEN ? AND ?
        ORDER BY date DESC
        "#,
    )
    .bind(employee_id)
    .bind(month.first_day())
    .bind(month.last_day())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, %month, "Failed to fetch attendance");
        ApiError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(records))
}

/// Working and reported days for a month
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/count",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Day counts", body = AttendanceCount),
        (status = 400, description = "Invalid month")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_count(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let month = query.month()?;

    let count = store
        .attendance_count(employee_id, month)
        .await
        .map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: u64, name: &str) -> EmployeeSummary {
        EmployeeSummary {
            id,
            employee_code: format!("EMP-{id:03}"),
            name: name.into(),
            designation: "Engineer".into(),
        }
    }

    fn checked_in(employee_id: u64, located: bool) -> Attendance {
        Attendance {
            id: employee_id,
            employee_id,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            check_out: None,
            address: located.then(|| "MG Road".to_string()),
            latitude: located.then_some(12.97),
            longitude: located.then_some(77.59),
            accuracy: located.then_some(15.0),
            located_at: None,
        }
    }

    #[test]
    fn board_orders_present_leave_absent() {
        let employees = vec![
            employee(1, "Absent One"),
            employee(2, "On Leave"),
            employee(3, "Present"),
            employee(4, "Absent Two"),
        ];
        let on_leave = HashSet::from([2]);

        let board = build_board(employees, &[checked_in(3, true)], &on_leave);

        let order: Vec<(u64, DayStatus)> = board.iter().map(|r| (r.employee.id, r.status)).collect();
        assert_eq!(
            order,
            vec![
                (3, DayStatus::Present),
                (2, DayStatus::Leave),
                (1, DayStatus::Absent),
                (4, DayStatus::Absent),
            ]
        );
        assert_eq!(board[0].location.as_ref().unwrap().address.as_deref(), Some("MG Road"));
    }

    #[test]
    fn attendance_beats_leave() {
        let board = build_board(
            vec![employee(1, "Came Anyway")],
            &[checked_in(1, false)],
            &HashSet::from([1]),
        );

        assert_eq!(board[0].status, DayStatus::Present);
        assert!(board[0].location.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(DayStatus::Leave).unwrap(), json!("leave"));
        assert_eq!(DayStatus::Absent.to_string(), "absent");
    }
}
