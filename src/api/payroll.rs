use actix_web::{
    HttpResponse, Responder,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::{
    api::MonthQuery,
    config::Config,
    error::ApiError,
    payroll::{
        PayrollBreakdown, PayrollMonth, RawPayrollInput, export,
        service::{PayrollService, PayrollSheetRow, PurgeReport, SaveAllReport},
    },
    store::MySqlStore,
};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Number of employees listed on the workbook's "Skipped" sheet.
const SKIPPED_HEADER: &str = "X-Payroll-Skipped";

fn service<'a>(store: &'a MySqlStore, config: &Config) -> PayrollService<'a, MySqlStore> {
    PayrollService::new(store, config.professional_tax_default)
}

/// Month payroll sheet
///
/// One row per employee. Rows that cannot be computed carry an `error`
/// instead of a breakdown.
#[utoipa::path(
    get,
    path = "/api/payroll",
    params(MonthQuery),
    responses(
        (status = 200, description = "Payroll sheet for the month", body = [PayrollSheetRow]),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn month_sheet(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.month()?;

    let rows = service(&store, &config)
        .month_sheet(month)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Payroll breakdown of one employee
#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Payroll breakdown", body = PayrollBreakdown),
        (status = 400, description = "Invalid month or missing professional tax"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_payroll(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let month = query.month()?;

    let breakdown = service(&store, &config)
        .resolve(employee_id, month)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(breakdown))
}

/// Recalculate with edits
///
/// Returns the breakdown with the given fields applied. Nothing is saved.
/// Basic and special pay always come from the employee record.
#[utoipa::path(
    post,
    path = "/api/payroll/{employee_id}/recalculate",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    request_body = RawPayrollInput,
    responses(
        (status = 200, description = "Recalculated breakdown", body = PayrollBreakdown),
        (status = 400, description = "Invalid month or missing professional tax"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn recalculate_payroll(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
    body: web::Json<RawPayrollInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let month = query.month()?;

    let breakdown = service(&store, &config)
        .recalculate(employee_id, month, &body)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(breakdown))
}

/// Save payroll
///
/// Recalculates with the given fields and stores the result for the month,
/// replacing any earlier save.
#[utoipa::path(
    put,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        MonthQuery
    ),
    request_body = RawPayrollInput,
    responses(
        (status = 200, description = "Saved breakdown", body = PayrollBreakdown),
        (status = 400, description = "Invalid month or missing professional tax"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_payroll(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
    body: web::Json<RawPayrollInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let month = query.month()?;

    let breakdown = service(&store, &config)
        .save(employee_id, month, &body)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(breakdown))
}

/// Saved payrolls of a month, as stored
#[utoipa::path(
    get,
    path = "/api/payroll/saved",
    params(MonthQuery),
    responses(
        (status = 200, description = "Saved breakdowns", body = [PayrollBreakdown]),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn saved_payrolls(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.month()?;

    let saved = service(&store, &config)
        .saved_for_month(month)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(saved))
}

/// Save every employee's payroll for a month
#[utoipa::path(
    post,
    path = "/api/payroll/save-all",
    params(MonthQuery),
    responses(
        (status = 200, description = "Saved count and per-employee failures", body = SaveAllReport),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_all_payrolls(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.month()?;

    let report = service(&store, &config)
        .save_all(month)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(report))
}

/// Download the month's payroll workbook
///
/// Employees whose payroll cannot be computed are listed on a "Skipped"
/// sheet with the reason, and counted in `X-Payroll-Skipped`.
#[utoipa::path(
    get,
    path = "/api/payroll/export",
    params(MonthQuery),
    responses(
        (status = 200, description = "xlsx workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            headers(
                ("X-Payroll-Skipped" = u32, description = "Employees left out of the payroll sheet")
            )
        ),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_payroll(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let month = query.month()?;

    let sheet = service(&store, &config)
        .month_sheet(month)
        .await
        .map_err(ApiError::from)?;
    let (rows, skipped) = export::split_sheet(sheet);

    for row in &skipped {
        tracing::warn!(employee_id = row.employee.id, %month, reason = %row.reason, "Row left out of export");
    }

    let bytes = export::export_month(&rows, &skipped, month).map_err(ApiError::from)?;

    tracing::info!(%month, rows = rows.len(), skipped = skipped.len(), "Payroll exported");
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((SKIPPED_HEADER, skipped.len().to_string()))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(export::file_name(month))],
        })
        .body(bytes))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CleanupQuery {
    /// Months to keep; the configured retention when absent.
    #[param(example = 12)]
    pub older_than_months: Option<u32>,
}

/// Delete old saved payrolls
///
/// Removes saved records for months before the current month minus the
/// given number of months.
#[utoipa::path(
    delete,
    path = "/api/payroll/cleanup",
    params(CleanupQuery),
    responses(
        (status = 200, description = "Cutoff month and deleted count", body = PurgeReport),
        (status = 400, description = "Retention must be at least one month", body = Object, example = json!({
            "message": "older_than_months must be at least 1"
        }))
    ),
    tag = "Payroll",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cleanup_payrolls(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    query: web::Query<CleanupQuery>,
) -> actix_web::Result<impl Responder> {
    let months = query
        .older_than_months
        .unwrap_or(config.payroll_retention_months);

    if months == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "older_than_months must be at least 1"
        })));
    }

    let report = service(&store, &config)
        .purge_older_than(PayrollMonth::current(), months)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(report))
}
