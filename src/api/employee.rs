use crate::{
    error::ApiError,
    model::employee::Employee,
    store::MySqlStore,
    utils::{
        db_utils::{ColumnKind, build_update_sql, execute_update},
        employee_code_filter,
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

/// Columns a partial update may touch.
const EMPLOYEE_COLUMNS: &[(&str, ColumnKind)] = &[
    ("employee_code", ColumnKind::Text),
    ("name", ColumnKind::Text),
    ("email", ColumnKind::Text),
    ("designation", ColumnKind::Text),
    ("base_salary", ColumnKind::Amount),
    ("special_salary", ColumnKind::Amount),
    ("epf_uan_number", ColumnKind::NullableText),
    ("esic_number", ColumnKind::NullableText),
    ("date_of_joining", ColumnKind::NullableDate),
];

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "asha.rao@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Field Engineer")]
    #[serde(default)]
    pub designation: String,
    #[schema(example = 31000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    #[serde(default)]
    pub special_salary: f64,
    pub epf_uan_number: Option<String>,
    pub esic_number: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date_of_joining: Option<NaiveDate>,
}

impl CreateEmployee {
    fn validate(&self) -> Result<(), ApiError> {
        if self.employee_code.trim().is_empty() {
            return Err(ApiError::validation("employee_code is required"));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name is required"));
        }
        if !self.email.contains('@') {
            return Err(ApiError::validation("email is invalid"));
        }
        for (field, value) in [
            ("base_salary", self.base_salary),
            ("special_salary", self.special_salary),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ApiError::validation(format!("{field} must be a non-negative amount")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Matches name, email, code or designation.
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// true => code already used
async fn is_code_taken(code: &str, pool: &MySqlPool) -> Result<bool, ApiError> {
    // Cuckoo filter: a miss means the code is definitely free.
    if !employee_code_filter::might_exist(code) {
        return Ok(false);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ? LIMIT 1)",
    )
    .bind(code)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully", "id": 1
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Employee code already exists", body = Object, example = json!({
            "message": "Employee code already exists"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    payload.validate()?;

    let code = employee_code_filter::normalize(&payload.employee_code);

    if is_code_taken(&code, pool.get_ref()).await? {
        return Err(ApiError::Conflict("Employee code already exists".into()).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, name, email, designation, base_salary, special_salary,
         epf_uan_number, esic_number, date_of_joining)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&code)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(payload.designation.trim())
    .bind(payload.base_salary)
    .bind(payload.special_salary)
    .bind(&payload.epf_uan_number)
    .bind(&payload.esic_number)
    .bind(payload.date_of_joining)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            employee_code_filter::insert(&code);
            let id = res.last_insert_id();
            info!(employee_id = id, employee_code = %code, "Employee created");

            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created successfully",
                "id": id
            })))
        }
        Err(e) if is_duplicate_key(&e) => {
            employee_code_filter::insert(&code);
            Err(ApiError::Conflict("Employee code already exists".into()).into())
        }
        Err(e) => {
            error!(error = %e, "Failed to Create Employee");
            Err(ApiError::Database(e).into())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    let where_clause = if search.is_some() {
        "WHERE name LIKE ? OR email LIKE ? OR employee_code LIKE ? OR designation LIKE ?"
    } else {
        ""
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(like) = &search {
        count_query = count_query.bind(like).bind(like).bind(like).bind(like);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ApiError::Database(e)
    })?;

    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    if let Some(like) = &search {
        data_query = data_query.bind(like).bind(like).bind(like).bind(like);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ApiError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
///
/// Accepts any subset of the employee columns. A salary change takes effect
/// in the next payroll computation, including for months already saved.
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee code already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let mut payload = body.into_inner();
    if let Some(code) = payload.get_mut("employee_code") {
        if let Some(s) = code.as_str() {
            *code = Value::String(employee_code_filter::normalize(s));
        }
    }

    let update = build_update_sql("employees", EMPLOYEE_COLUMNS, &payload, "id", employee_id)?;
    let new_code = payload
        .get("employee_code")
        .and_then(Value::as_str)
        .map(str::to_string);

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
        .bind(employee_id)
        .fetch_one(store.pool())
        .await
        .map_err(ApiError::Database)?;

    if !exists {
        return Err(ApiError::not_found("Employee not found").into());
    }

    match execute_update(store.pool(), update).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::Conflict("Employee code already exists".into()).into());
        }
        Err(e) => {
            error!(error = %e, employee_id, "Failed to update employee");
            return Err(ApiError::Database(e).into());
        }
    }

    if let Some(code) = new_code {
        employee_code_filter::insert(&code);
    }
    store.salary_cache().invalidate(employee_id).await;

    info!(employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
///
/// Attendance, leave requests and payrolls of the employee go with it.
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let code = sqlx::query_scalar::<_, String>("SELECT employee_code FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(store.pool())
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(store.pool())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete employee");
            ApiError::Database(e)
        })?;

    employee_code_filter::remove(&code);
    store.salary_cache().invalidate(employee_id).await;

    info!(employee_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::Database(e)
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(ApiError::not_found("Employee not found").into()),
    }
}
