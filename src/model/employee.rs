use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "name": "Asha Rao",
        "email": "asha.rao@company.com",
        "designation": "Field Engineer",
        "base_salary": 31000.0,
        "special_salary": 5000.0,
        "epf_uan_number": "100200300400",
        "esic_number": "3100123456",
        "date_of_joining": "2024-01-01",
        "created_at": "2024-01-01T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Asha Rao")]
    pub name: String,

    #[schema(example = "asha.rao@company.com")]
    pub email: String,

    #[schema(example = "Field Engineer")]
    pub designation: String,

    #[schema(example = 31000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub special_salary: f64,

    #[schema(example = "100200300400", nullable = true)]
    pub epf_uan_number: Option<String>,

    #[schema(example = "3100123456", nullable = true)]
    pub esic_number: Option<String>,

    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub date_of_joining: Option<NaiveDate>,

    #[schema(example = "2024-01-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Identity columns shown next to payroll and attendance rows.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeSummary {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
    pub designation: String,
}
