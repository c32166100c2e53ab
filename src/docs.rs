use crate::api::attendance::{DailyStatusRow, DayStatus, LastLocation, RecordAttendance};
use crate::api::dashboard::DashboardStats;
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::leave_request::{
    CreateLeave, EmployeeLeaveMonths, LeaveFilter, LeaveListResponse, LeaveResponse,
};
use crate::model::attendance::Attendance;
use crate::model::employee::{Employee, EmployeeSummary};
use crate::model::leave_request::{LeaveStatus, LeaveType};
use crate::model::payroll::AttendanceCount;
use crate::models::{LoginReqDto, LoginResponse};
use crate::payroll::service::{PayrollSheetRow, PurgeReport, SaveAllReport, SaveFailure};
use crate::payroll::{PayrollBreakdown, PayrollFigures, RawPayrollInput};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Admin API",
        version = "1.0.0",
        description = r#"
## HR and Payroll Administration

Admin backend for a single organisation.

### Key Features
- **Employees**: create, update, list and remove employee records with salary basis
- **Attendance**: daily check-in and location pings, today's board, monthly counts
- **Leave**: review, approve or reject requests; yearly analytics
- **Payroll**: monthly breakdowns with DA, HRA, PF, ESIC and professional tax,
  admin overrides, bulk save, spreadsheet export and retention cleanup

### Amounts
Payroll amounts travel as decimal strings (`"15000"`). Inputs accept strings
or numbers; anything unparseable falls back to its default.

### Security
Every `/api` endpoint needs a **JWT Bearer** token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::record_attendance,
        crate::api::attendance::today_board,
        crate::api::attendance::attendance_history,
        crate::api::attendance::attendance_count,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_analytics_report,

        crate::api::dashboard::dashboard_stats,

        crate::api::payroll::month_sheet,
        crate::api::payroll::get_payroll,
        crate::api::payroll::recalculate_payroll,
        crate::api::payroll::save_payroll,
        crate::api::payroll::saved_payrolls,
        crate::api::payroll::save_all_payrolls,
        crate::api::payroll::export_payroll,
        crate::api::payroll::cleanup_payrolls
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            CreateEmployee,
            Employee,
            EmployeeSummary,
            EmployeeListResponse,
            RecordAttendance,
            Attendance,
            AttendanceCount,
            DayStatus,
            LastLocation,
            DailyStatusRow,
            CreateLeave,
            LeaveType,
            LeaveStatus,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            EmployeeLeaveMonths,
            DashboardStats,
            RawPayrollInput,
            PayrollFigures,
            PayrollBreakdown,
            PayrollSheetRow,
            SaveFailure,
            SaveAllReport,
            PurgeReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Admin sign-in"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Dashboard", description = "Dashboard counts"),
        (name = "Payroll", description = "Payroll computation and export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_payroll_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/payroll/{employee_id}/recalculate"));
        assert!(doc.paths.paths.contains_key("/api/payroll/export"));
        assert!(doc.paths.paths.contains_key("/auth/login"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("PayrollBreakdown"));
    }
}
