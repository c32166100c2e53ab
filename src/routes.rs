use crate::{
    api::{attendance, dashboard, employee, leave_request, payroll},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // Only fails for a zero period or burst, both ruled out above.
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("").route(web::post().to(attendance::record_attendance)),
                    )
                    // before /{employee_id} so "today" is not taken for an id
                    .service(web::resource("/today").route(web::get().to(attendance::today_board)))
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(attendance::attendance_history)),
                    )
                    .service(
                        web::resource("/{employee_id}/count")
                            .route(web::get().to(attendance::attendance_count)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    .service(
                        web::resource("/analytics")
                            .route(web::get().to(leave_request::leave_analytics_report)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/dashboard").service(
                    web::resource("/stats").route(web::get().to(dashboard::dashboard_stats)),
                ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::month_sheet)))
                    .service(web::resource("/saved").route(web::get().to(payroll::saved_payrolls)))
                    .service(
                        web::resource("/save-all").route(web::post().to(payroll::save_all_payrolls)),
                    )
                    .service(web::resource("/export").route(web::get().to(payroll::export_payroll)))
                    .service(
                        web::resource("/cleanup").route(web::delete().to(payroll::cleanup_payrolls)),
                    )
                    // /payroll/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::save_payroll)),
                    )
                    .service(
                        web::resource("/{employee_id}/recalculate")
                            .route(web::post().to(payroll::recalculate_payroll)),
                    ),
            ),
    );
}
