use crate::{
    auth::{
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    models::{AdminCredentialSql, LoginReqDto, LoginResponse},
};
use actix_web::{HttpResponse, Responder, web};
use anyhow::{Context, anyhow};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Admin login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let email = user.email.trim().to_lowercase();

    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::validation("Email and password are required"));
    }

    debug!("Fetching admin credential");

    let admin = sqlx::query_as::<_, AdminCredentialSql>(
        r#"
        SELECT admin_id, email, password_hash
        FROM admin_credentials
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(admin) = admin else {
        info!("Invalid credentials: admin not found");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if let Err(e) = verify_password(&user.password, &admin.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let (access_token, claims) = generate_access_token(
        admin.admin_id,
        admin.email,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign token");
        anyhow!("failed to sign token")
    })?;

    info!(jti = %claims.jti, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        expires_in: config.access_token_ttl,
    }))
}

/// Admin logout
///
/// Tokens are stateless; the client drops its copy.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    tag = "Auth"
)]
pub async fn logout() -> impl Responder {
    HttpResponse::NoContent().finish()
}

/// Creates the admin credential from `ADMIN_EMAIL`/`ADMIN_PASSWORD` when no
/// row exists for that email.
pub async fn seed_admin(pool: &MySqlPool, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        debug!("No admin credential configured for seeding");
        return Ok(());
    };

    let email = email.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM admin_credentials WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .context("failed to look up admin credential")?;

    if exists {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow!("failed to hash password: {e}"))?;

    sqlx::query("INSERT INTO admin_credentials (admin_id, email, password_hash) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(&email)
        .bind(hashed)
        .execute(pool)
        .await
        .context("failed to insert admin credential")?;

    info!(%email, "Admin credential seeded");
    Ok(())
}
