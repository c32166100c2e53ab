use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@company.com")]
    pub email: String,
    #[schema(example = "change-me")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: usize,
}

#[derive(FromRow)]
pub struct AdminCredentialSql {
    pub admin_id: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub admin_id: String,
    /// Admin email
    pub sub: String,
    pub exp: usize,
    pub jti: String,
}
