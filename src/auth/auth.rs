use crate::{auth::jwt::verify_token, config::Config};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

/// The signed-in admin, taken from the bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub admin_id: String,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected routes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ));
            }
        };

        match verify_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(AuthUser {
                admin_id: claims.admin_id,
                email: claims.sub,
            })),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid token"))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::test::TestRequest;

    pub fn test_config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 600,
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            salary_cache_ttl: 300,
            payroll_retention_months: 12,
            professional_tax_default: Some(200.0),
            admin_email: None,
            admin_password: None,
        }
    }

    #[actix_web::test]
    async fn extracts_admin_from_bearer_token() {
        let config = test_config();
        let (token, _) = generate_access_token(
            "a-1".into(),
            "admin@company.com".into(),
            &config.jwt_secret,
            600,
        )
        .unwrap();

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(config))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();

        assert_eq!(user.admin_id, "a-1");
        assert_eq!(user.email, "admin@company.com");
    }

    #[actix_web::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(test_config()))
            .to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer nope"))
            .app_data(Data::new(test_config()))
            .to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());
    }
}
