use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `admin` or `employee`; defaults to `employee`
    pub role: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct RefreshRequest { pub refresh_token: String }

#[derive(ToSchema)]
pub struct UserViewDoc { pub id: Uuid, pub name: String, pub email: String, pub role: String }

#[derive(ToSchema)]
pub struct AuthSessionDoc {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserViewDoc,
}

#[derive(ToSchema)]
pub struct AccessGrantDoc { pub access_token: String }

#[derive(ToSchema)]
pub struct ErrorBody { pub error: String, pub code: u16 }

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::me,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            UserViewDoc,
            AuthSessionDoc,
            AccessGrantDoc,
            ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth")
    )
)]
pub struct ApiDoc;
