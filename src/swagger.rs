use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::settings::get_settings,
        handlers::payment::create_payment,
        handlers::payment::get_payments,
        handlers::generation::generate_image,
        handlers::admin::list_users,
        handlers::admin::set_user_blocked,
        handlers::admin::adjust_credits,
        handlers::admin::list_payments,
        handlers::admin::approve_payment,
        handlers::admin::reject_payment,
        handlers::admin::dashboard,
        handlers::admin::update_settings,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            SignupRequest,
            LoginRequest,
            AuthResponse,
            SetBlockedRequest,
            AdjustCreditsRequest,
            PaymentStatus,
            PaymentRequest,
            CreatePaymentRequest,
            PaymentQuery,
            DashboardStats,
            PaymentSettings,
            CreditPackage,
            AppSettings,
            AspectRatio,
            GenerateImageRequest,
            GeneratedImage,
            GenerateImageResponse,
            PaginationParams,
            PaginationInfo,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "注册、登录与会话"),
        (name = "settings", description = "站点设置"),
        (name = "payment", description = "付款核销请求"),
        (name = "generation", description = "图片生成"),
        (name = "admin", description = "管理后台")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
