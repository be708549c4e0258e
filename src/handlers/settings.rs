use crate::models::ApiResponse;
use crate::services::SettingsService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "站点设置（收款方式与积分套餐）"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_settings(settings_service: web::Data<SettingsService>) -> Result<HttpResponse> {
    match settings_service.get_settings().await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiResponse::success(settings))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/settings").route("", web::get().to(get_settings)));
}
