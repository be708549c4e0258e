use crate::middlewares::current_user;
use crate::models::*;
use crate::services::GenerationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/images/generate",
    tag = "generation",
    request_body = GenerateImageRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "生成成功", body = GenerateImageResponse),
        (status = 400, description = "参数错误或积分不足"),
        (status = 403, description = "账号已被封禁"),
        (status = 502, description = "生成服务调用失败，已退还积分")
    )
)]
pub async fn generate_image(
    generation_service: web::Data<GenerationService>,
    req: HttpRequest,
    request: web::Json<GenerateImageRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match generation_service
        .generate(&caller, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn generation_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/images").route("/generate", web::post().to(generate_image)));
}
