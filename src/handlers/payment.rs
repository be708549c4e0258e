use crate::middlewares::current_user;
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/payments",
    tag = "payment",
    request_body = CreatePaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "付款请求已提交待核销", body = PaymentRequest),
        (status = 400, description = "参数错误"),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn create_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .create_request(&caller, request.into_inner())
        .await
    {
        Ok(payment) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            payment,
            "付款请求已提交，等待管理员核销".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payments",
    tag = "payment",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "本人付款记录"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_payments(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.list_for_user(&caller, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::post().to(create_payment))
            .route("", web::get().to(get_payments)),
    );
}
