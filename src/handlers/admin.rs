use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{PaymentService, SettingsService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户列表"),
        (status = 403, description = "非管理员")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service.list_users(&caller, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/block",
    tag = "admin",
    request_body = SetBlockedRequest,
    params(
        ("user_id" = String, Path, description = "用户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "封禁状态已更新", body = UserResponse),
        (status = 403, description = "非管理员"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn set_user_blocked(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<SetBlockedRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let user_id = path.into_inner();

    match user_service
        .set_user_blocked(&caller, &user_id, request.blocked)
        .await
    {
        Ok(user) => {
            let message = if user.is_blocked {
                "用户已封禁"
            } else {
                "用户已解封"
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": user,
                "message": message
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/credits",
    tag = "admin",
    request_body = AdjustCreditsRequest,
    params(
        ("user_id" = String, Path, description = "用户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "积分已调整", body = UserResponse),
        (status = 403, description = "非管理员"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn adjust_credits(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<AdjustCreditsRequest>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let user_id = path.into_inner();

    match user_service
        .adjust_credits(&caller, &user_id, request.amount)
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user,
            "message": "积分已调整"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "admin",
    params(
        ("status" = Option<PaymentStatus>, Query, description = "按状态筛选"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "付款请求列表"),
        (status = 403, description = "非管理员")
    )
)]
pub async fn list_payments(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    query: web::Query<PaymentQuery>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.list_all(&caller, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/payments/{payment_id}/approve",
    tag = "admin",
    params(
        ("payment_id" = String, Path, description = "付款请求ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已核销并为用户加分", body = PaymentRequest),
        (status = 400, description = "请求已处理"),
        (status = 403, description = "非管理员"),
        (status = 404, description = "请求、套餐或用户不存在")
    )
)]
pub async fn approve_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let payment_id = path.into_inner();

    match payment_service.approve(&caller, &payment_id).await {
        Ok(payment) => {
            let message = format!("来自 {} 的付款已核销", payment.user_email);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": payment,
                "message": message
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/payments/{payment_id}/reject",
    tag = "admin",
    params(
        ("payment_id" = String, Path, description = "付款请求ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已驳回", body = PaymentRequest),
        (status = 400, description = "请求已处理"),
        (status = 403, description = "非管理员"),
        (status = 404, description = "请求不存在")
    )
)]
pub async fn reject_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let payment_id = path.into_inner();

    match payment_service.reject(&caller, &payment_id).await {
        Ok(payment) => {
            let message = format!("来自 {} 的付款已驳回", payment.user_email);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": payment,
                "message": message
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "后台统计数据", body = DashboardStats),
        (status = 403, description = "非管理员")
    )
)]
pub async fn dashboard(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.dashboard_stats(&caller).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    request_body = AppSettings,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "设置已整体替换", body = AppSettings),
        (status = 400, description = "设置校验失败"),
        (status = 403, description = "非管理员")
    )
)]
pub async fn update_settings(
    settings_service: web::Data<SettingsService>,
    req: HttpRequest,
    request: web::Json<AppSettings>,
) -> Result<HttpResponse> {
    let caller = match current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match settings_service
        .update_settings(&caller, request.into_inner())
        .await
    {
        Ok(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings,
            "message": "设置保存成功"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::get().to(list_users))
            .route("/users/{user_id}/block", web::post().to(set_user_blocked))
            .route("/users/{user_id}/credits", web::post().to(adjust_credits))
            .route("/payments", web::get().to(list_payments))
            .route(
                "/payments/{payment_id}/approve",
                web::post().to(approve_payment),
            )
            .route(
                "/payments/{payment_id}/reject",
                web::post().to(reject_payment),
            )
            .route("/dashboard", web::get().to(dashboard))
            .route("/settings", web::put().to(update_settings)),
    );
}
