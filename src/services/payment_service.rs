use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::user_service::ensure_admin;
use crate::storage::StateStore;
use crate::utils::generate_id;
use chrono::Utc;

#[derive(Clone)]
pub struct PaymentService {
    store: StateStore,
}

impl PaymentService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// 用户提交付款核销请求，新请求置顶且始终为 pending
    pub async fn create_request(
        &self,
        caller: &AuthUser,
        request: CreatePaymentRequest,
    ) -> AppResult<PaymentRequest> {
        let trx_id = request.trx_id.trim().to_string();
        if trx_id.is_empty() {
            return Err(AppError::ValidationError(
                "交易流水号不能为空".to_string(),
            ));
        }

        let mut state = self.store.write().await;

        if let Some(user) = state.users.iter().find(|u| u.id == caller.id)
            && user.is_blocked
        {
            return Err(AppError::Forbidden(
                "Your account has been blocked".to_string(),
            ));
        }

        let package = state
            .settings
            .find_package(&request.package_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Credit package not found".to_string()))?;

        let payment = PaymentRequest {
            id: generate_id("payment"),
            user_id: caller.id.clone(),
            user_email: caller.email.clone(),
            package_id: package.id,
            package_name: package.name,
            trx_id,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        state.payments.insert(0, payment.clone());
        self.store.persist(&state);

        log::info!(
            "Payment request {} submitted by {} for package {}",
            payment.id,
            payment.user_email,
            payment.package_name
        );
        Ok(payment)
    }

    /// 用户自己的付款记录
    pub async fn list_for_user(
        &self,
        caller: &AuthUser,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PaymentRequest>> {
        let state = self.store.read().await;
        let payments: Vec<PaymentRequest> = state
            .payments
            .iter()
            .filter(|p| p.user_id == caller.id)
            .cloned()
            .collect();
        Ok(PaginatedResponse::from_vec(payments, params))
    }

    /// 管理员按状态筛选全部付款请求
    pub async fn list_all(
        &self,
        caller: &AuthUser,
        query: &PaymentQuery,
    ) -> AppResult<PaginatedResponse<PaymentRequest>> {
        ensure_admin(caller)?;

        let params = PaginationParams::new(query.page, query.per_page);
        let state = self.store.read().await;
        let payments: Vec<PaymentRequest> = state
            .payments
            .iter()
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        Ok(PaginatedResponse::from_vec(payments, &params))
    }

    /// 核准付款：给被引用用户加上套餐积分并置为 approved。
    /// 套餐或用户已不存在时拒绝，请求保持 pending；
    /// 终态请求拒绝重复流转，绝不二次加分
    pub async fn approve(&self, caller: &AuthUser, payment_id: &str) -> AppResult<PaymentRequest> {
        ensure_admin(caller)?;

        let mut state = self.store.write().await;
        let idx = state
            .payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or_else(|| AppError::NotFound("Payment request not found".to_string()))?;

        if state.payments[idx].status.is_terminal() {
            return Err(AppError::ValidationError(
                "付款请求已处理，不能重复流转".to_string(),
            ));
        }

        let user_id = state.payments[idx].user_id.clone();
        let package_id = state.payments[idx].package_id.clone();

        let credits = state
            .settings
            .find_package(&package_id)
            .map(|p| p.credits)
            .ok_or_else(|| AppError::NotFound("Credit package not found".to_string()))?;

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.credits += credits;

        state.payments[idx].status = PaymentStatus::Approved;
        let payment = state.payments[idx].clone();
        self.store.persist(&state);

        log::info!(
            "Payment {} approved, credited {} to user {}",
            payment.id,
            credits,
            payment.user_email
        );
        Ok(payment)
    }

    /// 驳回付款，不触碰积分
    pub async fn reject(&self, caller: &AuthUser, payment_id: &str) -> AppResult<PaymentRequest> {
        ensure_admin(caller)?;

        let mut state = self.store.write().await;
        let payment = state
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| AppError::NotFound("Payment request not found".to_string()))?;

        if payment.status.is_terminal() {
            return Err(AppError::ValidationError(
                "付款请求已处理，不能重复流转".to_string(),
            ));
        }

        payment.status = PaymentStatus::Rejected;
        let payment = payment.clone();
        self.store.persist(&state);

        log::info!("Payment {} rejected", payment.id);
        Ok(payment)
    }

    /// 管理后台统计卡片数据
    pub async fn dashboard_stats(&self, caller: &AuthUser) -> AppResult<DashboardStats> {
        ensure_admin(caller)?;

        let state = self.store.read().await;
        let pending = state
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .count() as i64;
        let approved: Vec<&PaymentRequest> = state
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Approved)
            .collect();

        // 套餐可能已被删除，缺失的按0计入营收
        let session_revenue = approved
            .iter()
            .map(|p| {
                state
                    .settings
                    .find_package(&p.package_id)
                    .map(|pkg| pkg.price)
                    .unwrap_or(0)
            })
            .sum();

        Ok(DashboardStats {
            total_users: state.users.len() as i64,
            pending_payments: pending,
            approved_payments: approved.len() as i64,
            session_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStore;
    use chrono::Utc;

    fn test_service() -> PaymentService {
        let dir = std::env::temp_dir().join(generate_id("pixelforge-payment-test"));
        PaymentService::new(StateStore::open(JsonStore::open(dir).unwrap()))
    }

    fn admin_caller() -> AuthUser {
        AuthUser {
            id: ADMIN_USER_ID.to_string(),
            email: "admin@pixelforge.app".to_string(),
            role: UserRole::Admin,
        }
    }

    fn user_caller(id: &str, email: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: email.to_string(),
            role: UserRole::User,
        }
    }

    async fn seed_user(service: &PaymentService, id: &str, email: &str, credits: i64) {
        let mut state = service.store.write().await;
        state.users.push(User {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: email.to_string(),
            credits,
            role: UserRole::User,
            is_blocked: false,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        });
        service.store.persist(&state);
    }

    fn buy_starter() -> CreatePaymentRequest {
        CreatePaymentRequest {
            package_id: "pkg1".to_string(),
            trx_id: "TRX1001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_request_is_pending_and_denormalized() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;

        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.user_email, "alice@x.com");
        assert_eq!(payment.package_name, "Starter Pack");

        // 新请求置顶
        let second = service
            .create_request(
                &user_caller("user_1", "alice@x.com"),
                CreatePaymentRequest {
                    package_id: "pkg2".to_string(),
                    trx_id: "TRX1002".to_string(),
                },
            )
            .await
            .unwrap();
        let state = service.store.read().await;
        assert_eq!(state.payments[0].id, second.id);
    }

    #[tokio::test]
    async fn test_create_request_unknown_package_fails() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;

        let err = service
            .create_request(
                &user_caller("user_1", "alice@x.com"),
                CreatePaymentRequest {
                    package_id: "pkg_missing".to_string(),
                    trx_id: "TRX1001".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let state = service.store.read().await;
        assert!(state.payments.is_empty());
    }

    #[tokio::test]
    async fn test_approve_credits_user_and_marks_approved() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        let approved = service.approve(&admin_caller(), &payment.id).await.unwrap();
        assert_eq!(approved.status, PaymentStatus::Approved);

        // Starter Pack 100 积分
        let state = service.store.read().await;
        assert_eq!(state.users[0].credits, 110);
    }

    #[tokio::test]
    async fn test_approve_with_deleted_package_leaves_pending() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        {
            let mut state = service.store.write().await;
            state.settings.credit_packages.retain(|p| p.id != "pkg1");
            service.store.persist(&state);
        }

        let err = service
            .approve(&admin_caller(), &payment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let state = service.store.read().await;
        assert_eq!(state.payments[0].status, PaymentStatus::Pending);
        assert_eq!(state.users[0].credits, 10);
    }

    #[tokio::test]
    async fn test_terminal_payment_never_double_credits() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        service.approve(&admin_caller(), &payment.id).await.unwrap();
        assert!(service.approve(&admin_caller(), &payment.id).await.is_err());
        assert!(service.reject(&admin_caller(), &payment.id).await.is_err());

        let state = service.store.read().await;
        assert_eq!(state.users[0].credits, 110);
        assert_eq!(state.payments[0].status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn test_reject_leaves_credits_untouched() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        let rejected = service.reject(&admin_caller(), &payment.id).await.unwrap();
        assert_eq!(rejected.status, PaymentStatus::Rejected);

        // 已驳回的请求不能再核准
        assert!(service.approve(&admin_caller(), &payment.id).await.is_err());

        let state = service.store.read().await;
        assert_eq!(state.users[0].credits, 10);
    }

    #[tokio::test]
    async fn test_transitions_require_admin() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let payment = service
            .create_request(&user_caller("user_1", "alice@x.com"), buy_starter())
            .await
            .unwrap();

        let caller = user_caller("user_1", "alice@x.com");
        assert!(matches!(
            service.approve(&caller, &payment.id).await.unwrap_err(),
            AppError::PermissionDenied
        ));
        assert!(matches!(
            service.reject(&caller, &payment.id).await.unwrap_err(),
            AppError::PermissionDenied
        ));
    }

    #[tokio::test]
    async fn test_unknown_payment_id() {
        let service = test_service();
        assert!(matches!(
            service
                .approve(&admin_caller(), "payment_missing")
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service
                .reject(&admin_caller(), "payment_missing")
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_all_filters_by_status() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        let caller = user_caller("user_1", "alice@x.com");
        let first = service.create_request(&caller, buy_starter()).await.unwrap();
        service
            .create_request(
                &caller,
                CreatePaymentRequest {
                    package_id: "pkg2".to_string(),
                    trx_id: "TRX1002".to_string(),
                },
            )
            .await
            .unwrap();
        service.approve(&admin_caller(), &first.id).await.unwrap();

        let pending = service
            .list_all(
                &admin_caller(),
                &PaymentQuery {
                    status: Some(PaymentStatus::Pending),
                    page: None,
                    per_page: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.items.len(), 1);
        assert_eq!(pending.items[0].trx_id, "TRX1002");

        let all = service
            .list_all(
                &admin_caller(),
                &PaymentQuery {
                    status: None,
                    page: None,
                    per_page: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(all.items.len(), 2);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let service = test_service();
        seed_user(&service, "user_1", "alice@x.com", 10).await;
        seed_user(&service, "user_2", "bob@x.com", 10).await;
        let caller = user_caller("user_1", "alice@x.com");

        let first = service.create_request(&caller, buy_starter()).await.unwrap();
        service
            .create_request(
                &caller,
                CreatePaymentRequest {
                    package_id: "pkg2".to_string(),
                    trx_id: "TRX1002".to_string(),
                },
            )
            .await
            .unwrap();
        service.approve(&admin_caller(), &first.id).await.unwrap();

        let stats = service.dashboard_stats(&admin_caller()).await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.pending_payments, 1);
        assert_eq!(stats.approved_payments, 1);
        // Starter Pack 价格 50
        assert_eq!(stats.session_revenue, 50);
    }
}
