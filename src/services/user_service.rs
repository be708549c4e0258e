use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::storage::StateStore;

#[derive(Clone)]
pub struct UserService {
    store: StateStore,
}

impl UserService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// 管理员查看用户列表
    pub async fn list_users(
        &self,
        caller: &AuthUser,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        ensure_admin(caller)?;

        let state = self.store.read().await;
        let users: Vec<UserResponse> = state
            .users
            .iter()
            .cloned()
            .map(UserResponse::from)
            .collect();
        Ok(PaginatedResponse::from_vec(users, params))
    }

    /// 按ID整体替换用户记录，封禁/解封走这里
    pub async fn update_user(&self, caller: &AuthUser, updated: User) -> AppResult<UserResponse> {
        ensure_admin(caller)?;

        let mut state = self.store.write().await;
        let entry = state
            .users
            .iter_mut()
            .find(|u| u.id == updated.id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        *entry = updated.clone();
        self.store.persist(&state);

        log::info!("User {} updated", updated.id);
        Ok(updated.into())
    }

    /// 封禁或解封用户
    pub async fn set_user_blocked(
        &self,
        caller: &AuthUser,
        user_id: &str,
        blocked: bool,
    ) -> AppResult<UserResponse> {
        ensure_admin(caller)?;

        let current = {
            let state = self.store.read().await;
            state
                .users
                .iter()
                .find(|u| u.id == user_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        };

        let mut updated = current;
        updated.is_blocked = blocked;
        self.update_user(caller, updated).await
    }

    /// 管理员增减积分，amount 可为负，结果余额最低截断为0
    pub async fn adjust_credits(
        &self,
        caller: &AuthUser,
        user_id: &str,
        amount: i64,
    ) -> AppResult<UserResponse> {
        ensure_admin(caller)?;

        let mut state = self.store.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.credits = (user.credits + amount).max(0);
        let response: UserResponse = user.clone().into();
        self.store.persist(&state);

        log::info!(
            "Credits adjusted for user {user_id} by {amount}, balance now {}",
            response.credits
        );
        Ok(response)
    }

    /// 扣减积分，余额不足时失败且不产生任何变更，成功返回剩余余额。
    /// 管理员走合成账号的内存余额
    pub async fn deduct_credits(&self, user_id: &str, amount: i64) -> AppResult<i64> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "扣减数量必须为正数".to_string(),
            ));
        }

        let mut state = self.store.write().await;

        if user_id == ADMIN_USER_ID {
            if state.admin_credits < amount {
                return Err(AppError::InsufficientCredits {
                    required: amount,
                    available: state.admin_credits,
                });
            }
            state.admin_credits -= amount;
            let remaining = state.admin_credits;
            self.store.persist(&state);
            return Ok(remaining);
        }

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.credits < amount {
            return Err(AppError::InsufficientCredits {
                required: amount,
                available: user.credits,
            });
        }

        user.credits -= amount;
        let remaining = user.credits;
        self.store.persist(&state);
        Ok(remaining)
    }

    /// 回补积分（生成失败退款用）
    pub async fn refund_credits(&self, user_id: &str, amount: i64) -> AppResult<i64> {
        let mut state = self.store.write().await;

        if user_id == ADMIN_USER_ID {
            state.admin_credits += amount;
            let remaining = state.admin_credits;
            self.store.persist(&state);
            return Ok(remaining);
        }

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.credits += amount;
        let remaining = user.credits;
        self.store.persist(&state);
        Ok(remaining)
    }

    /// 消费类操作前的封禁检查，数据层强制而非依赖路由
    pub async fn ensure_not_blocked(&self, user_id: &str) -> AppResult<()> {
        if user_id == ADMIN_USER_ID {
            return Ok(());
        }

        let state = self.store.read().await;
        let user = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Your account has been blocked".to_string(),
            ));
        }
        Ok(())
    }
}

/// 管理员专属操作的数据层角色检查
pub(crate) fn ensure_admin(caller: &AuthUser) -> AppResult<()> {
    if !caller.is_admin() {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStore;
    use crate::utils::generate_id;
    use chrono::Utc;

    fn test_service() -> UserService {
        let dir = std::env::temp_dir().join(generate_id("pixelforge-user-test"));
        UserService::new(StateStore::open(JsonStore::open(dir).unwrap()))
    }

    fn admin_caller() -> AuthUser {
        AuthUser {
            id: ADMIN_USER_ID.to_string(),
            email: "admin@pixelforge.app".to_string(),
            role: UserRole::Admin,
        }
    }

    fn user_caller(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: "alice@x.com".to_string(),
            role: UserRole::User,
        }
    }

    async fn seed_user(service: &UserService, id: &str, credits: i64) {
        let mut state = service.store.write().await;
        state.users.push(User {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: format!("{id}@x.com"),
            credits,
            role: UserRole::User,
            is_blocked: false,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        });
        service.store.persist(&state);
    }

    #[tokio::test]
    async fn test_deduct_credits_decrements_balance() {
        let service = test_service();
        seed_user(&service, "user_1", 10).await;

        let remaining = service.deduct_credits("user_1", 3).await.unwrap();
        assert_eq!(remaining, 7);

        let state = service.store.read().await;
        assert_eq!(state.users[0].credits, 7);
    }

    #[tokio::test]
    async fn test_deduct_credits_insufficient_balance_is_untouched() {
        let service = test_service();
        seed_user(&service, "user_1", 2).await;

        let err = service.deduct_credits("user_1", 5).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientCredits {
                required: 5,
                available: 2
            }
        ));

        let state = service.store.read().await;
        assert_eq!(state.users[0].credits, 2);
    }

    #[tokio::test]
    async fn test_deduct_credits_admin_uses_volatile_balance() {
        let service = test_service();

        let remaining = service.deduct_credits(ADMIN_USER_ID, 4).await.unwrap();
        assert_eq!(remaining, ADMIN_CREDITS - 4);

        let state = service.store.read().await;
        assert!(state.users.is_empty());
        assert_eq!(state.admin_credits, ADMIN_CREDITS - 4);
    }

    #[tokio::test]
    async fn test_deduct_credits_unknown_user() {
        let service = test_service();
        let err = service.deduct_credits("user_missing", 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_adjust_credits_clamps_at_zero() {
        let service = test_service();
        seed_user(&service, "user_1", 10).await;

        let response = service
            .adjust_credits(&admin_caller(), "user_1", -1_000_000)
            .await
            .unwrap();
        assert_eq!(response.credits, 0);

        let response = service
            .adjust_credits(&admin_caller(), "user_1", 25)
            .await
            .unwrap();
        assert_eq!(response.credits, 25);
    }

    #[tokio::test]
    async fn test_adjust_credits_requires_admin() {
        let service = test_service();
        seed_user(&service, "user_1", 10).await;

        let err = service
            .adjust_credits(&user_caller("user_1"), "user_1", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_set_user_blocked_replaces_entry() {
        let service = test_service();
        seed_user(&service, "user_1", 10).await;

        let blocked = service
            .set_user_blocked(&admin_caller(), "user_1", true)
            .await
            .unwrap();
        assert!(blocked.is_blocked);
        assert!(service.ensure_not_blocked("user_1").await.is_err());

        let unblocked = service
            .set_user_blocked(&admin_caller(), "user_1", false)
            .await
            .unwrap();
        assert!(!unblocked.is_blocked);
        assert!(service.ensure_not_blocked("user_1").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_unknown_id() {
        let service = test_service();
        let ghost = User {
            id: "user_ghost".to_string(),
            name: "Ghost".to_string(),
            email: "ghost@x.com".to_string(),
            credits: 0,
            role: UserRole::User,
            is_blocked: false,
            password_hash: String::new(),
            created_at: Utc::now(),
        };

        let err = service
            .update_user(&admin_caller(), ghost)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let service = test_service();
        seed_user(&service, "user_1", 10).await;
        seed_user(&service, "user_2", 10).await;

        let page = service
            .list_users(&admin_caller(), &PaginationParams::new(None, None))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 2);

        let err = service
            .list_users(&user_caller("user_1"), &PaginationParams::new(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }
}
