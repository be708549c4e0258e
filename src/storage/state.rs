use crate::models::{ADMIN_CREDITS, AppSettings, PaymentRequest, User};
use crate::storage::JsonStore;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const USERS_KEY: &str = "users";
pub const PAYMENTS_KEY: &str = "payments";
pub const SETTINGS_KEY: &str = "settings";

/// 全部领域状态。用户、付款与设置持久化；
/// admin_credits 是登录时合成的管理员余额，仅存内存，进程结束即失效。
#[derive(Debug)]
pub struct AppState {
    pub users: Vec<User>,
    pub payments: Vec<PaymentRequest>,
    pub settings: AppSettings,
    pub admin_credits: i64,
}

/// 显式构造的状态服务：启动时加载全部键，每次变更后整体回写。
///
/// 写锁覆盖整个读改写加落盘的序列，等价于单线程事件循环里
/// 一个回调跑完才轮到下一个的原子性。
#[derive(Clone)]
pub struct StateStore {
    kv: JsonStore,
    state: Arc<RwLock<AppState>>,
}

impl StateStore {
    pub fn open(kv: JsonStore) -> Self {
        let state = AppState {
            users: kv.load(USERS_KEY, Vec::new()),
            payments: kv.load(PAYMENTS_KEY, Vec::new()),
            settings: kv.load(SETTINGS_KEY, AppSettings::default()),
            admin_credits: ADMIN_CREDITS,
        };

        log::info!(
            "State store loaded: {} users, {} payment requests, {} credit packages",
            state.users.len(),
            state.payments.len(),
            state.settings.credit_packages.len()
        );

        Self {
            kv,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().await
    }

    /// 变更后回写全部持久化键。各键独立写入且失败即吞，
    /// 中途崩溃可能留下不一致的文件组合。
    pub fn persist(&self, state: &AppState) {
        self.kv.save(USERS_KEY, &state.users);
        self.kv.save(PAYMENTS_KEY, &state.payments);
        self.kv.save(SETTINGS_KEY, &state.settings);
    }

    /// 关停钩子：把当前内存状态落盘
    pub async fn flush(&self) {
        let state = self.read().await;
        self.persist(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreditPackage, PaymentSettings, SIGNUP_CREDITS, UserRole};
    use crate::utils::generate_id;
    use chrono::Utc;

    fn temp_kv() -> JsonStore {
        let dir = std::env::temp_dir().join(generate_id("pixelforge-state-test"));
        JsonStore::open(dir).unwrap()
    }

    fn sample_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: email.to_string(),
            credits: SIGNUP_CREDITS,
            role: UserRole::User,
            is_blocked: false,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_open_empty_dir_uses_defaults() {
        let store = StateStore::open(temp_kv());
        let state = store.read().await;

        assert!(state.users.is_empty());
        assert!(state.payments.is_empty());
        assert_eq!(state.settings, AppSettings::default());
        assert_eq!(state.settings.credit_packages.len(), 3);
        assert_eq!(state.admin_credits, ADMIN_CREDITS);
    }

    #[tokio::test]
    async fn test_flush_and_reopen_roundtrips_state() {
        let kv = temp_kv();
        let store = StateStore::open(kv.clone());

        let saved_settings = AppSettings {
            payment_details: PaymentSettings {
                method_name: "Rocket".to_string(),
                account_number: "01912345678".to_string(),
                qr_code_url: "https://example.com/qr.png".to_string(),
            },
            credit_packages: vec![CreditPackage {
                id: "mega".to_string(),
                name: "Mega Pack".to_string(),
                credits: 5000,
                price: 1500,
            }],
        };

        {
            let mut state = store.write().await;
            state.users.push(sample_user("user_1", "alice@example.com"));
            state.settings = saved_settings.clone();
            store.persist(&state);
        }
        store.flush().await;

        let reopened = StateStore::open(kv);
        let state = reopened.read().await;
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].email, "alice@example.com");
        assert_eq!(state.settings, saved_settings);
    }

    #[tokio::test]
    async fn test_admin_credits_are_not_persisted() {
        let kv = temp_kv();
        let store = StateStore::open(kv.clone());

        {
            let mut state = store.write().await;
            state.admin_credits -= 100;
            store.persist(&state);
        }

        let reopened = StateStore::open(kv);
        let state = reopened.read().await;
        assert_eq!(state.admin_credits, ADMIN_CREDITS);
    }
}
