use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 合成管理员账号的固定ID，该账号从不写入用户列表
pub const ADMIN_USER_ID: &str = "admin";

/// 注册赠送的初始积分
pub const SIGNUP_CREDITS: i64 = 10;

/// 管理员登录时合成的积分余额
pub const ADMIN_CREDITS: i64 = 99_999;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub credits: i64,
    pub role: UserRole,
    pub is_blocked: bool,
    // 持久化时保留，对外响应使用 UserResponse 隐藏
    #[serde(default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 认证中间件解析令牌后注入请求的调用者身份
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub credits: i64,
    pub role: UserRole,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            credits: u.credits,
            role: u.role,
            is_blocked: u.is_blocked,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetBlockedRequest {
    pub blocked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdjustCreditsRequest {
    /// 可为负数，扣减时余额最低截断为0
    #[schema(example = 100)]
    pub amount: i64,
}
