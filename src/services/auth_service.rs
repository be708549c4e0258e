use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::storage::StateStore;
use crate::utils::*;
use chrono::Utc;

#[derive(Clone)]
pub struct AuthService {
    store: StateStore,
    jwt_service: JwtService,
    admin: AdminConfig,
}

impl AuthService {
    pub fn new(store: StateStore, jwt_service: JwtService, admin: AdminConfig) -> Self {
        Self {
            store,
            jwt_service,
            admin,
        }
    }

    /// 注册并直接登录。邮箱重复时失败，不会追加用户
    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("姓名不能为空".to_string()));
        }

        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        // 管理员邮箱不允许被注册占用
        if email == normalize_email(&self.admin.email) {
            return Err(AppError::ValidationError(
                "该邮箱已被注册".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;

        let mut state = self.store.write().await;
        if state.users.iter().any(|u| u.email == email) {
            return Err(AppError::ValidationError("该邮箱已被注册".to_string()));
        }

        let user = User {
            id: generate_id("user"),
            name,
            email,
            credits: SIGNUP_CREDITS,
            role: UserRole::User,
            is_blocked: false,
            password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        self.store.persist(&state);
        drop(state);

        log::info!("New user signed up: {}", user.email);
        self.issue_tokens(user)
    }

    /// 登录。管理员凭证命中时合成管理员账号，不落用户列表；
    /// 普通用户查列表并校验密码，被封禁的账号无论凭证如何都拒绝
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);

        if email == normalize_email(&self.admin.email) {
            if request.password != self.admin.password {
                return Err(AppError::AuthError("Invalid credentials".to_string()));
            }
            let state = self.store.read().await;
            let admin = self.synthesized_admin(state.admin_credits);
            drop(state);
            log::info!("Admin logged in");
            return self.issue_tokens(admin);
        }

        let state = self.store.read().await;
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;
        drop(state);

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Your account has been blocked".to_string(),
            ));
        }

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        }

        log::info!("User logged in: {}", user.email);
        self.issue_tokens(user)
    }

    /// 用 refresh token 换发新令牌；封禁或已不存在的用户无法续期
    pub async fn refresh_token(&self, token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(token)?;

        if claims.role == UserRole::Admin {
            let state = self.store.read().await;
            let admin = self.synthesized_admin(state.admin_credits);
            drop(state);
            return self.issue_tokens(admin);
        }

        let state = self.store.read().await;
        let user = state
            .users
            .iter()
            .find(|u| u.id == claims.sub)
            .cloned()
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        drop(state);

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Your account has been blocked".to_string(),
            ));
        }

        self.issue_tokens(user)
    }

    /// 当前会话用户资料
    pub async fn me(&self, caller: &AuthUser) -> AppResult<UserResponse> {
        let state = self.store.read().await;
        if caller.is_admin() {
            return Ok(self.synthesized_admin(state.admin_credits).into());
        }

        state
            .users
            .iter()
            .find(|u| u.id == caller.id)
            .cloned()
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// 管理员账号只在会话内合成，余额取易失的内存值
    fn synthesized_admin(&self, credits: i64) -> User {
        User {
            id: ADMIN_USER_ID.to_string(),
            name: self.admin.name.clone(),
            email: normalize_email(&self.admin.email),
            credits,
            role: UserRole::Admin,
            is_blocked: false,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn issue_tokens(&self, user: User) -> AppResult<AuthResponse> {
        let access_token =
            self.jwt_service
                .generate_access_token(&user.id, &user.email, user.role)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(&user.id, &user.email, user.role)?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}
