use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::user_service::ensure_admin;
use crate::storage::StateStore;
use crate::utils::is_valid_image_url;
use std::collections::HashSet;

#[derive(Clone)]
pub struct SettingsService {
    store: StateStore,
}

impl SettingsService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// 站点设置（收款方式与积分套餐），购买页与后台共用
    pub async fn get_settings(&self) -> AppResult<AppSettings> {
        let state = self.store.read().await;
        Ok(state.settings.clone())
    }

    /// 整体替换设置单例
    pub async fn update_settings(
        &self,
        caller: &AuthUser,
        new_settings: AppSettings,
    ) -> AppResult<AppSettings> {
        ensure_admin(caller)?;
        validate_settings(&new_settings)?;

        let mut state = self.store.write().await;
        state.settings = new_settings.clone();
        self.store.persist(&state);

        log::info!(
            "Site settings updated, {} credit package(s)",
            new_settings.credit_packages.len()
        );
        Ok(new_settings)
    }
}

fn validate_settings(settings: &AppSettings) -> AppResult<()> {
    if settings.payment_details.method_name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "收款方式名称不能为空".to_string(),
        ));
    }
    if settings.payment_details.account_number.trim().is_empty() {
        return Err(AppError::ValidationError("收款账号不能为空".to_string()));
    }
    if !is_valid_image_url(&settings.payment_details.qr_code_url) {
        return Err(AppError::ValidationError(
            "二维码必须是图片 data URI 或 http(s) 地址".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for package in &settings.credit_packages {
        if package.id.trim().is_empty() || package.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "套餐ID与名称不能为空".to_string(),
            ));
        }
        if package.credits <= 0 {
            return Err(AppError::ValidationError(
                "套餐积分必须为正数".to_string(),
            ));
        }
        if package.price < 0 {
            return Err(AppError::ValidationError("套餐价格不能为负".to_string()));
        }
        if !seen_ids.insert(package.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "套餐ID重复: {}",
                package.id
            )));
        }
    }

    Ok(())
}
