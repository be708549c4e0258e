use crate::error::{AppError, AppResult};
use crate::external::GeminiService;
use crate::models::*;
use crate::services::UserService;
use crate::utils::generate_id;
use chrono::Utc;

#[derive(Clone)]
pub struct GenerationService {
    user_service: UserService,
    gemini: GeminiService,
}

impl GenerationService {
    pub fn new(user_service: UserService, gemini: GeminiService) -> Self {
        Self {
            user_service,
            gemini,
        }
    }

    /// 生成图片：先扣积分再调外部接口，失败退还扣掉的积分。
    /// 不做重试，调用期间也不支持取消
    pub async fn generate(
        &self,
        caller: &AuthUser,
        request: GenerateImageRequest,
    ) -> AppResult<GenerateImageResponse> {
        let prompt = request.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(AppError::ValidationError("提示词不能为空".to_string()));
        }

        let count = request.number_of_images.unwrap_or(1);
        if count == 0 || count > MAX_IMAGES_PER_REQUEST {
            return Err(AppError::ValidationError(format!(
                "生成张数必须在1-{MAX_IMAGES_PER_REQUEST}之间"
            )));
        }
        let aspect_ratio = request.aspect_ratio.unwrap_or_default();

        self.user_service.ensure_not_blocked(&caller.id).await?;

        let cost = CREDITS_PER_IMAGE * count as i64;
        let remaining = self.user_service.deduct_credits(&caller.id, cost).await?;

        let urls = match self.gemini.generate_images(&prompt, aspect_ratio, count).await {
            Ok(urls) => urls,
            Err(e) => {
                // 生成失败退款
                let refunded = self.user_service.refund_credits(&caller.id, cost).await;
                if let Err(refund_err) = refunded {
                    log::error!(
                        "Failed to refund {cost} credit(s) to {} after generation failure: {refund_err}",
                        caller.id
                    );
                } else {
                    log::info!(
                        "Refunded {cost} credit(s) to {} after generation failure",
                        caller.id
                    );
                }
                return Err(e);
            }
        };

        let now = Utc::now();
        let images: Vec<GeneratedImage> = urls
            .into_iter()
            .map(|url| GeneratedImage {
                id: generate_id("img"),
                prompt: prompt.clone(),
                url,
                created_at: now,
            })
            .collect();

        Ok(GenerateImageResponse {
            images,
            credits_remaining: remaining,
        })
    }
}
