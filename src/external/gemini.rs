use crate::config::GeminiConfig;
use crate::error::{AppError, AppResult};
use crate::models::AspectRatio;
use crate::utils::encode_image;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
}

impl GeminiService {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 调用图片生成接口，返回 data URI 形式的图片列表。
    /// 网络、配额、内容审核等失败统一折叠为 ExternalApiError。
    pub async fn generate_images(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        count: u32,
    ) -> AppResult<Vec<String>> {
        let url = format!(
            "{}/v1beta/models/{}:predict",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: count,
                aspect_ratio: aspect_ratio.as_str().to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Image generation request failed ({status}): {error_text}");
            return Err(AppError::ExternalApiError(format!(
                "Image generation failed: {error_text}"
            )));
        }

        let predict: PredictResponse = response.json().await?;
        if predict.predictions.is_empty() {
            return Err(AppError::ExternalApiError(
                "Image generation returned no images".to_string(),
            ));
        }

        let mut urls = Vec::with_capacity(predict.predictions.len());
        for prediction in predict.predictions {
            let bytes = STANDARD
                .decode(&prediction.bytes_base64_encoded)
                .map_err(|e| {
                    AppError::ExternalApiError(format!("Invalid image payload returned: {e}"))
                })?;
            let mime = prediction
                .mime_type
                .unwrap_or_else(|| "image/png".to_string());
            urls.push(encode_image(&bytes, &mime));
        }

        log::info!("Generated {} image(s) for prompt", urls.len());
        Ok(urls)
    }
}
