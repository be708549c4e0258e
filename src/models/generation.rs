use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 每张图片消耗的积分
pub const CREDITS_PER_IMAGE: i64 = 1;

/// 单次请求允许生成的最大张数
pub const MAX_IMAGES_PER_REQUEST: u32 = 4;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    Tall,
}

impl AspectRatio {
    /// 生成接口使用的字面值
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageRequest {
    #[schema(example = "A neon hologram of a cat driving at top speed")]
    pub prompt: String,
    pub aspect_ratio: Option<AspectRatio>,
    /// 1-4，缺省为1
    pub number_of_images: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedImage {
    pub id: String,
    pub prompt: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageResponse {
    pub images: Vec<GeneratedImage>,
    pub credits_remaining: i64,
}
