use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    /// approved / rejected 为终态，不允许再次流转
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Approved => write!(f, "approved"),
            PaymentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// 用户提交的付款核销请求，用户ID/邮箱与套餐名为创建时的冗余快照
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    pub package_id: String,
    pub package_name: String,
    pub trx_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    #[schema(example = "pkg1")]
    pub package_id: String,
    /// 用户支付后填写的交易流水号
    #[schema(example = "TRX123456789")]
    pub trx_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_users: i64,
    pub pending_payments: i64,
    pub approved_payments: i64,
    /// 已核销付款按当前套餐价格汇总；套餐已删除的按0计
    pub session_revenue: i64,
}
