use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymentSettings {
    pub method_name: String,
    pub account_number: String,
    /// 收款二维码，data URI 或普通图片 URL
    pub qr_code_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CreditPackage {
    pub id: String,
    pub name: String,
    pub credits: i64,
    pub price: i64,
}

/// 站点设置单例，保存时整体替换
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AppSettings {
    pub payment_details: PaymentSettings,
    pub credit_packages: Vec<CreditPackage>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            payment_details: PaymentSettings {
                method_name: "Bkash/Nagad".to_string(),
                account_number: "01700000000".to_string(),
                qr_code_url: "https://i.ibb.co/3sS7xPZ/placeholder-qr.png".to_string(),
            },
            credit_packages: vec![
                CreditPackage {
                    id: "pkg1".to_string(),
                    name: "Starter Pack".to_string(),
                    credits: 100,
                    price: 50,
                },
                CreditPackage {
                    id: "pkg2".to_string(),
                    name: "Pro Pack".to_string(),
                    credits: 500,
                    price: 200,
                },
                CreditPackage {
                    id: "pkg3".to_string(),
                    name: "Premium Pack".to_string(),
                    credits: 1500,
                    price: 500,
                },
            ],
        }
    }
}

impl AppSettings {
    pub fn find_package(&self, package_id: &str) -> Option<&CreditPackage> {
        self.credit_packages.iter().find(|p| p.id == package_id)
    }
}
