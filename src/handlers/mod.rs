pub mod admin;
pub mod auth;
pub mod generation;
pub mod payment;
pub mod settings;

pub use admin::admin_config;
pub use auth::auth_config;
pub use generation::generation_config;
pub use payment::payment_config;
pub use settings::settings_config;
