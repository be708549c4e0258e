pub mod common;
pub mod generation;
pub mod pagination;
pub mod payment;
pub mod settings;
pub mod user;

pub use common::*;
pub use generation::*;
pub use pagination::*;
pub use payment::*;
pub use settings::*;
pub use user::*;
