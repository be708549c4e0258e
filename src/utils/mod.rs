pub mod data_uri;
pub mod email;
pub mod id;
pub mod jwt;
pub mod password;

pub use data_uri::*;
pub use email::*;
pub use id::*;
pub use jwt::*;
pub use password::*;
