pub mod kv;
pub mod state;

pub use kv::JsonStore;
pub use state::{AppState, StateStore};
