//! Order domain: storage, commands, and status derivation

pub mod actions;
pub mod manager;
pub mod money;
pub mod reducer;
pub mod storage;

pub use manager::{ManagerError, ManagerResult, OrdersManager};
