//! Repository implementations for database operations

pub mod activity;
pub mod market_cap;
pub mod opinion;
pub mod predictions;
pub mod smart_wallets;
pub mod trades;

pub use activity::*;
pub use market_cap::*;
pub use opinion::*;
pub use predictions::*;
pub use smart_wallets::*;
pub use trades::*;
