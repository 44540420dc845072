pub mod amount;
pub mod error;
pub mod session;
pub mod status;
pub mod wallet;
