pub mod desktop;
pub mod identity;
pub mod ledger;
pub mod session_factory;
pub mod store;
