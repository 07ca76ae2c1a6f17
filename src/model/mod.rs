pub mod audit;
pub mod biometric;
pub mod identity;
pub mod ledger;
pub mod lockout;
pub mod phase;
pub mod registry;
pub mod report;
pub mod session;
pub mod store;
