pub mod errors;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod service;
