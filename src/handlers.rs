pub mod auth;
pub mod companies;
pub mod agents;
pub mod customers;
pub mod transactions;
pub mod dashboard;
