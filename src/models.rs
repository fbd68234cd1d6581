pub mod auth;
pub mod company;
pub mod agent;
pub mod customer;
pub mod transaction;
pub mod metrics;
