mod ids;
pub mod auth;
pub use auth::AuthService;
pub mod company_service;
pub use company_service::CompanyService;
pub mod agent_service;
pub use agent_service::AgentService;
pub mod customer_service;
pub use customer_service::CustomerService;
pub mod metrics_service;
pub use metrics_service::MetricsService;
