// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::get_my_company,
        handlers::companies::update_company,
        handlers::companies::deactivate_company,

        // --- Agents ---
        handlers::agents::create_agent,
        handlers::agents::list_agents,
        handlers::agents::get_agent,
        handlers::agents::update_agent,
        handlers::agents::deactivate_agent,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::update_customer,
        handlers::customers::add_loyalty_points,

        // --- Transactions ---
        handlers::transactions::list_transactions,

        // --- Dashboard ---
        handlers::dashboard::get_metrics,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Companies ---
            models::company::Company,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,

            // --- Agents ---
            models::agent::Agent,
            models::agent::CreateAgentPayload,
            models::agent::UpdateAgentPayload,

            // --- Customers ---
            models::customer::Customer,
            models::customer::LoyaltyPoints,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,
            handlers::customers::AddLoyaltyPointsPayload,

            // --- Transactions / Dashboard ---
            models::transaction::Transaction,
            models::metrics::MetricsSnapshot,
            models::metrics::TopAgentEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Registro e autenticação"),
        (name = "Companies", description = "Gestão da empresa (tenant)"),
        (name = "Agents", description = "Agentes da empresa"),
        (name = "Customers", description = "Clientes atendidos pelos agentes"),
        (name = "Transactions", description = "Razão externo, somente leitura"),
        (name = "Dashboard", description = "Métricas agregadas (REST e WebSocket)"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
