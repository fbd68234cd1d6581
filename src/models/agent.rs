// src/models/agent.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Agent (usuário que opera em nome de uma empresa)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub user_id: Uuid,
    // Identificador público de 6 dígitos (único, gerado com loop de checagem)
    pub agent_id: i32,
    pub company_id: Option<Uuid>,
    pub commission: Decimal,
    pub rating: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Criação de agente: o dono informa o usuário e a comissão.
// O agent_id é gerado pelo serviço, nunca enviado pelo cliente.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentPayload {
    pub user_id: Uuid,
    pub commission: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentPayload {
    pub commission: Option<Decimal>,
    #[validate(length(min = 1, message = "Status inválido."))]
    pub status: Option<String>,
}
