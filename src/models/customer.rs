// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Classificação do cliente para segmentação
pub const CUSTOMER_TAGS: [&str; 4] = ["vip", "frequent", "regular", "inactive"];

// ---
// Customer (cliente final, criado por um agente)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    // Identificador público numérico, gerado como o agent_id
    pub customer_id: i64,
    pub name: String,
    pub phone: String,
    pub tag: String,
    // Imutável: o agente que criou este cliente
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Pontos de fidelidade por empresa (entidade de junção)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyPoints {
    pub customer_id: Uuid,
    pub company_id: Uuid,
    pub loyalty_points: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 9, max = 17, message = "Telefone inválido."))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    pub tag: Option<String>,
}
