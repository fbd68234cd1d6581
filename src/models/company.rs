// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Company (a raiz do "tenant")
// ---
// Cada dono tem no máximo uma empresa. A exclusão é sempre lógica
// (is_active = false), nunca física.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub state: String,
    pub lga: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que o dono precisa enviar para criar a empresa
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, max = 100, message = "O nome da empresa é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "O estado é obrigatório."))]
    pub state: String,
    #[validate(length(min = 1, message = "O LGA é obrigatório."))]
    pub lga: String,
}

// Atualização: apenas os campos de localidade.
// O nome é imutável depois da criação — por isso não aparece aqui.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "O estado não pode ser vazio."))]
    pub state: Option<String>,
    #[validate(length(min = 1, message = "O LGA não pode ser vazio."))]
    pub lga: Option<String>,
}
