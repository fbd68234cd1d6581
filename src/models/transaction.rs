// src/models/transaction.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Status possíveis de uma transação (coluna de texto no banco externo)
pub const STATUS_SUCCESSFUL: &str = "successful";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_PENDING: &str = "pending";

// ---
// Transaction (linha do razão externo)
// ---
// ATENÇÃO: este backend nunca cria nem altera transações.
// Elas pertencem a outro sistema; aqui só lemos e agregamos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub agent_id: Option<i32>,
    pub customer_id: Option<i64>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub r#type: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Projeção mínima usada pela agregação de métricas.
// Buscada em UMA leitura transacional, ordenada por created_at (e id, para
// desempate determinístico do ranking de agentes).
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub agent_id: Option<i32>,
    pub customer_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
}
