// src/models/metrics.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Filtros de uma conexão
// ---
// O conjunto de filtros que um dashboard pediu ao abrir o socket.
// É o que fica guardado no registro de conexões (Redis, com TTL).
// Um campo ausente significa "sem restrição" — nunca uma janela padrão.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsFilters {
    pub agent_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MetricsFilters {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

// ---
// 2. Entrada do ranking de agentes
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopAgentEntry {
    pub agent_id: i32,
    pub total: Decimal,
}

// ---
// 3. O snapshot de métricas
// ---
// Agregado efêmero, calculado sob demanda e nunca persistido.
// total_amount soma apenas transações bem-sucedidas e é SEMPRE um número
// (zero quando nada casa com o filtro), nunca null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_transactions: i64,
    pub total_successful: i64,
    pub total_failed: i64,
    pub total_amount: Decimal,
    pub total_agents: i64,
    pub total_customers: i64,
    pub top_agents: Vec<TopAgentEntry>,
}

impl MetricsSnapshot {
    pub fn zeroed() -> Self {
        Self {
            total_transactions: 0,
            total_successful: 0,
            total_failed: 0,
            total_amount: Decimal::ZERO,
            total_agents: 0,
            total_customers: 0,
            top_agents: Vec::new(),
        }
    }
}

// ---
// 4. Mensagens do pipeline de broadcast
// ---
// O que o agendador publica no grupo da empresa. Cada consumidor compara o
// connection_id com o seu próprio e descarta o que não for para ele.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPush {
    pub company_id: Uuid,
    pub connection_id: String,
    pub metrics: MetricsSnapshot,
    pub timestamp: DateTime<Utc>,
}

// O envelope que desce pelo WebSocket até o cliente
#[derive(Debug, Serialize, ToSchema)]
pub struct PeriodicUpdate {
    pub r#type: &'static str,
    pub data: MetricsSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl PeriodicUpdate {
    pub fn from_push(push: MetricsPush) -> Self {
        Self {
            r#type: "periodic_update",
            data: push.metrics,
            timestamp: push.timestamp,
        }
    }
}
