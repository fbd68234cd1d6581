// src/handlers/transactions.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::transaction::Transaction,
    realtime::filters,
};

const DEFAULT_PAGE_SIZE: i64 = 100;

// Listagem somente-leitura do razão, com os MESMOS filtros opcionais do
// socket (start_date, end_date, agent_id) e a mesma validação.
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    params(
        ("start_date" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo"),
        ("end_date" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo"),
        ("agent_id" = Option<i32>, Query, description = "Identificador público do agente")
    ),
    responses(
        (status = 200, description = "Transações da empresa", body = Vec<Transaction>),
        (status = 400, description = "Filtro inválido"),
        (status = 404, description = "Agente não pertence à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    CompanyContext(company): CompanyContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let filters = filters::validate_filters(&params, company.id, &app_state.agent_repo).await?;

    let transactions = app_state
        .transaction_repo
        .list_for_company(company.id, &filters, DEFAULT_PAGE_SIZE)
        .await?;

    Ok(Json(transactions))
}
