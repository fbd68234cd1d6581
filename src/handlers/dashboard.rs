// src/handlers/dashboard.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::CompanyContext,
    models::metrics::MetricsSnapshot,
    realtime::{filters, gate},
};

// GET /api/dashboard/metrics — um snapshot sob demanda, com os mesmos
// filtros e a mesma agregação do canal em tempo real.
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "Dashboard",
    params(
        ("start_date" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo"),
        ("end_date" = Option<String>, Query, description = "YYYY-MM-DD, inclusivo"),
        ("agent_id" = Option<i32>, Query, description = "Identificador público do agente")
    ),
    responses(
        (status = 200, description = "Snapshot de métricas da empresa", body = MetricsSnapshot),
        (status = 400, description = "Filtro inválido"),
        (status = 404, description = "Agente não pertence à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    CompanyContext(company): CompanyContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<MetricsSnapshot>, AppError> {
    let filters = filters::validate_filters(&params, company.id, &app_state.agent_repo).await?;

    let snapshot = app_state
        .metrics_service
        .compute(company.id, &filters)
        .await?;

    Ok(Json(snapshot))
}

// GET /ws/companies/dashboard — o canal de métricas em tempo real.
// A autenticação acontece DENTRO da sessão (token na query string), porque
// navegadores não mandam Authorization no handshake de WebSocket; rejeições
// viram códigos de fechamento, não status HTTP.
pub async fn dashboard_ws(
    State(app_state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| gate::run_dashboard_session(app_state, socket, params))
}
