// src/handlers/agents.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{OwnerOnly, RequireRole},
        tenancy::CompanyContext,
    },
    models::agent::{Agent, CreateAgentPayload, UpdateAgentPayload},
};

#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentPayload,
    responses(
        (status = 201, description = "Agente criado com agent_id gerado", body = Agent),
        (status = 404, description = "Usuário a promover não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_agent(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    CompanyContext(company): CompanyContext,
    Json(payload): Json<CreateAgentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let agent = app_state
        .agent_service
        .create_agent(company.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(agent)))
}

#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Agentes da empresa do solicitante", body = Vec<Agent>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    CompanyContext(company): CompanyContext,
) -> Result<Json<Vec<Agent>>, AppError> {
    let agents = app_state.agent_service.list_agents(company.id).await?;
    Ok(Json(agents))
}

#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID interno do agente")),
    responses(
        (status = 200, description = "O agente", body = Agent),
        (status = 404, description = "Agente não encontrado nesta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_agent(
    State(app_state): State<AppState>,
    CompanyContext(company): CompanyContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Agent>, AppError> {
    let agent = app_state.agent_service.get_agent(company.id, id).await?;
    Ok(Json(agent))
}

#[utoipa::path(
    patch,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID interno do agente")),
    request_body = UpdateAgentPayload,
    responses(
        (status = 200, description = "Agente atualizado", body = Agent)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_agent(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    CompanyContext(company): CompanyContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAgentPayload>,
) -> Result<Json<Agent>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let agent = app_state
        .agent_service
        .update_agent(company.id, id, &payload)
        .await?;

    Ok(Json(agent))
}

#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID interno do agente")),
    responses(
        (status = 200, description = "Agente desativado", body = Agent)
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_agent(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    CompanyContext(company): CompanyContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Agent>, AppError> {
    let agent = app_state
        .agent_service
        .deactivate_agent(company.id, id)
        .await?;

    Ok(Json(agent))
}
