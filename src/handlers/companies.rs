// src/handlers/companies.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{OwnerOnly, RequireRole},
    },
    models::company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
};

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 403, description = "Papel insuficiente"),
        (status = 409, description = "O dono já possui uma empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let company = app_state
        .company_service
        .create_company(&user.0, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies/me",
    tag = "Companies",
    responses(
        (status = 200, description = "A empresa do dono autenticado", body = Company),
        (status = 403, description = "Usuário sem empresa ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_company(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    user: AuthenticatedUser,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.get_my_company(user.0.id).await?;
    Ok(Json(company))
}

// Apenas localidade: o nome da empresa é imutável
#[utoipa::path(
    patch,
    path = "/api/companies/me",
    tag = "Companies",
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, description = "Empresa atualizada", body = Company)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let company = app_state
        .company_service
        .update_company(user.0.id, &payload)
        .await?;

    Ok(Json(company))
}

// "DELETE" = desativação lógica (a empresa nunca some do banco)
#[utoipa::path(
    delete,
    path = "/api/companies/me",
    tag = "Companies",
    responses(
        (status = 204, description = "Empresa desativada (soft-delete)")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_company(
    State(app_state): State<AppState>,
    _: RequireRole<OwnerOnly>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .company_service
        .deactivate_company(user.0.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
