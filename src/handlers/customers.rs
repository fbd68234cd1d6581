// src/handlers/customers.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AgentOnly, RequireRole},
        tenancy::CompanyContext,
    },
    models::customer::{
        CreateCustomerPayload, Customer, LoyaltyPoints, UpdateCustomerPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado com customer_id gerado", body = Customer),
        (status = 403, description = "Apenas agentes criam clientes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    _: RequireRole<AgentOnly>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = app_state
        .customer_service
        .create_customer(user.0.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "Clientes atendidos pela empresa", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    CompanyContext(company): CompanyContext,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state
        .customer_service
        .list_customers(company.id)
        .await?;
    Ok(Json(customers))
}

#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID interno do cliente")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não atendido por esta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    _: RequireRole<AgentOnly>,
    CompanyContext(company): CompanyContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = app_state
        .customer_service
        .update_customer(company.id, id, &payload)
        .await?;
    Ok(Json(customer))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddLoyaltyPointsPayload {
    #[validate(range(min = 1, message = "Os pontos devem ser positivos."))]
    pub points: i32,
}

// Pontos de fidelidade são por empresa (entidade de junção)
#[utoipa::path(
    post,
    path = "/api/customers/{id}/loyalty",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID interno do cliente")),
    request_body = AddLoyaltyPointsPayload,
    responses(
        (status = 200, description = "Saldo de pontos atualizado", body = LoyaltyPoints),
        (status = 404, description = "Cliente não atendido por esta empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_loyalty_points(
    State(app_state): State<AppState>,
    _: RequireRole<AgentOnly>,
    CompanyContext(company): CompanyContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddLoyaltyPointsPayload>,
) -> Result<Json<LoyaltyPoints>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let loyalty = app_state
        .customer_service
        .add_loyalty_points(id, company.id, payload.points)
        .await?;

    Ok(Json(loyalty))
}
