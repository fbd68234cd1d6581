// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        auth::{Role, User},
        company::Company,
    },
};

// O nosso extrator de "tenant".
// Diferente de um cabeçalho X-Tenant-ID, aqui a empresa é SEMPRE derivada da
// identidade autenticada: dono -> sua empresa; agente -> a empresa a que
// está vinculado. Não há como pedir dados de uma empresa alheia.
#[derive(Debug, Clone)]
pub struct CompanyContext(pub Company);

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        let company = match user.role() {
            Some(Role::Owner) => {
                app_state
                    .company_repo
                    .find_active_by_owner(user.id)
                    .await?
            }
            Some(Role::Agent) => {
                app_state
                    .company_repo
                    .find_active_by_agent_user(user.id)
                    .await?
            }
            _ => None,
        };

        company.map(CompanyContext).ok_or(AppError::NoCompany)
    }
}
