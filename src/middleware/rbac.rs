// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// 1. O Trait que define a exigência de papel
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// 2. O Extractor (Guardião)
// Usa-se como argumento do handler: `_: RequireRole<OwnerOnly>`.
// Superusuários passam por qualquer guarda.
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o usuário colocado pelo auth_guard
        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)?;

        // B. Superusuário ignora a checagem de papel
        if user.is_superuser {
            return Ok(RequireRole(PhantomData));
        }

        // C. Compara com o papel exigido
        let required = T::role();
        if user.role() != Some(required) {
            return Err(AppError::Forbidden(format!(
                "Esta ação exige o papel '{}'.",
                required.as_str()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct OwnerOnly;
impl RoleDef for OwnerOnly {
    fn role() -> Role {
        Role::Owner
    }
}

pub struct AgentOnly;
impl RoleDef for AgentOnly {
    fn role() -> Role {
        Role::Agent
    }
}
