// src/services/company_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::{
        auth::{Role, User},
        company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
    },
};

#[derive(Clone)]
pub struct CompanyService {
    repo: CompanyRepository,
}

impl CompanyService {
    pub fn new(repo: CompanyRepository) -> Self {
        Self { repo }
    }

    // Só usuários com papel "owner" criam empresas; o banco garante o
    // invariante de uma empresa por dono (UNIQUE em owner_id).
    pub async fn create_company(
        &self,
        owner: &User,
        payload: &CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        if owner.role() != Some(Role::Owner) {
            return Err(AppError::Forbidden(
                "Apenas donos podem criar empresas.".to_string(),
            ));
        }

        self.repo
            .create(owner.id, &payload.name, &payload.state, &payload.lga)
            .await
    }

    pub async fn get_my_company(&self, owner_id: Uuid) -> Result<Company, AppError> {
        self.repo
            .find_active_by_owner(owner_id)
            .await?
            .ok_or(AppError::NoCompany)
    }

    // O nome é imutável: o payload de atualização nem o aceita
    pub async fn update_company(
        &self,
        owner_id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        let company = self.get_my_company(owner_id).await?;

        self.repo
            .update_locale(company.id, payload.state.as_deref(), payload.lga.as_deref())
            .await
    }

    // "Excluir" uma empresa é desativá-la; os agentes vão junto (na mesma
    // transação, dentro do repositório).
    pub async fn deactivate_company(&self, owner_id: Uuid) -> Result<(), AppError> {
        let company = self.get_my_company(owner_id).await?;

        self.repo.deactivate(company.id).await?;
        tracing::info!("🏢 Empresa {} desativada pelo dono {}", company.id, owner_id);
        Ok(())
    }
}
