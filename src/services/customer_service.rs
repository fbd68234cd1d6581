// src/services/customer_service.rs

use rand::Rng;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, AgentRepository, CustomerRepository},
    models::customer::{
        CUSTOMER_TAGS, CreateCustomerPayload, Customer, LoyaltyPoints, UpdateCustomerPayload,
    },
    services::ids,
};

// Identificador público do cliente: 8 dígitos
const CUSTOMER_ID_MIN: i64 = 10_000_000;
const CUSTOMER_ID_MAX: i64 = 99_999_999;

// O cliente só é visível para a empresa que o atende (derivada do agente
// que o criou). Qualquer outra empresa enxerga "não encontrado" — o mesmo
// que um id inexistente, sem vazar a existência do cadastro.
fn ensure_served_by(customer_company: Option<Uuid>, company_id: Uuid) -> Result<(), AppError> {
    match customer_company {
        Some(company) if company == company_id => Ok(()),
        _ => Err(AppError::CustomerNotFound),
    }
}

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    agent_repo: AgentRepository,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, agent_repo: AgentRepository) -> Self {
        Self { repo, agent_repo }
    }

    // Clientes são criados por um agente; o created_by fica gravado para
    // sempre no cadastro.
    pub async fn create_customer(
        &self,
        agent_user_id: Uuid,
        payload: &CreateCustomerPayload,
    ) -> Result<Customer, AppError> {
        let agent = self
            .agent_repo
            .find_by_user(agent_user_id)
            .await?
            .ok_or(AppError::AgentNotFound)?;

        // Sorteia-e-insere com limite de tentativas: a colisão na UNIQUE do
        // banco (duas criações concorrentes) vira novo sorteio, não 500.
        ids::allocate(ids::MAX_ATTEMPTS, || {
            let repo = self.repo.clone();
            async move {
                let candidate = rand::thread_rng().gen_range(CUSTOMER_ID_MIN..=CUSTOMER_ID_MAX);
                if repo.customer_id_exists(candidate).await? {
                    return Ok(None);
                }
                match repo
                    .create(candidate, &payload.name, &payload.phone, agent.id)
                    .await
                {
                    Ok(customer) => Ok(Some(customer)),
                    Err(AppError::DatabaseError(e))
                        if db::is_unique_violation_on(&e, "customer_id") =>
                    {
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    pub async fn list_customers(&self, company_id: Uuid) -> Result<Vec<Customer>, AppError> {
        self.repo.list_by_company(company_id).await
    }

    pub async fn update_customer(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        ensure_served_by(self.repo.company_of(id).await?, company_id)?;

        if let Some(tag) = payload.tag.as_deref() {
            if !CUSTOMER_TAGS.contains(&tag) {
                return Err(AppError::InvalidInput(format!(
                    "Tag inválida: {} (use vip, frequent, regular ou inactive).",
                    tag
                )));
            }
        }

        self.repo
            .update(id, payload.name.as_deref(), payload.tag.as_deref())
            .await
    }

    pub async fn add_loyalty_points(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
        points: i32,
    ) -> Result<LoyaltyPoints, AppError> {
        ensure_served_by(self.repo.company_of(customer_id).await?, company_id)?;

        self.repo
            .add_loyalty_points(customer_id, company_id, points)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_of_another_company_reads_as_not_found() {
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        let err = ensure_served_by(Some(theirs), ours).unwrap_err();
        assert!(matches!(err, AppError::CustomerNotFound));
    }

    #[test]
    fn customer_with_detached_agent_reads_as_not_found() {
        // O agente criador foi desligado (company_id NULL): ninguém atende
        // este cliente, nenhuma empresa pode alterá-lo
        let err = ensure_served_by(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::CustomerNotFound));
    }

    #[test]
    fn customer_of_own_company_is_reachable() {
        let company = Uuid::new_v4();
        assert!(ensure_served_by(Some(company), company).is_ok());
    }
}
