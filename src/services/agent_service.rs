// src/services/agent_service.rs

use rand::Rng;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{self, AgentRepository, UserRepository},
    models::agent::{Agent, CreateAgentPayload, UpdateAgentPayload},
    services::ids,
};

// Faixa do identificador público de 6 dígitos
const AGENT_ID_MIN: i32 = 100_000;
const AGENT_ID_MAX: i32 = 999_999;

#[derive(Clone)]
pub struct AgentService {
    repo: AgentRepository,
    user_repo: UserRepository,
}

impl AgentService {
    pub fn new(repo: AgentRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    pub async fn create_agent(
        &self,
        company_id: Uuid,
        payload: &CreateAgentPayload,
    ) -> Result<Agent, AppError> {
        // O usuário a promover precisa existir
        self.user_repo
            .find_by_id(payload.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let user_id = payload.user_id;
        let commission = payload.commission;

        // Sorteia-e-insere com limite de tentativas. A pré-checagem evita a
        // maioria das colisões; se duas criações concorrentes passarem por
        // ela, a UNIQUE do banco derruba uma e o laço sorteia de novo.
        ids::allocate(ids::MAX_ATTEMPTS, || {
            let repo = self.repo.clone();
            async move {
                let candidate = rand::thread_rng().gen_range(AGENT_ID_MIN..=AGENT_ID_MAX);
                if repo.agent_id_exists(candidate).await? {
                    return Ok(None);
                }
                match repo.create(user_id, candidate, company_id, commission).await {
                    Ok(agent) => Ok(Some(agent)),
                    Err(AppError::DatabaseError(e))
                        if db::is_unique_violation_on(&e, "agent_id") =>
                    {
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }

    pub async fn list_agents(&self, company_id: Uuid) -> Result<Vec<Agent>, AppError> {
        self.repo.list_by_company(company_id).await
    }

    pub async fn get_agent(&self, company_id: Uuid, id: Uuid) -> Result<Agent, AppError> {
        let agent = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::AgentNotFound)?;

        // Um dono só enxerga agentes da própria empresa
        if agent.company_id != Some(company_id) {
            return Err(AppError::AgentNotFound);
        }
        Ok(agent)
    }

    pub async fn update_agent(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateAgentPayload,
    ) -> Result<Agent, AppError> {
        self.get_agent(company_id, id).await?;

        self.repo
            .update(id, payload.commission, payload.status.as_deref())
            .await
    }

    pub async fn deactivate_agent(&self, company_id: Uuid, id: Uuid) -> Result<Agent, AppError> {
        self.get_agent(company_id, id).await?;
        self.repo.update(id, None, Some("inactive")).await
    }
}
