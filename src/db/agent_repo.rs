// src/db/agent_repo.rs

use crate::{common::error::AppError, models::agent::Agent};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AgentRepository {
    pool: PgPool,
}

impl AgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        agent_id: i32,
        company_id: Uuid,
        commission: Decimal,
    ) -> Result<Agent, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (user_id, agent_id, company_id, commission, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .bind(company_id)
        .bind(commission)
        .fetch_one(&self.pool)
        .await?;
        Ok(agent)
    }

    // Usada pelo loop gera-e-verifica do identificador público
    pub async fn agent_id_exists(&self, agent_id: i32) -> Result<bool, AppError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM agents WHERE agent_id = $1)")
                .bind(agent_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    // Verifica se um agent_id público pertence a uma empresa específica.
    // É a checagem que separa `AgentNotFound` de um filtro meramente malformado.
    pub async fn find_in_company(
        &self,
        agent_id: i32,
        company_id: Uuid,
    ) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE agent_id = $1 AND company_id = $2",
        )
        .bind(agent_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(agent)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Agent>, AppError> {
        let agents = sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE company_id = $1 ORDER BY agent_id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(agents)
    }

    pub async fn update(
        &self,
        id: Uuid,
        commission: Option<Decimal>,
        status: Option<&str>,
    ) -> Result<Agent, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents
            SET commission = COALESCE($2, commission),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(commission)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AgentNotFound)?;
        Ok(agent)
    }
}
