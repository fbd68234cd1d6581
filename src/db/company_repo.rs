// src/db/company_repo.rs

use crate::{common::error::AppError, models::company::Company};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Cria a empresa do dono. A restrição UNIQUE em owner_id garante o
    // invariante "no máximo uma empresa por dono" no nível do banco.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        state: &str,
        lga: &str,
    ) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (owner_id, name, state, lga)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(state)
        .bind(lga)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::CompanyAlreadyExists;
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    // A empresa ATIVA de um dono (soft-delete respeitado)
    pub async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE owner_id = $1 AND is_active = TRUE",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    // A empresa ativa à qual um usuário-agente está vinculado
    pub async fn find_active_by_agent_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT c.* FROM companies c
            JOIN agents a ON a.company_id = c.id
            WHERE a.user_id = $1 AND c.is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    // Todas as empresas ativas — é por elas que o agendador de broadcast itera
    pub async fn list_active(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE is_active = TRUE ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    // Atualiza apenas os campos de localidade (o nome é imutável)
    pub async fn update_locale(
        &self,
        id: Uuid,
        state: Option<&str>,
        lga: Option<&str>,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET state = COALESCE($2, state),
                lga = COALESCE($3, lga),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(lga)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CompanyNotFound)?;
        Ok(company)
    }

    // Desativação (soft-delete) da empresa + desativação dos seus agentes,
    // numa única transação para não deixar agentes "órfãos ativos".
    pub async fn deactivate(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE companies SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::CompanyNotFound);
        }

        sqlx::query(
            "UPDATE agents SET status = 'inactive', updated_at = NOW() WHERE company_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
