// src/db/customer_repo.rs

use crate::{
    common::error::AppError,
    models::customer::{Customer, LoyaltyPoints},
};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // O created_by é gravado uma única vez e nunca muda
    pub async fn create(
        &self,
        customer_id: i64,
        name: &str,
        phone: &str,
        created_by: Uuid,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, name, phone, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(name)
        .bind(phone)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn customer_id_exists(&self, customer_id: i64) -> Result<bool, AppError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1)")
                .bind(customer_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    // A empresa que atende o cliente, via o agente que o criou.
    // None se o cliente não existe OU se o agente foi desligado da empresa.
    pub async fn company_of(&self, id: Uuid) -> Result<Option<Uuid>, AppError> {
        let row: Option<(Option<Uuid>,)> = sqlx::query_as(
            r#"
            SELECT a.company_id
            FROM customers c
            JOIN agents a ON c.created_by = a.id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(company,)| company))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    // Clientes criados pelos agentes de uma empresa
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.* FROM customers c
            JOIN agents a ON c.created_by = a.id
            WHERE a.company_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                tag = COALESCE($3, tag),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(tag)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CustomerNotFound)?;
        Ok(customer)
    }

    // Pontos de fidelidade são por empresa: o upsert cobre tanto a primeira
    // atribuição quanto os incrementos seguintes.
    pub async fn add_loyalty_points(
        &self,
        customer_id: Uuid,
        company_id: Uuid,
        points: i32,
    ) -> Result<LoyaltyPoints, AppError> {
        let loyalty = sqlx::query_as::<_, LoyaltyPoints>(
            r#"
            INSERT INTO customer_loyalty_points (customer_id, company_id, loyalty_points)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, company_id)
            DO UPDATE SET loyalty_points = customer_loyalty_points.loyalty_points + $3
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(company_id)
        .bind(points)
        .fetch_one(&self.pool)
        .await?;
        Ok(loyalty)
    }
}
