// src/db/transaction_repo.rs

use crate::{
    common::error::AppError,
    models::{
        metrics::MetricsFilters,
        transaction::{Transaction, TransactionRow},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

// Repositório SOMENTE LEITURA do razão de transações.
// A tabela pertence a um sistema externo; nada aqui escreve nela.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca as linhas que entram na agregação de métricas, numa ÚNICA leitura
    // transacional — o snapshot precisa ser consistente, sem contagens e somas
    // vindas de momentos diferentes.
    //
    // Filtros ausentes não restringem nada: sem datas significa "todo o
    // período", nunca uma janela padrão.
    //
    // A ordenação por (created_at, id) é o que torna determinístico o
    // desempate do ranking de agentes ("primeiro visto ganha").
    pub async fn fetch_rows_for_metrics(
        &self,
        company_id: Uuid,
        filters: &MetricsFilters,
    ) -> Result<Vec<TransactionRow>, AppError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT t.agent_id, t.customer_id, t.amount, t.status
            FROM transactions t
            JOIN agents a ON t.agent_id = a.agent_id
            WHERE a.company_id = $1
              AND ($2::integer IS NULL OR t.agent_id = $2)
              AND ($3::date IS NULL OR t.created_at::date >= $3)
              AND ($4::date IS NULL OR t.created_at::date <= $4)
            ORDER BY t.created_at ASC, t.id ASC
            "#,
        )
        .bind(company_id)
        .bind(filters.agent_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows)
    }

    // Listagem paginada para a API REST (mesmos filtros do socket)
    pub async fn list_for_company(
        &self,
        company_id: Uuid,
        filters: &MetricsFilters,
        limit: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT t.*
            FROM transactions t
            JOIN agents a ON t.agent_id = a.agent_id
            WHERE a.company_id = $1
              AND ($2::integer IS NULL OR t.agent_id = $2)
              AND ($3::date IS NULL OR t.created_at::date >= $3)
              AND ($4::date IS NULL OR t.created_at::date <= $4)
            ORDER BY t.created_at DESC
            LIMIT $5
            "#,
        )
        .bind(company_id)
        .bind(filters.agent_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }
}
