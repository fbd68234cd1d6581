// src/services/metrics_service.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TransactionRepository,
    models::{
        metrics::{MetricsFilters, MetricsSnapshot, TopAgentEntry},
        transaction::{STATUS_FAILED, STATUS_SUCCESSFUL, TransactionRow},
    },
    realtime::broadcast::MetricsSource,
};

const TOP_AGENTS_LIMIT: usize = 5;

// ---
// O agregador de métricas
// ---
// Leitura pura: busca as linhas em uma única transação e reduz tudo em uma
// passada. Nenhum efeito colateral, seguro para chamadas concorrentes.
#[derive(Clone)]
pub struct MetricsService {
    repo: TransactionRepository,
}

impl MetricsService {
    pub fn new(repo: TransactionRepository) -> Self {
        Self { repo }
    }

    pub async fn compute(
        &self,
        company_id: Uuid,
        filters: &MetricsFilters,
    ) -> Result<MetricsSnapshot, AppError> {
        let rows = self.repo.fetch_rows_for_metrics(company_id, filters).await?;
        Ok(compute_snapshot(&rows))
    }
}

#[async_trait]
impl MetricsSource for MetricsService {
    async fn compute(
        &self,
        company_id: Uuid,
        filters: &MetricsFilters,
    ) -> Result<MetricsSnapshot, AppError> {
        MetricsService::compute(self, company_id, filters).await
    }
}

// Reduz as linhas (já filtradas e ordenadas por chegada) em um snapshot.
//
// - total_amount soma APENAS transações bem-sucedidas e é sempre numérico
//   (zero para conjunto vazio, nunca null);
// - o ranking soma o valor de todas as transações do agente, e o empate é
//   resolvido pela ordem de chegada: o agente visto primeiro vence.
pub fn compute_snapshot(rows: &[TransactionRow]) -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::zeroed();

    // agent_id -> (ordem de chegada, soma dos valores)
    let mut agent_totals: HashMap<i32, (usize, Decimal)> = HashMap::new();
    let mut customers: HashSet<i64> = HashSet::new();

    for row in rows {
        snapshot.total_transactions += 1;

        let amount = row.amount.unwrap_or(Decimal::ZERO);
        match row.status.as_deref() {
            Some(STATUS_SUCCESSFUL) => {
                snapshot.total_successful += 1;
                snapshot.total_amount += amount;
            }
            Some(STATUS_FAILED) => snapshot.total_failed += 1,
            // pending (ou status desconhecido) conta só no total
            _ => {}
        }

        if let Some(agent_id) = row.agent_id {
            let arrival = agent_totals.len();
            let entry = agent_totals.entry(agent_id).or_insert((arrival, Decimal::ZERO));
            entry.1 += amount;
        }

        if let Some(customer_id) = row.customer_id {
            customers.insert(customer_id);
        }
    }

    snapshot.total_agents = agent_totals.len() as i64;
    snapshot.total_customers = customers.len() as i64;

    let mut ranking: Vec<(i32, usize, Decimal)> = agent_totals
        .into_iter()
        .map(|(agent_id, (arrival, total))| (agent_id, arrival, total))
        .collect();
    // Maior soma primeiro; em empate, quem apareceu primeiro
    ranking.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));

    snapshot.top_agents = ranking
        .into_iter()
        .take(TOP_AGENTS_LIMIT)
        .map(|(agent_id, _, total)| TopAgentEntry { agent_id, total })
        .collect();

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::STATUS_PENDING;
    use rust_decimal::Decimal;

    fn row(agent: i32, customer: i64, amount: i64, status: &str) -> TransactionRow {
        TransactionRow {
            agent_id: Some(agent),
            customer_id: Some(customer),
            amount: Some(Decimal::from(amount)),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn empty_input_yields_zeroed_snapshot() {
        let snapshot = compute_snapshot(&[]);
        assert_eq!(snapshot, MetricsSnapshot::zeroed());
        // O contrato exige zero numérico, nunca "ausente"
        assert_eq!(snapshot.total_amount, Decimal::ZERO);
    }

    #[test]
    fn counts_by_status_and_sums_only_successful() {
        let rows = vec![
            row(100001, 1, 50, STATUS_SUCCESSFUL),
            row(100001, 2, 30, STATUS_FAILED),
            row(100002, 3, 20, STATUS_PENDING),
            row(100002, 1, 10, STATUS_SUCCESSFUL),
        ];
        let snapshot = compute_snapshot(&rows);

        assert_eq!(snapshot.total_transactions, 4);
        assert_eq!(snapshot.total_successful, 2);
        assert_eq!(snapshot.total_failed, 1);
        // 50 + 10; o valor de falhas e pendentes fica de fora
        assert_eq!(snapshot.total_amount, Decimal::from(60));
        assert!(snapshot.total_successful + snapshot.total_failed <= snapshot.total_transactions);
    }

    #[test]
    fn distinct_agents_and_customers_are_counted_once() {
        let rows = vec![
            row(100001, 1, 10, STATUS_SUCCESSFUL),
            row(100001, 1, 10, STATUS_SUCCESSFUL),
            row(100002, 2, 10, STATUS_SUCCESSFUL),
        ];
        let snapshot = compute_snapshot(&rows);

        assert_eq!(snapshot.total_agents, 2);
        assert_eq!(snapshot.total_customers, 2);
    }

    #[test]
    fn top_agents_ties_resolve_by_first_seen_order() {
        // A (300) aparece antes de B (300); C fica por último com 100
        let rows = vec![
            row(111111, 1, 300, STATUS_SUCCESSFUL), // A
            row(222222, 2, 300, STATUS_SUCCESSFUL), // B
            row(333333, 3, 100, STATUS_SUCCESSFUL), // C
        ];
        let snapshot = compute_snapshot(&rows);

        let ids: Vec<i32> = snapshot.top_agents.iter().map(|e| e.agent_id).collect();
        assert_eq!(ids, vec![111111, 222222, 333333]);
    }

    #[test]
    fn top_agents_is_capped_at_five() {
        let rows: Vec<TransactionRow> = (0..8)
            .map(|i| row(100000 + i, i as i64, 100 - i as i64, STATUS_SUCCESSFUL))
            .collect();
        let snapshot = compute_snapshot(&rows);

        assert_eq!(snapshot.top_agents.len(), 5);
        assert_eq!(snapshot.top_agents[0].agent_id, 100000);
    }

    #[test]
    fn ranking_includes_failed_and_pending_amounts() {
        // O ranking considera o volume transacionado, não só o liquidado
        let rows = vec![
            row(111111, 1, 100, STATUS_SUCCESSFUL),
            row(222222, 2, 150, STATUS_FAILED),
        ];
        let snapshot = compute_snapshot(&rows);

        assert_eq!(snapshot.top_agents[0].agent_id, 222222);
        assert_eq!(snapshot.top_agents[0].total, Decimal::from(150));
    }

    #[test]
    fn rows_without_agent_or_customer_still_count_in_totals() {
        let rows = vec![TransactionRow {
            agent_id: None,
            customer_id: None,
            amount: Some(Decimal::from(10)),
            status: Some(STATUS_SUCCESSFUL.to_string()),
        }];
        let snapshot = compute_snapshot(&rows);

        assert_eq!(snapshot.total_transactions, 1);
        assert_eq!(snapshot.total_agents, 0);
        assert_eq!(snapshot.total_customers, 0);
        assert!(snapshot.top_agents.is_empty());
    }
}
