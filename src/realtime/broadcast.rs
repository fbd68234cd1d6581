// src/realtime/broadcast.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::metrics::{MetricsFilters, MetricsPush, MetricsSnapshot},
    realtime::{groups::CompanyGroups, registry::ConnectionRegistry},
};

// ---
// 1. A fonte de métricas
// ---
// O agendador não conhece SQL: ele pede um snapshot para quem souber
// calculá-lo. Na aplicação real é o MetricsService; nos testes, um dublê.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn compute(
        &self,
        company_id: Uuid,
        filters: &MetricsFilters,
    ) -> Result<MetricsSnapshot, AppError>;
}

// ---
// 2. O agendador de broadcast
// ---
// Roda em intervalo fixo, como tarefa de fundo independente dos handlers.
// Não guarda nenhum estado entre ciclos: tudo o que ele sabe vem do registro
// de conexões. Se um ciclo morre no meio, o próximo recomeça do zero —
// entrega melhor-esforço, no máximo uma vez, sem retry.
pub struct BroadcastScheduler {
    companies: CompanyRepository,
    registry: Arc<dyn ConnectionRegistry>,
    metrics: Arc<dyn MetricsSource>,
    groups: CompanyGroups,
    period: Duration,
}

impl BroadcastScheduler {
    pub fn new(
        companies: CompanyRepository,
        registry: Arc<dyn ConnectionRegistry>,
        metrics: Arc<dyn MetricsSource>,
        groups: CompanyGroups,
        period: Duration,
    ) -> Self {
        Self {
            companies,
            registry,
            metrics,
            groups,
            period,
        }
    }

    // Loop infinito; deve ser spawnado como task própria
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "📡 Agendador de métricas ativo (período de {}s)",
            self.period.as_secs()
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                // Falha do ciclo inteiro (ex.: banco fora do ar): loga e
                // espera o próximo tick. Nunca derruba o processo.
                tracing::error!("Ciclo de broadcast abortado: {}", e);
            }
        }
    }

    // Um ciclo completo: todas as empresas ativas, todas as conexões
    pub async fn run_cycle(&self) -> Result<(), AppError> {
        let companies = self.companies.list_active().await?;

        for company in companies {
            // Isolamento por empresa: uma empresa problemática não impede
            // as outras de receberem suas métricas.
            if let Err(e) = broadcast_company(
                self.registry.as_ref(),
                self.metrics.as_ref(),
                &self.groups,
                company.id,
            )
            .await
            {
                tracing::warn!("Broadcast da empresa {} falhou: {}", company.id, e);
            }
        }

        Ok(())
    }
}

// Processa uma empresa: para cada conexão registrada, relê os filtros,
// recalcula o snapshot e publica no grupo com a etiqueta da conexão.
//
// Função livre (e não método) para que os testes a exercitem com registro e
// fonte de métricas em memória.
pub async fn broadcast_company(
    registry: &dyn ConnectionRegistry,
    metrics: &dyn MetricsSource,
    groups: &CompanyGroups,
    company_id: Uuid,
) -> Result<(), AppError> {
    let connections = registry.connections(company_id).await?;

    for connection_id in connections {
        // Isolamento por conexão: filtros vencidos ou erro transitório em
        // uma conexão não abortam as irmãs.
        if let Err(e) =
            broadcast_connection(registry, metrics, groups, company_id, &connection_id).await
        {
            tracing::warn!(
                "Push para a conexão {} (empresa {}) pulado neste ciclo: {}",
                connection_id,
                company_id,
                e
            );
        }
    }

    Ok(())
}

async fn broadcast_connection(
    registry: &dyn ConnectionRegistry,
    metrics: &dyn MetricsSource,
    groups: &CompanyGroups,
    company_id: Uuid,
    connection_id: &str,
) -> Result<(), AppError> {
    // Filtros ausentes (TTL vencido) NÃO pulam a conexão: viram "sem filtro"
    let filters = registry
        .filters(connection_id)
        .await?
        .unwrap_or_default();

    let snapshot = metrics.compute(company_id, &filters).await?;

    groups.publish(
        company_id,
        MetricsPush {
            company_id,
            connection_id: connection_id.to_string(),
            metrics: snapshot,
            timestamp: Utc::now(),
        },
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::TopAgentEntry;
    use crate::realtime::registry::testing::InMemoryRegistry;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    // Fonte de métricas de mentira: devolve um snapshot cujo total reflete o
    // agent_id filtrado, e falha para um agente "envenenado".
    struct FakeSource {
        fail_for_agent: Option<i32>,
        calls: Mutex<Vec<MetricsFilters>>,
    }

    impl FakeSource {
        fn new(fail_for_agent: Option<i32>) -> Self {
            Self {
                fail_for_agent,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetricsSource for FakeSource {
        async fn compute(
            &self,
            _company_id: Uuid,
            filters: &MetricsFilters,
        ) -> Result<MetricsSnapshot, AppError> {
            self.calls.lock().unwrap().push(filters.clone());

            if self.fail_for_agent.is_some() && filters.agent_id == self.fail_for_agent {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "fonte indisponível"
                )));
            }

            let mut snapshot = MetricsSnapshot::zeroed();
            if let Some(agent_id) = filters.agent_id {
                snapshot.top_agents = vec![TopAgentEntry {
                    agent_id,
                    total: Decimal::from(100),
                }];
            }
            Ok(snapshot)
        }
    }

    fn filters_for(agent_id: i32) -> MetricsFilters {
        MetricsFilters {
            agent_id: Some(agent_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn each_connection_gets_its_own_filtered_snapshot() {
        let registry = InMemoryRegistry::new();
        let source = FakeSource::new(None);
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let mut rx_a = groups.join(company);
        let mut rx_b = groups.join(company);

        registry
            .register("conn-a", company, &filters_for(111111), Duration::from_secs(60))
            .await
            .unwrap();
        registry
            .register("conn-b", company, &filters_for(222222), Duration::from_secs(60))
            .await
            .unwrap();

        broadcast_company(&registry, &source, &groups, company)
            .await
            .unwrap();

        // Dois pushes no grupo, um por conexão, cada qual com o SEU filtro
        let mut seen = Vec::new();
        for _ in 0..2 {
            let push = rx_a.recv().await.unwrap();
            seen.push((push.connection_id.clone(), push.metrics.top_agents[0].agent_id));
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("conn-a".to_string(), 111111),
                ("conn-b".to_string(), 222222),
            ]
        );

        // O outro assinante recebe as mesmas mensagens (e filtraria pela tag)
        assert_eq!(rx_b.recv().await.unwrap().company_id, company);
    }

    #[tokio::test]
    async fn one_failing_connection_does_not_abort_its_siblings() {
        let registry = InMemoryRegistry::new();
        let source = FakeSource::new(Some(111111));
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let mut rx = groups.join(company);

        registry
            .register("conn-bad", company, &filters_for(111111), Duration::from_secs(60))
            .await
            .unwrap();
        registry
            .register("conn-ok", company, &filters_for(222222), Duration::from_secs(60))
            .await
            .unwrap();

        // Não propaga o erro da conexão envenenada
        broadcast_company(&registry, &source, &groups, company)
            .await
            .unwrap();

        // Só a conexão saudável recebeu push
        let push = rx.recv().await.unwrap();
        assert_eq!(push.connection_id, "conn-ok");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn expired_filters_degrade_to_unfiltered_push() {
        let registry = InMemoryRegistry::new();
        let source = FakeSource::new(None);
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let mut rx = groups.join(company);

        // TTL zero: os filtros somem antes do primeiro ciclo
        registry
            .register("conn-a", company, &filters_for(111111), Duration::ZERO)
            .await
            .unwrap();

        broadcast_company(&registry, &source, &groups, company)
            .await
            .unwrap();

        // A conexão continua recebendo — com filtros vazios, não pulada
        let push = rx.recv().await.unwrap();
        assert_eq!(push.connection_id, "conn-a");
        assert!(push.metrics.top_agents.is_empty());

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_empty());
    }

    #[tokio::test]
    async fn disconnected_connection_is_not_pushed_next_cycle() {
        let registry = InMemoryRegistry::new();
        let source = FakeSource::new(None);
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let mut rx = groups.join(company);

        registry
            .register("conn-gone", company, &filters_for(111111), Duration::from_secs(60))
            .await
            .unwrap();
        registry
            .register("conn-here", company, &filters_for(222222), Duration::from_secs(60))
            .await
            .unwrap();

        // A conexão cai entre o registro e o próximo tick
        registry.remove("conn-gone", company).await.unwrap();

        broadcast_company(&registry, &source, &groups, company)
            .await
            .unwrap();

        let push = rx.recv().await.unwrap();
        assert_eq!(push.connection_id, "conn-here");
        assert!(rx.try_recv().is_err());
    }
}
