// src/realtime/registry.rs

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::{common::error::AppError, models::metrics::MetricsFilters};

// Prefixos das chaves no Redis
const FILTERS_KEY_PREFIX: &str = "connection_filters:";
const COMPANY_CONNECTIONS_PREFIX: &str = "company:";

// ---
// 1. O contrato do registro de conexões
// ---
// Estado mutável compartilhado entre o gate e o agendador, por isso vive
// atrás de um trait: os dois lados recebem a MESMA instância injetada e os
// testes usam uma implementação em memória.
//
// Regras do contrato:
// - `register` guarda os filtros da conexão E anexa o connection_id à lista
//   da empresa, ambos com TTL ABSOLUTO (fixado no registro, sem renovação
//   em leituras). Uma conexão longa cujo registro expira passa a receber
//   métricas sem filtro — degradação documentada, não erro.
// - `filters` ausente NÃO é erro: o chamador trata como "sem filtro".
// - `remove` é idempotente: remover o que não existe é um no-op.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    async fn register(
        &self,
        connection_id: &str,
        company_id: Uuid,
        filters: &MetricsFilters,
        ttl: Duration,
    ) -> Result<(), AppError>;

    async fn filters(&self, connection_id: &str) -> Result<Option<MetricsFilters>, AppError>;

    async fn connections(&self, company_id: Uuid) -> Result<Vec<String>, AppError>;

    async fn remove(&self, connection_id: &str, company_id: Uuid) -> Result<(), AppError>;
}

fn filters_key(connection_id: &str) -> String {
    format!("{}{}", FILTERS_KEY_PREFIX, connection_id)
}

fn company_key(company_id: Uuid) -> String {
    format!("{}{}:connections", COMPANY_CONNECTIONS_PREFIX, company_id)
}

// ---
// 2. A implementação Redis
// ---
#[derive(Clone)]
pub struct RedisConnectionRegistry {
    client: redis::Client,
}

impl RedisConnectionRegistry {
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }
}

#[async_trait]
impl ConnectionRegistry for RedisConnectionRegistry {
    async fn register(
        &self,
        connection_id: &str,
        company_id: Uuid,
        filters: &MetricsFilters,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(filters)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar filtros: {}", e))?;

        let ttl_secs = ttl.as_secs() as i64;

        // Filtros da conexão, com expiração
        conn.set_ex::<_, _, ()>(filters_key(connection_id), json, ttl_secs as u64)
            .await?;

        // Anexa à lista de conexões ativas da empresa.
        // O EXPIRE na lista é renovado a cada novo registro: a lista só
        // desaparece quando a empresa fica um TTL inteiro sem conexões novas.
        let key = company_key(company_id);
        conn.rpush::<_, _, ()>(&key, connection_id).await?;
        conn.expire::<_, ()>(&key, ttl_secs).await?;

        Ok(())
    }

    async fn filters(&self, connection_id: &str) -> Result<Option<MetricsFilters>, AppError> {
        let mut conn = self.get_connection().await?;
        let json: Option<String> = conn.get(filters_key(connection_id)).await?;

        match json {
            Some(j) => {
                let filters: MetricsFilters = serde_json::from_str(&j)
                    .map_err(|e| anyhow::anyhow!("Filtros corrompidos no registro: {}", e))?;
                Ok(Some(filters))
            }
            None => Ok(None),
        }
    }

    async fn connections(&self, company_id: Uuid) -> Result<Vec<String>, AppError> {
        let mut conn = self.get_connection().await?;
        let ids: Vec<String> = conn.lrange(company_key(company_id), 0, -1).await?;
        Ok(ids)
    }

    async fn remove(&self, connection_id: &str, company_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;

        // Remove a primeira ocorrência na lista da empresa e apaga os
        // filtros. Os dois comandos são no-ops se nada existir.
        conn.lrem::<_, _, ()>(company_key(company_id), 1, connection_id)
            .await?;
        conn.del::<_, ()>(filters_key(connection_id)).await?;

        Ok(())
    }
}

// ---
// 3. Implementação em memória (para os testes)
// ---
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    struct Entry {
        filters: MetricsFilters,
        expires_at: Instant,
    }

    #[derive(Default)]
    pub struct InMemoryRegistry {
        filters: Mutex<HashMap<String, Entry>>,
        companies: Mutex<HashMap<Uuid, Vec<String>>>,
    }

    impl InMemoryRegistry {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ConnectionRegistry for InMemoryRegistry {
        async fn register(
            &self,
            connection_id: &str,
            company_id: Uuid,
            filters: &MetricsFilters,
            ttl: Duration,
        ) -> Result<(), AppError> {
            self.filters.lock().unwrap().insert(
                connection_id.to_string(),
                Entry {
                    filters: filters.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
            self.companies
                .lock()
                .unwrap()
                .entry(company_id)
                .or_default()
                .push(connection_id.to_string());
            Ok(())
        }

        async fn filters(&self, connection_id: &str) -> Result<Option<MetricsFilters>, AppError> {
            let mut map = self.filters.lock().unwrap();
            match map.get(connection_id) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    Ok(Some(entry.filters.clone()))
                }
                Some(_) => {
                    // TTL vencido: expira silenciosamente na leitura
                    map.remove(connection_id);
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        async fn connections(&self, company_id: Uuid) -> Result<Vec<String>, AppError> {
            Ok(self
                .companies
                .lock()
                .unwrap()
                .get(&company_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn remove(&self, connection_id: &str, company_id: Uuid) -> Result<(), AppError> {
            self.filters.lock().unwrap().remove(connection_id);
            if let Some(list) = self.companies.lock().unwrap().get_mut(&company_id) {
                if let Some(pos) = list.iter().position(|c| c == connection_id) {
                    list.remove(pos);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::InMemoryRegistry;
    use super::*;
    use chrono::NaiveDate;

    fn sample_filters() -> MetricsFilters {
        MetricsFilters {
            agent_id: Some(123456),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31),
        }
    }

    #[tokio::test]
    async fn register_then_lookup_returns_stored_filters() {
        let registry = InMemoryRegistry::new();
        let company = Uuid::new_v4();
        let filters = sample_filters();

        registry
            .register("conn-1", company, &filters, Duration::from_secs(60))
            .await
            .unwrap();

        let found = registry.filters("conn-1").await.unwrap();
        assert_eq!(found, Some(filters));

        let conns = registry.connections(company).await.unwrap();
        assert_eq!(conns, vec!["conn-1".to_string()]);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let registry = InMemoryRegistry::new();
        let company = Uuid::new_v4();

        registry
            .register("conn-1", company, &sample_filters(), Duration::ZERO)
            .await
            .unwrap();

        // TTL zero: já nasceu expirado
        assert_eq!(registry.filters("conn-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_filters_and_company_entry() {
        let registry = InMemoryRegistry::new();
        let company = Uuid::new_v4();

        registry
            .register("conn-1", company, &sample_filters(), Duration::from_secs(60))
            .await
            .unwrap();
        registry.remove("conn-1", company).await.unwrap();

        assert_eq!(registry.filters("conn-1").await.unwrap(), None);
        assert!(registry.connections(company).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_unknown_connection_is_a_noop() {
        let registry = InMemoryRegistry::new();
        let company = Uuid::new_v4();

        // Não pode dar erro nem pânico
        registry.remove("ghost", company).await.unwrap();
        assert!(registry.connections(company).await.unwrap().is_empty());
    }
}
