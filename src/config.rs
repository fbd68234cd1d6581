// src/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        AgentRepository, CompanyRepository, CustomerRepository, TransactionRepository,
        UserRepository,
    },
    realtime::{CompanyGroups, ConnectionRegistry, RedisConnectionRegistry},
    services::{AgentService, AuthService, CompanyService, CustomerService, MetricsService},
};

// Intervalo padrão do agendador de broadcast ("a cada poucos minutos")
const DEFAULT_BROADCAST_INTERVAL_SECS: u64 = 120;
// TTL padrão de uma entrada no registro de conexões (absoluto)
const DEFAULT_CONNECTION_TTL_SECS: u64 = 3600;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    // Serviços
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub agent_service: AgentService,
    pub customer_service: CustomerService,
    pub metrics_service: MetricsService,

    // Repositórios usados diretamente (gate, validação de filtros, REST)
    pub company_repo: CompanyRepository,
    pub agent_repo: AgentRepository,
    pub transaction_repo: TransactionRepository,

    // O núcleo do tempo real: registro de conexões + grupos de broadcast
    pub registry: Arc<dyn ConnectionRegistry>,
    pub groups: CompanyGroups,
    pub connection_ttl: Duration,
    pub broadcast_period: Duration,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let broadcast_period = Duration::from_secs(
            env_u64("BROADCAST_INTERVAL_SECS", DEFAULT_BROADCAST_INTERVAL_SECS),
        );
        let connection_ttl =
            Duration::from_secs(env_u64("CONNECTION_TTL_SECS", DEFAULT_CONNECTION_TTL_SECS));

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // O registro de conexões vive no Redis. A conexão em si é preguiçosa:
        // se o Redis estiver fora, o servidor sobe mesmo assim e o registro
        // fica degradado (política de disponibilidade do gate).
        let registry: Arc<dyn ConnectionRegistry> =
            Arc::new(RedisConnectionRegistry::new(&redis_url).map_err(|e| {
                anyhow::anyhow!("REDIS_URL inválida: {}", e)
            })?);

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let agent_repo = AgentRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let transaction_repo = TransactionRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret.clone());
        let company_service = CompanyService::new(company_repo.clone());
        let agent_service = AgentService::new(agent_repo.clone(), user_repo.clone());
        let customer_service = CustomerService::new(customer_repo.clone(), agent_repo.clone());
        let metrics_service = MetricsService::new(transaction_repo.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            company_service,
            agent_service,
            customer_service,
            metrics_service,
            company_repo,
            agent_repo,
            transaction_repo,
            registry,
            groups: CompanyGroups::new(),
            connection_ttl,
            broadcast_period,
        })
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
