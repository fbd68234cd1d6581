//src/main.rs

use std::env;
use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod realtime;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;
use crate::realtime::broadcast::BroadcastScheduler;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // O agendador de broadcast roda como task de fundo, independente dos
    // handlers de conexão. Uma falha num ciclo nunca derruba o servidor.
    let scheduler = BroadcastScheduler::new(
        app_state.company_repo.clone(),
        app_state.registry.clone(),
        Arc::new(app_state.metrics_service.clone()),
        app_state.groups.clone(),
        app_state.broadcast_period,
    );
    tokio::spawn(scheduler.run());

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let company_routes = Router::new()
        .route("/", post(handlers::companies::create_company))
        .route(
            "/me",
            get(handlers::companies::get_my_company)
                .patch(handlers::companies::update_company)
                .delete(handlers::companies::deactivate_company),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let agent_routes = Router::new()
        .route(
            "/",
            post(handlers::agents::create_agent).get(handlers::agents::list_agents),
        )
        .route(
            "/{id}",
            get(handlers::agents::get_agent)
                .patch(handlers::agents::update_agent)
                .delete(handlers::agents::deactivate_agent),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route("/{id}", axum::routing::patch(handlers::customers::update_customer))
        .route("/{id}/loyalty", post(handlers::customers::add_loyalty_points))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let transaction_routes = Router::new()
        .route("/", get(handlers::transactions::list_transactions))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/metrics", get(handlers::dashboard::get_metrics))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal.
    // O WebSocket fica FORA do auth_guard: o token chega pela query string e
    // a rejeição é por código de fechamento, não por status HTTP.
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/companies", company_routes)
        .nest("/api/agents", agent_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/transactions", transaction_routes)
        .nest("/api/dashboard", dashboard_routes)
        .route(
            "/ws/companies/dashboard",
            get(handlers::dashboard::dashboard_ws),
        )
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    // Inicia o servidor
    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
