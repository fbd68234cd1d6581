// src/realtime/gate.rs

use std::collections::HashMap;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        auth::{Role, User},
        company::Company,
        metrics::PeriodicUpdate,
    },
    realtime::filters,
};

// ---
// Códigos de fechamento do socket
// ---
// Contrato com o cliente do dashboard: cada motivo de rejeição tem um código
// próprio, verificável por máquina. NÃO renumerar.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
pub const CLOSE_NO_COMPANY: u16 = 4003;
pub const CLOSE_INVALID_FILTER: u16 = 4400;
pub const CLOSE_AGENT_NOT_FOUND: u16 = 4404;
pub const CLOSE_INTERNAL_ERROR: u16 = 4500;

pub fn close_code_for(error: &AppError) -> u16 {
    match error {
        AppError::InvalidToken | AppError::InvalidCredentials | AppError::UserNotFound => {
            CLOSE_UNAUTHENTICATED
        }
        AppError::NoCompany | AppError::CompanyNotFound => CLOSE_NO_COMPANY,
        AppError::InvalidFilter(_) => CLOSE_INVALID_FILTER,
        AppError::AgentNotFound => CLOSE_AGENT_NOT_FOUND,
        _ => CLOSE_INTERNAL_ERROR,
    }
}

// ---
// O gate da conexão
// ---
// Sequência: autentica -> resolve a empresa -> valida filtros -> registra no
// Redis -> entra no grupo de broadcast. Cada passo é um ponto de rejeição
// com seu código; a exceção é o registro no Redis, que em caso de falha NÃO
// derruba a conexão (rastreamento degradado: o cliente fica conectado mas o
// agendador nunca o verá).
pub async fn run_dashboard_session(
    state: AppState,
    mut socket: WebSocket,
    params: HashMap<String, String>,
) {
    // 1. Credencial
    let user = match authenticate(&state, &params).await {
        Ok(user) => user,
        Err(e) => {
            close_with(&mut socket, close_code_for(&e), &e.to_string()).await;
            return;
        }
    };

    // 2. Empresa dona da conexão
    let company = match resolve_company(&state, &user).await {
        Ok(company) => company,
        Err(e) => {
            close_with(&mut socket, close_code_for(&e), &e.to_string()).await;
            return;
        }
    };

    // 3. Filtros
    let filters = match filters::validate_filters(&params, company.id, &state.agent_repo).await {
        Ok(filters) => filters,
        Err(e) => {
            close_with(&mut socket, close_code_for(&e), &e.to_string()).await;
            return;
        }
    };

    let connection_id = Uuid::new_v4().to_string();

    // 4. Registro (melhor-esforço: disponibilidade acima de consistência)
    if let Err(e) = state
        .registry
        .register(&connection_id, company.id, &filters, state.connection_ttl)
        .await
    {
        tracing::warn!(
            "Registro da conexão {} falhou ({}); conexão aceita sem rastreamento",
            connection_id,
            e
        );
    }

    // 5. Grupo de broadcast da empresa
    let mut group_rx = state.groups.join(company.id);

    tracing::info!(
        "Dashboard conectado: conexão {} (empresa {}, usuário {})",
        connection_id,
        company.id,
        user.id
    );

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Loop da sessão: encaminha os pushes endereçados a esta conexão e
    // observa o lado do cliente para detectar a desconexão.
    loop {
        tokio::select! {
            push = group_rx.recv() => {
                match push {
                    Ok(push) if push.connection_id == connection_id => {
                        let update = PeriodicUpdate::from_push(push);
                        let json = match serde_json::to_string(&update) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Falha ao serializar push: {}", e);
                                continue;
                            }
                        };
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    // Push de outra conexão do mesmo grupo: descarta
                    Ok(_) => {}
                    // Ficou para trás no canal: perde os antigos e segue
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Conexão {} perdeu {} pushes (lenta)",
                            connection_id,
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    // O canal é só de saída; texto do cliente é ignorado
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Limpeza incondicional e idempotente — roda mesmo que o setup tenha
    // ficado pela metade (ex.: grupo ok, registro no Redis falhou).
    drop(group_rx);
    if let Err(e) = state.registry.remove(&connection_id, company.id).await {
        tracing::warn!("Falha ao remover conexão {} do registro: {}", connection_id, e);
    }
    state.groups.leave(company.id);

    tracing::info!("Dashboard desconectado: conexão {}", connection_id);
}

// O token chega por query string (`token=`) porque navegadores não enviam
// cabeçalhos customizados no handshake de WebSocket.
async fn authenticate(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<User, AppError> {
    let token = params.get("token").ok_or(AppError::InvalidToken)?;
    state.auth_service.validate_token(token).await
}

// Deriva a empresa dona a partir da identidade autenticada:
// dono -> a própria empresa; agente -> a empresa a que está vinculado.
async fn resolve_company(state: &AppState, user: &User) -> Result<Company, AppError> {
    let company = match user.role() {
        Some(Role::Owner) => state.company_repo.find_active_by_owner(user.id).await?,
        Some(Role::Agent) => {
            state
                .company_repo
                .find_active_by_agent_user(user.id)
                .await?
        }
        _ => None,
    };
    company.ok_or(AppError::NoCompany)
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: reason.to_string().into(),
    };
    // O cliente pode já ter ido embora; o erro aqui não interessa
    let _ = socket.send(Message::Close(Some(frame))).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rejection_reason_has_a_distinct_close_code() {
        let codes = [
            close_code_for(&AppError::InvalidToken),
            close_code_for(&AppError::NoCompany),
            close_code_for(&AppError::InvalidFilter("x".into())),
            close_code_for(&AppError::AgentNotFound),
            close_code_for(&AppError::InternalServerError(anyhow::anyhow!("x"))),
        ];

        let mut unique = codes.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn close_codes_are_stable() {
        // Contrato com o cliente: estes valores não podem mudar
        assert_eq!(close_code_for(&AppError::InvalidToken), 4001);
        assert_eq!(close_code_for(&AppError::NoCompany), 4003);
        assert_eq!(close_code_for(&AppError::InvalidFilter("x".into())), 4400);
        assert_eq!(close_code_for(&AppError::AgentNotFound), 4404);
        assert_eq!(
            close_code_for(&AppError::InternalServerError(anyhow::anyhow!("x"))),
            4500
        );
    }
}
