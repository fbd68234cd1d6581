use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// As seis primeiras variantes "de negócio" são terminais para a requisição
// (ou para a tentativa de conexão do socket); as de infraestrutura são
// tratadas como degradação, nunca como pânico.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Empresa não encontrada")]
    CompanyNotFound,

    #[error("Este usuário já possui uma empresa")]
    CompanyAlreadyExists,

    // O usuário autenticado não está ligado a nenhuma empresa ativa.
    // No socket do dashboard isso fecha a conexão com código próprio.
    #[error("Usuário sem empresa ativa")]
    NoCompany,

    #[error("Agente não encontrado")]
    AgentNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Filtro malformado ou contraditório (datas fora do formato YYYY-MM-DD,
    // start_date depois de end_date, agent_id não numérico...)
    #[error("Filtro inválido: {0}")]
    InvalidFilter(String),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    // Redis fora do ar. No gate isso NÃO derruba a conexão (trade-off de
    // disponibilidade); no agendador vira skip da conexão naquele ciclo.
    #[error("Registro de conexões indisponível")]
    RegistryUnavailable(#[from] redis::RedisError),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::CompanyNotFound => {
                (StatusCode::NOT_FOUND, "Empresa não encontrada.".to_string())
            }
            AppError::CompanyAlreadyExists => (
                StatusCode::CONFLICT,
                "Este usuário já possui uma empresa cadastrada.".to_string(),
            ),
            AppError::NoCompany => (
                StatusCode::FORBIDDEN,
                "O usuário não está vinculado a nenhuma empresa ativa.".to_string(),
            ),
            AppError::AgentNotFound => {
                (StatusCode::NOT_FOUND, "Agente não encontrado.".to_string())
            }
            AppError::CustomerNotFound => {
                (StatusCode::NOT_FOUND, "Cliente não encontrado.".to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::InvalidFilter(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),

            // Todos os erros de infraestrutura viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
