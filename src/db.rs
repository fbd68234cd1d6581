pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod agent_repo;
pub use agent_repo::AgentRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod transaction_repo;
pub use transaction_repo::TransactionRepository;

// Diz se o erro é uma violação de UNIQUE numa constraint específica
// (pelo nome parcial, ex.: "agent_id" casa com "agents_agent_id_key").
// Serve para distinguir a colisão de identificador sorteado — que merece
// novo sorteio — de qualquer outra violação.
pub(crate) fn is_unique_violation_on(err: &sqlx::Error, constraint_part: &str) -> bool {
    err.as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| db_err.constraint())
        .map(|name| name.contains(constraint_part))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation_on(&sqlx::Error::RowNotFound, "agent_id"));
    }
}
