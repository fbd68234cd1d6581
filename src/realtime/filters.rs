// src/realtime/filters.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError, db::AgentRepository, models::metrics::MetricsFilters,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

// A validação só precisa saber se um agent_id pertence à empresa; o trait
// (como o MetricsSource do agendador) deixa os testes rodarem sem banco.
#[async_trait]
pub trait AgentLookup: Send + Sync {
    async fn is_member(&self, agent_id: i32, company_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl AgentLookup for AgentRepository {
    async fn is_member(&self, agent_id: i32, company_id: Uuid) -> Result<bool, AppError> {
        Ok(self.find_in_company(agent_id, company_id).await?.is_some())
    }
}

// ---
// 1. Parse puro dos parâmetros de query
// ---
// Regras:
// - datas no formato YYYY-MM-DD; qualquer outra coisa é InvalidFilter;
// - com as duas datas presentes, start_date <= end_date;
// - um lado ausente fica SEM restrição naquele lado (nada de completar com
//   uma data-época fixa);
// - agent_id precisa ser numérico (a checagem de pertencimento à empresa é
//   feita depois, contra o banco).
pub fn parse_filter_params(
    params: &HashMap<String, String>,
) -> Result<MetricsFilters, AppError> {
    let start_date = parse_date_param(params, "start_date")?;
    let end_date = parse_date_param(params, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::InvalidFilter(
                "start_date deve ser anterior ou igual a end_date.".to_string(),
            ));
        }
    }

    let agent_id = match params.get("agent_id") {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            AppError::InvalidFilter("agent_id deve ser numérico.".to_string())
        })?),
        None => None,
    };

    Ok(MetricsFilters {
        agent_id,
        start_date,
        end_date,
    })
}

fn parse_date_param(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<Option<NaiveDate>, AppError> {
    match params.get(name) {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                AppError::InvalidFilter(format!("{} inválido (use YYYY-MM-DD).", name))
            })?;
            Ok(Some(date))
        }
        None => Ok(None),
    }
}

// ---
// 2. Validação completa (parse + pertencimento do agente)
// ---
// `AgentNotFound` é deliberadamente distinto de `InvalidFilter`: um agent_id
// bem formado mas de outra empresa (ou inexistente) não é um filtro
// malformado — é uma referência que não resolve.
pub async fn validate_filters(
    params: &HashMap<String, String>,
    company_id: Uuid,
    agents: &dyn AgentLookup,
) -> Result<MetricsFilters, AppError> {
    let filters = parse_filter_params(params)?;

    if let Some(agent_id) = filters.agent_id {
        if !agents.is_member(agent_id, company_id).await? {
            return Err(AppError::AgentNotFound);
        }
    }

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_params_mean_no_filter_at_all() {
        let filters = parse_filter_params(&params(&[])).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn parses_well_formed_dates_and_agent() {
        let filters = parse_filter_params(&params(&[
            ("start_date", "2025-01-01"),
            ("end_date", "2025-01-31"),
            ("agent_id", "123456"),
        ]))
        .unwrap();

        assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filters.end_date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(filters.agent_id, Some(123456));
    }

    #[test]
    fn one_sided_range_leaves_the_other_side_open() {
        let filters = parse_filter_params(&params(&[("start_date", "2025-06-15")])).unwrap();
        assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2025, 6, 15));
        assert_eq!(filters.end_date, None);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = parse_filter_params(&params(&[
            ("start_date", "2025-02-01"),
            ("end_date", "2025-01-01"),
        ]))
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidFilter(_)));
    }

    #[test]
    fn unparseable_date_is_rejected() {
        for bad in ["2025/01/01", "01-02-2025", "ontem", "2025-13-40"] {
            let err = parse_filter_params(&params(&[("start_date", bad)])).unwrap_err();
            assert!(matches!(err, AppError::InvalidFilter(_)), "aceitou {:?}", bad);
        }
    }

    #[test]
    fn non_numeric_agent_id_is_rejected() {
        let err = parse_filter_params(&params(&[("agent_id", "abc")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
    }

    #[test]
    fn equal_start_and_end_are_accepted() {
        let filters = parse_filter_params(&params(&[
            ("start_date", "2025-03-10"),
            ("end_date", "2025-03-10"),
        ]))
        .unwrap();
        assert_eq!(filters.start_date, filters.end_date);
    }

    // Quadro fixo de agentes, para validar pertencimento sem banco
    struct StaticRoster(Vec<i32>);

    #[async_trait]
    impl AgentLookup for StaticRoster {
        async fn is_member(&self, agent_id: i32, _company_id: Uuid) -> Result<bool, AppError> {
            Ok(self.0.contains(&agent_id))
        }
    }

    #[tokio::test]
    async fn well_formed_but_foreign_agent_id_is_agent_not_found() {
        let roster = StaticRoster(vec![123456]);

        // 999999 é numérico e bem formado, mas não pertence à empresa
        let err = validate_filters(&params(&[("agent_id", "999999")]), Uuid::new_v4(), &roster)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AgentNotFound));
        // No socket, essa rejeição fecha com o código próprio
        assert_eq!(crate::realtime::gate::close_code_for(&err), 4404);
    }

    #[tokio::test]
    async fn member_agent_id_passes_the_membership_check() {
        let roster = StaticRoster(vec![123456]);

        let filters = validate_filters(&params(&[("agent_id", "123456")]), Uuid::new_v4(), &roster)
            .await
            .unwrap();

        assert_eq!(filters.agent_id, Some(123456));
    }
}
