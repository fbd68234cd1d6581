// src/services/ids.rs

use std::future::Future;

use crate::common::error::AppError;

// Tentativas de sorteio antes de desistir. Com faixas de centenas de
// milhares de valores livres, chegar aqui indica esgotamento real da faixa
// ou um problema sério de contenção.
pub(crate) const MAX_ATTEMPTS: usize = 5;

// Laço sorteia-e-insere dos identificadores públicos numéricos.
// `try_once` sorteia um candidato e tenta a criação: devolve Ok(None) em
// colisão (na pré-checagem ou na UNIQUE do insert) e Ok(Some(_)) quando a
// criação foi concluída. O limite de tentativas impede o laço infinito.
pub(crate) async fn allocate<T, F, Fut>(
    max_attempts: usize,
    mut try_once: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, AppError>>,
{
    for _ in 0..max_attempts {
        if let Some(value) = try_once().await? {
            return Ok(value);
        }
    }

    Err(AppError::InternalServerError(anyhow::anyhow!(
        "Esgotadas as {} tentativas de gerar um identificador livre",
        max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn first_free_candidate_wins() {
        let value = allocate(5, || async { Ok::<_, AppError>(Some(42)) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn collisions_trigger_a_fresh_draw() {
        let calls = AtomicUsize::new(0);

        // Duas colisões (pré-checagem ou UNIQUE do banco), depois sucesso
        let value = allocate(5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Ok::<_, AppError>(None)
                } else {
                    Ok(Some(n))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_cap() {
        let calls = AtomicUsize::new(0);

        let err = allocate::<i32, _, _>(3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Option<i32>, AppError>(None) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InternalServerError(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
