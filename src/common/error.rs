use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::inspecao::{InspecaoId, TipoEntidade};

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação: {}", campos_invalidos(.0).join(", "))]
    ValidationError(#[from] validator::ValidationErrors),

    // Referência velha vinda da interface (índice que já não existe)
    #[error("Índice {indice} fora do intervalo para {tipo} (total: {tamanho})")]
    IndiceForaDoIntervalo {
        tipo: TipoEntidade,
        indice: usize,
        tamanho: usize,
    },

    #[error("Inspeção {0} não encontrada")]
    InspecaoNaoEncontrada(InspecaoId),

    #[error("Código eSocial {0} não está no catálogo de perigos")]
    PerigoNaoCatalogado(String),

    #[error("Navegação inválida: {0}")]
    NavegacaoInvalida(String),

    #[error("Nenhum rascunho aberto")]
    RascunhoNaoAberto,

    #[error("Armazenamento local indisponível: {0}")]
    ArmazenamentoIndisponivel(String),

    #[error("Falha na transação do armazenamento: {0}")]
    TransacaoArmazenamento(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

pub fn campos_invalidos(erros: &validator::ValidationErrors) -> Vec<String> {
    let mut campos: Vec<String> = erros
        .field_errors()
        .keys()
        .map(|campo| campo.to_string())
        .collect();
    campos.sort();
    campos
}

// Pool fechado, timeout ou IO: o banco local não está acessível.
// O resto é falha da própria operação.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Configuration(_) => AppError::ArmazenamentoIndisponivel(e.to_string()),
            outro => AppError::TransacaoArmazenamento(outro.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::TransacaoArmazenamento(e.to_string())
    }
}

impl AppError {
    pub fn e_de_armazenamento(&self) -> bool {
        matches!(
            self,
            AppError::ArmazenamentoIndisponivel(_) | AppError::TransacaoArmazenamento(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
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
            AppError::IndiceForaDoIntervalo { .. } => (
                StatusCode::CONFLICT,
                "O item selecionado não existe mais. Atualize a tela.".to_string(),
            ),
            AppError::InspecaoNaoEncontrada(id) => (
                StatusCode::NOT_FOUND,
                format!("Inspeção {} não encontrada.", id),
            ),
            AppError::PerigoNaoCatalogado(codigo) => (
                StatusCode::NOT_FOUND,
                format!("Código eSocial {} não está no catálogo.", codigo),
            ),
            AppError::NavegacaoInvalida(motivo) => (StatusCode::BAD_REQUEST, motivo),
            AppError::RascunhoNaoAberto => (
                StatusCode::CONFLICT,
                "Nenhuma inspeção está aberta para edição.".to_string(),
            ),
            ref e if e.e_de_armazenamento() => {
                tracing::error!("Falha ao salvar: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Não foi possível salvar. Suas alterações continuam abertas.".to_string(),
                )
            }
            ref e => {
                tracing::error!("Erro Interno: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cada_erro_tem_seu_status_http() {
        let casos = [
            (AppError::InspecaoNaoEncontrada(InspecaoId(7)), StatusCode::NOT_FOUND),
            (AppError::PerigoNaoCatalogado("99.99.999".into()), StatusCode::NOT_FOUND),
            (AppError::NavegacaoInvalida("Selecione um departamento.".into()), StatusCode::BAD_REQUEST),
            (AppError::RascunhoNaoAberto, StatusCode::CONFLICT),
            (
                AppError::IndiceForaDoIntervalo {
                    tipo: TipoEntidade::Cargo,
                    indice: 3,
                    tamanho: 1,
                },
                StatusCode::CONFLICT,
            ),
            (AppError::ArmazenamentoIndisponivel("disco cheio".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (erro, esperado) in casos {
            assert_eq!(erro.into_response().status(), esperado);
        }
    }
}
