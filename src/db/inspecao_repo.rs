// src/db/inspecao_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::{
    common::error::AppError,
    models::inspecao::{Inspecao, InspecaoId, ResumoInspecao},
};

/// Persistência de agregados inteiros, chaveados por um id atribuído pelo armazenamento.
///
/// Cada `put` grava a árvore completa como um único valor: ou a inspeção inteira é
/// substituída, ou nada muda. Quem chama carimba `updated_at` antes de gravar.
#[async_trait]
pub trait InspecaoStore: Send + Sync {
    /// Insere (sem id) ou sobrescreve (com id). Devolve o id efetivo.
    async fn put(&self, inspecao: &Inspecao) -> Result<InspecaoId, AppError>;

    async fn get(&self, id: InspecaoId) -> Result<Inspecao, AppError>;

    async fn get_all(&self) -> Result<Vec<Inspecao>, AppError>;

    async fn delete(&self, id: InspecaoId) -> Result<(), AppError>;

    async fn resumos(&self) -> Result<Vec<ResumoInspecao>, AppError> {
        let todas = self.get_all().await?;
        Ok(todas.iter().filter_map(ResumoInspecao::de).collect())
    }
}

#[derive(Debug, FromRow)]
struct LinhaInspecao {
    id: i64,
    dados: String,
}

impl LinhaInspecao {
    fn into_inspecao(self) -> Result<Inspecao, AppError> {
        let mut inspecao: Inspecao = serde_json::from_str(&self.dados)?;
        // A coluna é a fonte da verdade para o id.
        inspecao.id = Some(InspecaoId(self.id));
        Ok(inspecao)
    }
}

// O repositório de inspeções, responsável pela tabela 'inspecoes' do banco local
#[derive(Clone)]
pub struct InspecaoRepository {
    pool: SqlitePool,
}

impl InspecaoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InspecaoStore for InspecaoRepository {
    async fn put(&self, inspecao: &Inspecao) -> Result<InspecaoId, AppError> {
        // O id fica só na coluna; o JSON guarda o resto da árvore.
        let mut dados = inspecao.clone();
        let id = dados.id.take();
        let json = serde_json::to_string(&dados)?;

        match id {
            None => {
                let resultado = sqlx::query(
                    "INSERT INTO inspecoes (dados, atualizado_em) VALUES (?1, ?2)",
                )
                .bind(&json)
                .bind(inspecao.updated_at)
                .execute(&self.pool)
                .await?;

                Ok(InspecaoId(resultado.last_insert_rowid()))
            }
            Some(id) => {
                // UPSERT: sobrescreve pelo id; sem linha com esse id, insere.
                sqlx::query(
                    r#"
                    INSERT INTO inspecoes (id, dados, atualizado_em)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT (id)
                    DO UPDATE SET
                        dados = EXCLUDED.dados,
                        atualizado_em = EXCLUDED.atualizado_em
                    "#,
                )
                .bind(id.0)
                .bind(&json)
                .bind(inspecao.updated_at)
                .execute(&self.pool)
                .await?;

                Ok(id)
            }
        }
    }

    async fn get(&self, id: InspecaoId) -> Result<Inspecao, AppError> {
        let linha = sqlx::query_as::<_, LinhaInspecao>(
            "SELECT id, dados FROM inspecoes WHERE id = ?1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match linha {
            Some(linha) => linha.into_inspecao(),
            None => Err(AppError::InspecaoNaoEncontrada(id)),
        }
    }

    async fn get_all(&self) -> Result<Vec<Inspecao>, AppError> {
        let linhas = sqlx::query_as::<_, LinhaInspecao>("SELECT id, dados FROM inspecoes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        linhas.into_iter().map(LinhaInspecao::into_inspecao).collect()
    }

    async fn delete(&self, id: InspecaoId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM inspecoes WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        tracing::debug!(%id, em = %Utc::now(), "inspeção removida do banco local");
        Ok(())
    }
}
