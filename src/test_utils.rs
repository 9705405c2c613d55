// src/test_utils.rs
//
// Dublês e utilitários compartilhados pelos testes.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    common::error::AppError,
    db::InspecaoStore,
    models::inspecao::{Inspecao, InspecaoId},
};

/// Banco SQLite em memória com as migrações aplicadas.
pub async fn pool_em_memoria() -> SqlitePool {
    // Uma conexão só e sem expiração: o banco em memória vive enquanto ela viver.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("falha ao abrir o SQLite em memória");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("falha ao rodar as migrações");

    pool
}

/// Armazenamento em memória que conta as gravações e pode ser forçado a falhar.
#[derive(Default)]
pub struct MemoriaStore {
    dados: Mutex<BTreeMap<i64, Inspecao>>,
    gravacoes: AtomicUsize,
    falhar: AtomicBool,
}

impl MemoriaStore {
    pub fn gravacoes(&self) -> usize {
        self.gravacoes.load(Ordering::SeqCst)
    }

    pub fn falhar(&self, falhar: bool) {
        self.falhar.store(falhar, Ordering::SeqCst);
    }

    pub fn semear(&self, mut inspecao: Inspecao) -> InspecaoId {
        let mut dados = self.dados.lock().unwrap();
        let id = dados.keys().next_back().map_or(1, |ultimo| ultimo + 1);
        inspecao.id = Some(InspecaoId(id));
        dados.insert(id, inspecao);
        InspecaoId(id)
    }
}

#[async_trait]
impl InspecaoStore for MemoriaStore {
    async fn put(&self, inspecao: &Inspecao) -> Result<InspecaoId, AppError> {
        self.gravacoes.fetch_add(1, Ordering::SeqCst);
        if self.falhar.load(Ordering::SeqCst) {
            return Err(AppError::ArmazenamentoIndisponivel("disco cheio".into()));
        }

        let mut dados = self.dados.lock().unwrap();
        let id = match inspecao.id {
            Some(id) => id.0,
            None => dados.keys().next_back().map_or(1, |ultimo| ultimo + 1),
        };
        let mut copia = inspecao.clone();
        copia.id = Some(InspecaoId(id));
        dados.insert(id, copia);
        Ok(InspecaoId(id))
    }

    async fn get(&self, id: InspecaoId) -> Result<Inspecao, AppError> {
        self.dados
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .ok_or(AppError::InspecaoNaoEncontrada(id))
    }

    async fn get_all(&self) -> Result<Vec<Inspecao>, AppError> {
        Ok(self.dados.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, id: InspecaoId) -> Result<(), AppError> {
        self.dados.lock().unwrap().remove(&id.0);
        Ok(())
    }
}
