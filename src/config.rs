// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::{
    db::{InspecaoRepository, InspecaoStore},
    models::catalogo::CatalogoPerigos,
    services::{
        autosave_service::{AutoSaveConfig, AutosaveHandle, CoordenadorAutosave, RascunhoCompartilhado},
        conectividade::SinalConectividade,
        rascunho_service::RascunhoService,
        relatorio_service::RelatorioService,
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub autosave: AutoSaveConfig,
    pub fonts_dir: PathBuf,
    pub catalogo_perigos: Option<PathBuf>,
}

impl Config {
    /// Lê o `.env` (se existir) e depois as variáveis de ambiente.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let debounce_ms = match env::var("AUTOSAVE_DEBOUNCE_MS") {
            Ok(valor) => valor
                .trim()
                .parse()
                .with_context(|| format!("AUTOSAVE_DEBOUNCE_MS inválido: {valor}"))?,
            Err(_) => AutoSaveConfig::default().debounce_ms,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://inspecoes.db?mode=rwc".into()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            autosave: AutoSaveConfig { debounce_ms },
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".into()).into(),
            catalogo_perigos: env::var("CATALOGO_PERIGOS").ok().map(PathBuf::from),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub store: Arc<dyn InspecaoStore>,
    pub catalogo: Arc<CatalogoPerigos>,
    pub conectividade: SinalConectividade,
    pub rascunho_service: RascunhoService,
    pub relatorio_service: RelatorioService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .with_context(|| format!("não foi possível abrir o banco local {}", config.database_url))?;

        tracing::info!("✅ Banco de dados local aberto com sucesso!");

        let catalogo = match &config.catalogo_perigos {
            Some(caminho) => {
                let catalogo = CatalogoPerigos::carregar(caminho)
                    .with_context(|| format!("falha ao carregar o catálogo {}", caminho.display()))?;
                tracing::info!("📚 Catálogo de perigos carregado: {} entradas", catalogo.total_entradas());
                catalogo
            }
            None => {
                tracing::warn!("CATALOGO_PERIGOS não definido; catálogo de perigos vazio");
                CatalogoPerigos::default()
            }
        };

        // --- Monta o gráfico de dependências ---
        let store: Arc<dyn InspecaoStore> = Arc::new(InspecaoRepository::new(db_pool.clone()));
        let rascunho: RascunhoCompartilhado = Arc::new(Mutex::new(None));
        let conectividade = SinalConectividade::new(true);

        let coordenador = CoordenadorAutosave::new(
            store.clone(),
            rascunho.clone(),
            config.autosave,
            conectividade.online(),
        );
        let autosave = AutosaveHandle::iniciar(coordenador, conectividade.assinar());

        let rascunho_service = RascunhoService::new(rascunho, store.clone(), autosave);
        let relatorio_service = RelatorioService::new(store.clone(), config.fonts_dir.clone());

        Ok(Self {
            db_pool,
            store,
            catalogo: Arc::new(catalogo),
            conectividade,
            rascunho_service,
            relatorio_service,
        })
    }
}
