//src/main.rs

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

#[cfg(test)]
mod test_utils;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Cria ou atualiza a tabela local antes de aceitar qualquer requisição
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    let inspecoes_routes = Router::new()
        .route("/", get(handlers::inspecoes::listar))
        .route(
            "/{id}",
            get(handlers::inspecoes::obter).delete(handlers::inspecoes::excluir),
        )
        .route("/{id}/relatorio", get(handlers::inspecoes::relatorio))
        .route("/{id}/relatorio/pdf", get(handlers::inspecoes::relatorio_pdf));

    let rascunho_routes = Router::new()
        .route(
            "/",
            post(handlers::rascunho::novo).get(handlers::rascunho::visao),
        )
        .route("/abrir/{id}", post(handlers::rascunho::abrir))
        .route("/empresa", put(handlers::rascunho::atualizar_empresa))
        .route("/etapa", put(handlers::rascunho::ir_para_etapa))
        .route("/departamento-ativo", put(handlers::rascunho::selecionar_departamento))
        .route("/alvo", put(handlers::rascunho::selecionar_alvo))
        .route(
            "/edicao",
            post(handlers::rascunho::iniciar_edicao).delete(handlers::rascunho::cancelar_edicao),
        )
        .route("/em-andamento", put(handlers::rascunho::em_andamento))
        .route("/itens", post(handlers::rascunho::upsert))
        .route("/itens/{tipo}/{indice}", delete(handlers::rascunho::remover))
        .route("/itens/{tipo}/{indice}/duplicar", post(handlers::rascunho::duplicar))
        .route("/itens/{tipo}/reordenar", post(handlers::rascunho::reordenar))
        .route("/salvar", post(handlers::rascunho::salvar))
        .route("/status", get(handlers::rascunho::status));

    let catalogo_routes = Router::new()
        .route("/tipos", get(handlers::catalogo::listar_tipos))
        .route("/perigos", get(handlers::catalogo::listar_perigos))
        .route(
            "/perigos/{codigo}/formulario",
            get(handlers::catalogo::formulario_do_perigo),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/conectividade", post(handlers::rascunho::conectividade))
        .nest("/api/inspecoes", inspecoes_routes)
        .nest("/api/rascunho", rascunho_routes)
        .nest("/api/catalogo", catalogo_routes)
        .with_state(app_state)
}
