// src/handlers/inspecoes.rs

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        inspecao::{Inspecao, InspecaoId, ResumoInspecao},
        relatorio::Relatorio,
    },
};

// GET /api/inspecoes
#[utoipa::path(
    get,
    path = "/api/inspecoes",
    tag = "Inspeções",
    responses(
        (status = 200, description = "Inspeções salvas no banco local", body = Vec<ResumoInspecao>)
    )
)]
pub async fn listar(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let resumos = app_state.store.resumos().await?;
    Ok(Json(resumos))
}

// GET /api/inspecoes/{id}
#[utoipa::path(
    get,
    path = "/api/inspecoes/{id}",
    tag = "Inspeções",
    params(("id" = i64, Path, description = "ID da inspeção")),
    responses(
        (status = 200, description = "Inspeção completa", body = Inspecao),
        (status = 404, description = "Inspeção não encontrada")
    )
)]
pub async fn obter(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let inspecao = app_state.store.get(InspecaoId(id)).await?;
    Ok(Json(inspecao))
}

// DELETE /api/inspecoes/{id}
#[utoipa::path(
    delete,
    path = "/api/inspecoes/{id}",
    tag = "Inspeções",
    params(("id" = i64, Path, description = "ID da inspeção")),
    responses(
        (status = 204, description = "Inspeção excluída; se estava aberta, o rascunho foi fechado")
    )
)]
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // Passa pelo serviço: se for o rascunho aberto, ele é fechado junto.
    app_state.rascunho_service.excluir(InspecaoId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/inspecoes/{id}/relatorio
#[utoipa::path(
    get,
    path = "/api/inspecoes/{id}/relatorio",
    tag = "Relatórios",
    params(("id" = i64, Path, description = "ID da inspeção")),
    responses(
        (status = 200, description = "Relatório compilado", body = Relatorio),
        (status = 404, description = "Inspeção não encontrada")
    )
)]
pub async fn relatorio(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let relatorio = app_state.relatorio_service.gerar(InspecaoId(id)).await?;
    Ok(Json(relatorio))
}

// GET /api/inspecoes/{id}/relatorio/pdf
#[utoipa::path(
    get,
    path = "/api/inspecoes/{id}/relatorio/pdf",
    tag = "Relatórios",
    params(("id" = i64, Path, description = "ID da inspeção")),
    responses(
        (status = 200, description = "Relatório em PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Inspeção não encontrada")
    )
)]
pub async fn relatorio_pdf(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let pdf_bytes = app_state.relatorio_service.gerar_pdf(InspecaoId(id)).await?;

    // Exibe no navegador; a impressão fica por conta da interface.
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"inspecao_{}.pdf\"", id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
