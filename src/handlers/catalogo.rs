// src/handlers/catalogo.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{catalogo::EntradaCatalogo, formularios::FormRisco},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FiltroTipo {
    /// Tipo base; subtipos psicossociais entram junto.
    pub tipo: String,
}

// GET /api/catalogo/tipos
#[utoipa::path(
    get,
    path = "/api/catalogo/tipos",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Tipos de perigo distintos, na ordem do catálogo", body = Vec<String>)
    )
)]
pub async fn listar_tipos(State(app_state): State<AppState>) -> impl IntoResponse {
    let tipos: Vec<String> = app_state.catalogo.tipos().into_iter().map(str::to_string).collect();
    Json(tipos)
}

// GET /api/catalogo/perigos?tipo=Físico
#[utoipa::path(
    get,
    path = "/api/catalogo/perigos",
    tag = "Catálogo",
    params(FiltroTipo),
    responses(
        (status = 200, description = "Perigos do tipo informado", body = Vec<EntradaCatalogo>)
    )
)]
pub async fn listar_perigos(
    State(app_state): State<AppState>,
    Query(filtro): Query<FiltroTipo>,
) -> impl IntoResponse {
    let perigos: Vec<_> = app_state.catalogo.por_tipo(&filtro.tipo).into_iter().cloned().collect();
    Json(perigos)
}

// GET /api/catalogo/perigos/{codigo}/formulario
// Formulário de risco já preenchido com a linha do catálogo.
#[utoipa::path(
    get,
    path = "/api/catalogo/perigos/{codigo}/formulario",
    tag = "Catálogo",
    params(("codigo" = String, Path, description = "Código eSocial", example = "01.01.001")),
    responses(
        (status = 200, description = "Formulário de risco pré-preenchido", body = FormRisco),
        (status = 404, description = "Código fora do catálogo")
    )
)]
pub async fn formulario_do_perigo(
    State(app_state): State<AppState>,
    Path(codigo): Path<String>,
) -> Result<Json<FormRisco>, AppError> {
    let entrada = app_state
        .catalogo
        .buscar(&codigo)
        .ok_or(AppError::PerigoNaoCatalogado(codigo))?;
    Ok(Json(FormRisco::do_catalogo(entrada)))
}
