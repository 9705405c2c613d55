// src/handlers/rascunho.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        formularios::{FormEmpresa, Formulario},
        inspecao::{InspecaoId, TipoEntidade},
    },
    services::{
        autosave_service::{ResultadoSalvamento, StatusSalvamento},
        rascunho::{AlvoRiscos, Edicao, Etapa, SessaoRascunho},
    },
};

// =============================================================================
//  ÁREA 1: CICLO DE VIDA DO RASCUNHO
// =============================================================================

// POST /api/rascunho
#[utoipa::path(
    post,
    path = "/api/rascunho",
    tag = "Rascunho",
    responses(
        (status = 201, description = "Rascunho novo, vazio, com o cursor na etapa 0", body = SessaoRascunho)
    )
)]
pub async fn novo(State(app_state): State<AppState>) -> impl IntoResponse {
    let sessao = app_state.rascunho_service.novo().await;
    (StatusCode::CREATED, Json(sessao))
}

// POST /api/rascunho/abrir/{id}
#[utoipa::path(
    post,
    path = "/api/rascunho/abrir/{id}",
    tag = "Rascunho",
    params(("id" = i64, Path, description = "ID da inspeção salva")),
    responses(
        (status = 200, description = "Inspeção carregada como rascunho", body = SessaoRascunho),
        (status = 404, description = "Inspeção não encontrada")
    )
)]
pub async fn abrir(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state.rascunho_service.abrir(InspecaoId(id)).await?;
    Ok(Json(sessao))
}

// GET /api/rascunho
#[utoipa::path(
    get,
    path = "/api/rascunho",
    tag = "Rascunho",
    responses(
        (status = 200, description = "Rascunho aberto e cursor do assistente", body = SessaoRascunho),
        (status = 409, description = "Nenhum rascunho aberto")
    )
)]
pub async fn visao(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state.rascunho_service.visao().await?;
    Ok(Json(sessao))
}

// POST /api/rascunho/salvar
#[utoipa::path(
    post,
    path = "/api/rascunho/salvar",
    tag = "Rascunho",
    responses(
        (status = 200, description = "Salvo, ou ignorado quando a empresa não tem nome", body = ResultadoSalvamento),
        (status = 409, description = "Nenhum rascunho aberto"),
        (status = 503, description = "Banco local indisponível")
    )
)]
pub async fn salvar(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state.rascunho_service.salvar().await?;
    Ok(Json(resultado))
}

// GET /api/rascunho/status
#[utoipa::path(
    get,
    path = "/api/rascunho/status",
    tag = "Rascunho",
    responses(
        (status = 200, description = "Indicador do último salvamento", body = StatusSalvamento)
    )
)]
pub async fn status(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.rascunho_service.status())
}

// =============================================================================
//  ÁREA 2: NAVEGAÇÃO DO ASSISTENTE
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct EtapaPayload {
    #[schema(value_type = u8, minimum = 0, maximum = 3)]
    pub etapa: Etapa,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IndicePayload {
    pub indice: usize,
}

// PUT /api/rascunho/etapa
#[utoipa::path(
    put,
    path = "/api/rascunho/etapa",
    tag = "Assistente",
    request_body = EtapaPayload,
    responses(
        (status = 200, description = "Etapa alterada", body = SessaoRascunho),
        (status = 400, description = "Etapa exige departamento ou alvo selecionado")
    )
)]
pub async fn ir_para_etapa(
    State(app_state): State<AppState>,
    Json(payload): Json<EtapaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state
        .rascunho_service
        .navegar(|s| s.ir_para_etapa(payload.etapa))
        .await?;
    Ok(Json(sessao))
}

// PUT /api/rascunho/departamento-ativo
#[utoipa::path(
    put,
    path = "/api/rascunho/departamento-ativo",
    tag = "Assistente",
    request_body = IndicePayload,
    responses(
        (status = 200, description = "Departamento ativo alterado", body = SessaoRascunho),
        (status = 409, description = "Índice fora do intervalo")
    )
)]
pub async fn selecionar_departamento(
    State(app_state): State<AppState>,
    Json(payload): Json<IndicePayload>,
) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state
        .rascunho_service
        .navegar(|s| s.selecionar_departamento(payload.indice))
        .await?;
    Ok(Json(sessao))
}

// PUT /api/rascunho/alvo
#[utoipa::path(
    put,
    path = "/api/rascunho/alvo",
    tag = "Assistente",
    request_body = AlvoRiscos,
    responses(
        (status = 200, description = "Alvo dos riscos alterado", body = SessaoRascunho),
        (status = 409, description = "Alvo inexistente")
    )
)]
// Navegação rápida entre cargos, funcionários e grupos na etapa de riscos.
pub async fn selecionar_alvo(
    State(app_state): State<AppState>,
    Json(alvo): Json<AlvoRiscos>,
) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state
        .rascunho_service
        .navegar(|s| s.selecionar_alvo(alvo))
        .await?;
    Ok(Json(sessao))
}

// POST /api/rascunho/edicao
#[utoipa::path(
    post,
    path = "/api/rascunho/edicao",
    tag = "Assistente",
    request_body = Edicao,
    responses(
        (status = 200, description = "Item marcado como em edição", body = SessaoRascunho),
        (status = 409, description = "Índice fora do intervalo")
    )
)]
pub async fn iniciar_edicao(
    State(app_state): State<AppState>,
    Json(edicao): Json<Edicao>,
) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state
        .rascunho_service
        .navegar(|s| s.iniciar_edicao(edicao.tipo, edicao.indice))
        .await?;
    Ok(Json(sessao))
}

// DELETE /api/rascunho/edicao
#[utoipa::path(
    delete,
    path = "/api/rascunho/edicao",
    tag = "Assistente",
    responses(
        (status = 200, description = "Edição cancelada", body = SessaoRascunho)
    )
)]
pub async fn cancelar_edicao(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sessao = app_state
        .rascunho_service
        .navegar(|s| {
            s.cancelar_edicao();
            Ok(())
        })
        .await?;
    Ok(Json(sessao))
}

// =============================================================================
//  ÁREA 3: ALTERAÇÕES (cada uma agenda o salvamento automático)
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPayload {
    pub formulario: Formulario,
    // Presente quando o formulário edita um item existente.
    #[serde(default)]
    pub indice_edicao: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReordenarPayload {
    pub de: usize,
    pub para: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpsertResposta {
    // Novo tamanho da coleção alterada
    pub tamanho: usize,
    pub rascunho: SessaoRascunho,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DuplicarResposta {
    pub indice: usize,
    pub rascunho: SessaoRascunho,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmAndamentoResposta {
    pub agendado: bool,
}

// PUT /api/rascunho/empresa
#[utoipa::path(
    put,
    path = "/api/rascunho/empresa",
    tag = "Rascunho",
    request_body = FormEmpresa,
    responses(
        (status = 200, description = "Dados da empresa gravados no rascunho", body = SessaoRascunho)
    )
)]
pub async fn atualizar_empresa(
    State(app_state): State<AppState>,
    Json(payload): Json<FormEmpresa>,
) -> Result<impl IntoResponse, AppError> {
    let ((), sessao) = app_state
        .rascunho_service
        .mutar(|s| {
            s.atualizar_empresa(payload);
            Ok(())
        })
        .await?;
    Ok(Json(sessao))
}

// POST /api/rascunho/itens
#[utoipa::path(
    post,
    path = "/api/rascunho/itens",
    tag = "Rascunho",
    request_body = UpsertPayload,
    responses(
        (status = 200, description = "Item acrescentado ou substituído", body = UpsertResposta),
        (status = 400, description = "Formulário inválido")
    )
)]
pub async fn upsert(
    State(app_state): State<AppState>,
    Json(payload): Json<UpsertPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (tamanho, sessao) = app_state
        .rascunho_service
        .mutar(|s| s.upsert(payload.formulario, payload.indice_edicao))
        .await?;
    Ok(Json(UpsertResposta {
        tamanho,
        rascunho: sessao,
    }))
}

// PUT /api/rascunho/em-andamento
#[utoipa::path(
    put,
    path = "/api/rascunho/em-andamento",
    tag = "Rascunho",
    request_body = Formulario,
    responses(
        (status = 200, description = "Se a digitação agendou o salvamento automático", body = EmAndamentoResposta)
    )
)]
pub async fn em_andamento(
    State(app_state): State<AppState>,
    Json(formulario): Json<Formulario>,
) -> Result<impl IntoResponse, AppError> {
    let agendado = app_state.rascunho_service.em_andamento(formulario).await?;
    Ok(Json(EmAndamentoResposta { agendado }))
}

// DELETE /api/rascunho/itens/{tipo}/{indice}
#[utoipa::path(
    delete,
    path = "/api/rascunho/itens/{tipo}/{indice}",
    tag = "Rascunho",
    params(
        ("tipo" = TipoEntidade, Path, description = "Coleção do item"),
        ("indice" = usize, Path, description = "Posição na coleção")
    ),
    responses(
        (status = 200, description = "Item removido com tudo o que ele contém", body = SessaoRascunho),
        (status = 409, description = "Índice fora do intervalo")
    )
)]
pub async fn remover(
    State(app_state): State<AppState>,
    Path((tipo, indice)): Path<(TipoEntidade, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let ((), sessao) = app_state
        .rascunho_service
        .mutar(|s| s.remover(tipo, indice))
        .await?;
    Ok(Json(sessao))
}

// POST /api/rascunho/itens/{tipo}/{indice}/duplicar
#[utoipa::path(
    post,
    path = "/api/rascunho/itens/{tipo}/{indice}/duplicar",
    tag = "Rascunho",
    params(
        ("tipo" = TipoEntidade, Path, description = "Coleção do item"),
        ("indice" = usize, Path, description = "Posição do item de origem")
    ),
    responses(
        (status = 201, description = "Cópia inserida logo após a origem", body = DuplicarResposta),
        (status = 409, description = "Índice fora do intervalo")
    )
)]
pub async fn duplicar(
    State(app_state): State<AppState>,
    Path((tipo, indice)): Path<(TipoEntidade, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let (novo_indice, sessao) = app_state
        .rascunho_service
        .mutar(|s| s.duplicar(tipo, indice))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DuplicarResposta {
            indice: novo_indice,
            rascunho: sessao,
        }),
    ))
}

// POST /api/rascunho/itens/{tipo}/reordenar
#[utoipa::path(
    post,
    path = "/api/rascunho/itens/{tipo}/reordenar",
    tag = "Rascunho",
    params(("tipo" = TipoEntidade, Path, description = "Coleção reordenada")),
    request_body = ReordenarPayload,
    responses(
        (status = 200, description = "Item movido", body = SessaoRascunho),
        (status = 409, description = "Índice fora do intervalo")
    )
)]
pub async fn reordenar(
    State(app_state): State<AppState>,
    Path(tipo): Path<TipoEntidade>,
    Json(payload): Json<ReordenarPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ((), sessao) = app_state
        .rascunho_service
        .mutar(|s| s.reordenar(tipo, payload.de, payload.para))
        .await?;
    Ok(Json(sessao))
}

// =============================================================================
//  ÁREA 4: CONECTIVIDADE
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConectividadePayload {
    pub online: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConectividadeResposta {
    pub online: bool,
    // `false` quando o estado já era esse
    pub mudou: bool,
}

// POST /api/conectividade
#[utoipa::path(
    post,
    path = "/api/conectividade",
    tag = "Conectividade",
    request_body = ConectividadePayload,
    responses(
        (status = 200, description = "Estado da conexão informado pela interface", body = ConectividadeResposta)
    )
)]
pub async fn conectividade(
    State(app_state): State<AppState>,
    Json(payload): Json<ConectividadePayload>,
) -> impl IntoResponse {
    let mudou = app_state.conectividade.definir_online(payload.online);
    Json(ConectividadeResposta {
        online: payload.online,
        mudou,
    })
}
