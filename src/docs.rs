// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inspeções SST",
        description = "API local do assistente de inspeções de segurança do trabalho"
    ),
    paths(
        // --- Inspeções salvas ---
        handlers::inspecoes::listar,
        handlers::inspecoes::obter,
        handlers::inspecoes::excluir,
        handlers::inspecoes::relatorio,
        handlers::inspecoes::relatorio_pdf,

        // --- Rascunho ---
        handlers::rascunho::novo,
        handlers::rascunho::abrir,
        handlers::rascunho::visao,
        handlers::rascunho::salvar,
        handlers::rascunho::status,
        handlers::rascunho::atualizar_empresa,
        handlers::rascunho::upsert,
        handlers::rascunho::em_andamento,
        handlers::rascunho::remover,
        handlers::rascunho::duplicar,
        handlers::rascunho::reordenar,

        // --- Assistente ---
        handlers::rascunho::ir_para_etapa,
        handlers::rascunho::selecionar_departamento,
        handlers::rascunho::selecionar_alvo,
        handlers::rascunho::iniciar_edicao,
        handlers::rascunho::cancelar_edicao,

        // --- Conectividade ---
        handlers::rascunho::conectividade,

        // --- Catálogo ---
        handlers::catalogo::listar_tipos,
        handlers::catalogo::listar_perigos,
        handlers::catalogo::formulario_do_perigo,
    ),
    components(
        schemas(
            // --- Inspeção ---
            models::inspecao::InspecaoId,
            models::inspecao::SimNao,
            models::inspecao::StatusAcao,
            models::inspecao::TipoEntidade,
            models::inspecao::Inspecao,
            models::inspecao::Empresa,
            models::inspecao::Departamento,
            models::inspecao::RequisitosNr,
            models::inspecao::PerfilRisco,
            models::inspecao::PerfilCargo,
            models::inspecao::Grupo,
            models::inspecao::Risco,
            models::inspecao::AcaoPlano,
            models::inspecao::ResumoInspecao,

            // --- Formulários ---
            models::formularios::FormEmpresa,
            models::formularios::FormDepartamento,
            models::formularios::FormPerfil,
            models::formularios::FormGrupo,
            models::formularios::FormRisco,
            models::formularios::FormAcao,
            models::formularios::Formulario,

            // --- Catálogo ---
            models::catalogo::EntradaCatalogo,

            // --- Relatório ---
            models::relatorio::Campo,
            models::relatorio::Marcador,
            models::relatorio::CategoriaRisco,
            models::relatorio::BlocoRisco,
            models::relatorio::SecaoSujeito,
            models::relatorio::SecaoDepartamento,
            models::relatorio::LinhaPlanoAcao,
            models::relatorio::Relatorio,

            // --- Rascunho e salvamento ---
            services::rascunho::SessaoRascunho,
            services::rascunho::CursorAssistente,
            services::rascunho::AlvoRiscos,
            services::rascunho::Edicao,
            services::autosave_service::StatusSalvamento,
            services::autosave_service::ResultadoSalvamento,

            // --- Payloads ---
            handlers::rascunho::EtapaPayload,
            handlers::rascunho::IndicePayload,
            handlers::rascunho::UpsertPayload,
            handlers::rascunho::ReordenarPayload,
            handlers::rascunho::ConectividadePayload,
            handlers::rascunho::UpsertResposta,
            handlers::rascunho::DuplicarResposta,
            handlers::rascunho::EmAndamentoResposta,
            handlers::rascunho::ConectividadeResposta,
        )
    ),
    tags(
        (name = "Inspeções", description = "Inspeções salvas no banco local"),
        (name = "Rascunho", description = "Inspeção aberta para edição e salvamento"),
        (name = "Assistente", description = "Navegação entre as etapas do assistente"),
        (name = "Relatórios", description = "Relatório compilado e PDF para impressão"),
        (name = "Catálogo", description = "Catálogo de perigos eSocial"),
        (name = "Conectividade", description = "Sinal de conexão vindo da interface")
    )
)]
pub struct ApiDoc;
