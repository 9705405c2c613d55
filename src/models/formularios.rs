// src/models/formularios.rs
//
// Retratos dos formulários do assistente. Cada um valida os campos obrigatórios
// e se converte na entidade correspondente.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    catalogo::EntradaCatalogo,
    inspecao::{
        AcaoPlano, DADOS_LTCAT_PERMITIDOS, Departamento, Empresa, Grupo, OBSERVACOES_PERMITIDAS,
        PerfilCargo, PerfilRisco, RequisitosNr, Risco, SimNao, StatusAcao, TipoEntidade,
    },
};

// --- Regras de validação ---

fn erro(codigo: &'static str, mensagem: String) -> ValidationError {
    let mut erro = ValidationError::new(codigo);
    erro.message = Some(Cow::from(mensagem));
    erro
}

fn obrigatorio(valor: &str) -> Result<(), ValidationError> {
    if valor.trim().is_empty() {
        return Err(erro("obrigatorio", "Campo obrigatório.".to_string()));
    }
    Ok(())
}

fn lista_de_cargos_valida(lista: &[String]) -> Result<(), ValidationError> {
    if lista.iter().all(|cargo| cargo.trim().is_empty()) {
        return Err(erro(
            "obrigatorio",
            "Informe ao menos um cargo para o grupo.".to_string(),
        ));
    }
    Ok(())
}

fn rotulos_permitidos(lista: &[String], permitidos: &[&str]) -> Result<(), ValidationError> {
    match lista.iter().find(|r| !permitidos.contains(&r.as_str())) {
        Some(invalido) => Err(erro("rotulo_invalido", format!("Opção desconhecida: {}", invalido))),
        None => Ok(()),
    }
}

fn observacoes_validas(lista: &[String]) -> Result<(), ValidationError> {
    rotulos_permitidos(lista, &OBSERVACOES_PERMITIDAS)
}

fn dados_ltcat_validos(lista: &[String]) -> Result<(), ValidationError> {
    rotulos_permitidos(lista, &DADOS_LTCAT_PERMITIDOS)
}

// =============================================================================
//  EMPRESA (etapa 0)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormEmpresa {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub data: Option<NaiveDate>,
    #[serde(default)]
    pub elaborado: Option<String>,
    #[serde(default)]
    pub aprovado: Option<String>,
}

impl FormEmpresa {
    // Sem validação aqui: a empresa é editada campo a campo e o nome só é exigido ao salvar.
    pub fn into_empresa(self) -> Empresa {
        Empresa {
            nome: self.nome,
            cnpj: self.cnpj,
            data: self.data,
            elaborado: self.elaborado,
            aprovado: self.aprovado,
        }
    }
}

// =============================================================================
//  DEPARTAMENTO (etapa 1)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDepartamento {
    #[validate(custom(function = "obrigatorio"))]
    pub nome: String,
    #[serde(default)]
    pub caracteristica: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
}

impl FormDepartamento {
    pub fn into_departamento(self) -> Departamento {
        Departamento {
            nome: self.nome,
            caracteristica: self.caracteristica,
            descricao: self.descricao,
            ..Departamento::novo()
        }
    }
}

// =============================================================================
//  CARGO / FUNCIONÁRIO / GRUPO (etapa 2)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormPerfil {
    #[validate(custom(function = "obrigatorio"))]
    pub nome: String,
    #[serde(default)]
    #[validate(custom(function = "observacoes_validas"))]
    pub observacoes: Vec<String>,
    #[serde(default)]
    pub perfil_exposicao: Option<String>,
    #[serde(default)]
    pub descricao_atividade: SimNao,
    #[serde(default, rename = "requisitosNR")]
    pub requisitos_nr: RequisitosNr,
    #[serde(default)]
    #[validate(custom(function = "dados_ltcat_validos"))]
    pub dados_ltcat: Vec<String>,
}

impl Default for FormPerfil {
    fn default() -> Self {
        PerfilCargo::novo().into()
    }
}

impl From<PerfilCargo> for FormPerfil {
    fn from(cargo: PerfilCargo) -> Self {
        let perfil = cargo.perfil;
        Self {
            nome: cargo.nome,
            observacoes: perfil.observacoes,
            perfil_exposicao: perfil.perfil_exposicao,
            descricao_atividade: perfil.descricao_atividade,
            requisitos_nr: perfil.requisitos_nr,
            dados_ltcat: perfil.dados_ltcat,
        }
    }
}

impl FormPerfil {
    pub fn into_cargo(self) -> PerfilCargo {
        PerfilCargo {
            nome: self.nome,
            perfil: PerfilRisco {
                observacoes: self.observacoes,
                perfil_exposicao: self.perfil_exposicao,
                descricao_atividade: self.descricao_atividade,
                requisitos_nr: self.requisitos_nr,
                dados_ltcat: self.dados_ltcat,
                riscos: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormGrupo {
    #[validate(custom(function = "lista_de_cargos_valida"))]
    pub lista_de_cargos: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "observacoes_validas"))]
    pub observacoes: Vec<String>,
    #[serde(default)]
    pub perfil_exposicao: Option<String>,
    #[serde(default)]
    pub descricao_atividade: SimNao,
    #[serde(default, rename = "requisitosNR")]
    pub requisitos_nr: RequisitosNr,
    #[serde(default)]
    #[validate(custom(function = "dados_ltcat_validos"))]
    pub dados_ltcat: Vec<String>,
}

impl FormGrupo {
    pub fn into_grupo(self) -> Grupo {
        Grupo {
            lista_de_cargos: self.lista_de_cargos,
            perfil: PerfilRisco {
                observacoes: self.observacoes,
                perfil_exposicao: self.perfil_exposicao,
                descricao_atividade: self.descricao_atividade,
                requisitos_nr: self.requisitos_nr,
                dados_ltcat: self.dados_ltcat,
                riscos: Vec::new(),
            },
            ..Grupo::novo()
        }
    }
}

// =============================================================================
//  RISCO (etapa 3)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormRisco {
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub codigo_esocial: Option<String>,
    #[validate(custom(function = "obrigatorio"))]
    pub perigo: String,
    #[serde(default)]
    pub descricao_detalhada: Option<String>,
    #[serde(default)]
    pub fonte_geradora: Option<String>,
    #[serde(default)]
    pub perfil_exposicao: Option<String>,
    #[serde(default)]
    pub medicao: Option<String>,
    #[serde(default)]
    pub tempo_exposicao: Option<String>,
    #[serde(default)]
    pub tipo_exposicao: Option<String>,
    #[serde(default)]
    pub obs_ambientais: Option<String>,
    #[serde(default)]
    pub probabilidade: Option<String>,
    #[serde(default)]
    pub severidade: Option<String>,
    #[serde(default)]
    pub aceitabilidade: Option<String>,
    #[serde(default)]
    pub danos: Option<String>,
    #[serde(default)]
    pub epi_utilizado: Option<String>,
    #[serde(default)]
    pub ca: Option<String>,
    #[serde(default)]
    pub epc: Option<String>,
    #[serde(default)]
    pub epi_sugerido: Option<String>,
    #[serde(default)]
    pub acoes_necessarias: Option<String>,
    #[serde(default)]
    pub observacoes_gerais: Option<String>,
    #[serde(default = "SimNao::sim")]
    pub risco_presente: SimNao,
}

// Formulário em branco = risco novo.
impl Default for FormRisco {
    fn default() -> Self {
        Risco::novo().into()
    }
}

impl From<Risco> for FormRisco {
    fn from(risco: Risco) -> Self {
        Self {
            tipo: risco.tipo,
            codigo_esocial: risco.codigo_esocial,
            perigo: risco.perigo,
            descricao_detalhada: risco.descricao_detalhada,
            fonte_geradora: risco.fonte_geradora,
            perfil_exposicao: risco.perfil_exposicao,
            medicao: risco.medicao,
            tempo_exposicao: risco.tempo_exposicao,
            tipo_exposicao: risco.tipo_exposicao,
            obs_ambientais: risco.obs_ambientais,
            probabilidade: risco.probabilidade,
            severidade: risco.severidade,
            aceitabilidade: risco.aceitabilidade,
            danos: risco.danos,
            epi_utilizado: risco.epi_utilizado,
            ca: risco.ca,
            epc: risco.epc,
            epi_sugerido: risco.epi_sugerido,
            acoes_necessarias: risco.acoes_necessarias,
            observacoes_gerais: risco.observacoes_gerais,
            risco_presente: risco.risco_presente,
        }
    }
}

impl FormRisco {
    /// Formulário novo já preenchido com a entrada escolhida no catálogo.
    pub fn do_catalogo(entrada: &EntradaCatalogo) -> Self {
        Self {
            tipo: Some(entrada.tipo_normalizado().to_string()),
            codigo_esocial: Some(entrada.codigo_esocial.clone()),
            perigo: entrada.perigo.clone(),
            danos: Some(entrada.danos.clone()),
            ..Self::default()
        }
    }

    pub fn into_risco(self) -> Risco {
        Risco {
            tipo: self.tipo,
            codigo_esocial: self.codigo_esocial,
            perigo: self.perigo,
            descricao_detalhada: self.descricao_detalhada,
            fonte_geradora: self.fonte_geradora,
            perfil_exposicao: self.perfil_exposicao,
            medicao: self.medicao,
            tempo_exposicao: self.tempo_exposicao,
            tipo_exposicao: self.tipo_exposicao,
            obs_ambientais: self.obs_ambientais,
            probabilidade: self.probabilidade,
            severidade: self.severidade,
            aceitabilidade: self.aceitabilidade,
            danos: self.danos,
            epi_utilizado: self.epi_utilizado,
            ca: self.ca,
            epc: self.epc,
            epi_sugerido: self.epi_sugerido,
            acoes_necessarias: self.acoes_necessarias,
            observacoes_gerais: self.observacoes_gerais,
            risco_presente: self.risco_presente,
        }
    }
}

// =============================================================================
//  PLANO DE AÇÃO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormAcao {
    #[validate(custom(function = "obrigatorio"))]
    pub atividade: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub prazo_inicio: Option<NaiveDate>,
    #[serde(default)]
    pub prazo_fim: Option<NaiveDate>,
    #[serde(default)]
    pub status: StatusAcao,
}

impl Default for FormAcao {
    fn default() -> Self {
        AcaoPlano::nova().into()
    }
}

impl From<AcaoPlano> for FormAcao {
    fn from(acao: AcaoPlano) -> Self {
        Self {
            atividade: acao.atividade,
            descricao: acao.descricao,
            prazo_inicio: acao.prazo_inicio,
            prazo_fim: acao.prazo_fim,
            status: acao.status,
        }
    }
}

impl FormAcao {
    pub fn into_acao(self) -> AcaoPlano {
        AcaoPlano {
            atividade: self.atividade,
            descricao: self.descricao,
            prazo_inicio: self.prazo_inicio,
            prazo_fim: self.prazo_fim,
            status: self.status,
        }
    }
}

// =============================================================================
//  ENVELOPE
// =============================================================================

/// Um formulário de qualquer tipo, como chega da interface: `{ "tipo": ..., "dados": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "tipo", content = "dados", rename_all = "lowercase")]
pub enum Formulario {
    Departamento(FormDepartamento),
    Cargo(FormPerfil),
    Funcionario(FormPerfil),
    Grupo(FormGrupo),
    Risco(FormRisco),
    Acao(FormAcao),
}

impl Formulario {
    pub fn tipo(&self) -> TipoEntidade {
        match self {
            Formulario::Departamento(_) => TipoEntidade::Departamento,
            Formulario::Cargo(_) => TipoEntidade::Cargo,
            Formulario::Funcionario(_) => TipoEntidade::Funcionario,
            Formulario::Grupo(_) => TipoEntidade::Grupo,
            Formulario::Risco(_) => TipoEntidade::Risco,
            Formulario::Acao(_) => TipoEntidade::Acao,
        }
    }

    pub fn validar(&self) -> Result<(), ValidationErrors> {
        match self {
            Formulario::Departamento(f) => f.validate(),
            Formulario::Cargo(f) | Formulario::Funcionario(f) => f.validate(),
            Formulario::Grupo(f) => f.validate(),
            Formulario::Risco(f) => f.validate(),
            Formulario::Acao(f) => f.validate(),
        }
    }
}
