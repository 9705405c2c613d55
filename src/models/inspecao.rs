// src/models/inspecao.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Rótulos fixos aceitos nas listas de observações e dados de LTCAT.
pub const OBSERVACOES_PERMITIDAS: [&str; 8] = [
    "Trabalho em altura",
    "Espaço confinado",
    "Eletricidade",
    "Máquinas e equipamentos",
    "Produtos químicos",
    "Trabalho noturno",
    "Atividade insalubre",
    "Atividade perigosa",
];

pub const DADOS_LTCAT_PERMITIDOS: [&str; 4] = [
    "Insalubridade",
    "Periculosidade",
    "Aposentadoria especial",
    "Não se aplica",
];

pub const SUFIXO_COPIA: &str = " (Cópia)";

// --- Identificador opaco atribuído pelo armazenamento ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct InspecaoId(pub i64);

impl fmt::Display for InspecaoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum SimNao {
    Sim,
    #[default]
    #[serde(rename = "Não")]
    Nao,
}

impl SimNao {
    pub fn sim() -> Self {
        SimNao::Sim
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            SimNao::Sim => "Sim",
            SimNao::Nao => "Não",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum StatusAcao {
    #[default]
    Pendente,
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[serde(rename = "Concluída")]
    Concluida,
}

impl StatusAcao {
    pub fn rotulo(&self) -> &'static str {
        match self {
            StatusAcao::Pendente => "Pendente",
            StatusAcao::EmAndamento => "Em Andamento",
            StatusAcao::Concluida => "Concluída",
        }
    }
}

/// Os tipos de entidade aninhada que o assistente sabe editar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TipoEntidade {
    Departamento,
    Cargo,
    Funcionario,
    Grupo,
    Risco,
    Acao,
}

impl TipoEntidade {
    pub fn rotulo(&self) -> &'static str {
        match self {
            TipoEntidade::Departamento => "departamento",
            TipoEntidade::Cargo => "cargo",
            TipoEntidade::Funcionario => "funcionario",
            TipoEntidade::Grupo => "grupo",
            TipoEntidade::Risco => "risco",
            TipoEntidade::Acao => "acao",
        }
    }
}

impl fmt::Display for TipoEntidade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rotulo())
    }
}

// =============================================================================
//  AGREGADO RAIZ
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Inspecao {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InspecaoId>,
    #[serde(default)]
    pub empresa: Option<Empresa>,
    #[serde(default)]
    pub departamentos: Vec<Departamento>,
    #[serde(default)]
    pub plano_de_acao: Vec<AcaoPlano>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Inspecao {
    pub fn nova() -> Self {
        let agora = Utc::now();
        Self {
            id: None,
            empresa: None,
            departamentos: Vec::new(),
            plano_de_acao: Vec::new(),
            created_at: agora,
            updated_at: agora,
        }
    }

    /// Nome da empresa já sem espaços; `None` se ainda não foi preenchido.
    pub fn nome_empresa(&self) -> Option<&str> {
        self.empresa
            .as_ref()
            .map(|e| e.nome.trim())
            .filter(|nome| !nome.is_empty())
    }

    pub fn pode_persistir(&self) -> bool {
        self.nome_empresa().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Empresa {
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

// =============================================================================
//  DEPARTAMENTOS E SUJEITOS DE RISCO
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Departamento {
    pub nome: String,
    #[serde(default)]
    pub caracteristica: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub cargos: Vec<PerfilCargo>,
    #[serde(default)]
    pub funcionarios: Vec<PerfilCargo>,
    #[serde(default)]
    pub grupos: Vec<Grupo>,
}

impl Departamento {
    pub fn novo() -> Self {
        Self::default()
    }

    pub fn sem_sujeitos(&self) -> bool {
        self.cargos.is_empty() && self.funcionarios.is_empty() && self.grupos.is_empty()
    }

    pub fn total_riscos(&self) -> usize {
        self.cargos.iter().map(|c| c.perfil.riscos.len()).sum::<usize>()
            + self.funcionarios.iter().map(|f| f.perfil.riscos.len()).sum::<usize>()
            + self.grupos.iter().map(|g| g.perfil.riscos.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequisitosNr {
    #[serde(default)]
    pub medida: SimNao,
    #[serde(default)]
    pub condicao: SimNao,
    #[serde(default)]
    pub prazo: SimNao,
    #[serde(default)]
    pub periodicidade: SimNao,
    #[serde(default)]
    pub higienizacao: SimNao,
}

/// Campos comuns a cargos, funcionários e grupos: o perfil de exposição e os riscos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerfilRisco {
    #[serde(default)]
    pub observacoes: Vec<String>,
    #[serde(default)]
    pub perfil_exposicao: Option<String>,
    #[serde(default)]
    pub descricao_atividade: SimNao,
    #[serde(default, rename = "requisitosNR")]
    pub requisitos_nr: RequisitosNr,
    #[serde(default)]
    pub dados_ltcat: Vec<String>,
    #[serde(default)]
    pub riscos: Vec<Risco>,
}

// Cargo e funcionário têm o mesmo formato; muda apenas a coleção onde moram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerfilCargo {
    pub nome: String,
    #[serde(flatten)]
    pub perfil: PerfilRisco,
}

impl PerfilCargo {
    pub fn novo() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Grupo {
    #[serde(default = "novo_id_grupo")]
    pub id: String,
    #[serde(default)]
    pub lista_de_cargos: Vec<String>,
    #[serde(flatten)]
    pub perfil: PerfilRisco,
}

impl Grupo {
    pub fn novo() -> Self {
        Self {
            id: novo_id_grupo(),
            lista_de_cargos: Vec::new(),
            perfil: PerfilRisco::default(),
        }
    }

    pub fn rotulo(&self) -> String {
        self.lista_de_cargos.join(", ")
    }
}

pub fn novo_id_grupo() -> String {
    format!("grupo-{}", Uuid::new_v4())
}

// =============================================================================
//  RISCOS E PLANO DE AÇÃO
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Risco {
    // Identificação
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub codigo_esocial: Option<String>,
    pub perigo: String,
    #[serde(default)]
    pub descricao_detalhada: Option<String>,

    // Fonte e exposição
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

    // Avaliação
    #[serde(default)]
    pub probabilidade: Option<String>,
    #[serde(default)]
    pub severidade: Option<String>,
    #[serde(default)]
    pub aceitabilidade: Option<String>,
    #[serde(default)]
    pub danos: Option<String>,

    // Controles
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

impl Risco {
    pub fn novo() -> Self {
        Self {
            risco_presente: SimNao::Sim,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcaoPlano {
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

impl AcaoPlano {
    pub fn nova() -> Self {
        Self::default()
    }
}

/// Linha resumida para a lista de inspeções salvas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoInspecao {
    pub id: InspecaoId,
    pub empresa: Option<String>,
    pub total_departamentos: usize,
    pub total_riscos: usize,
    pub updated_at: DateTime<Utc>,
}

impl ResumoInspecao {
    pub fn de(inspecao: &Inspecao) -> Option<Self> {
        Some(Self {
            id: inspecao.id?,
            empresa: inspecao.nome_empresa().map(str::to_string),
            total_departamentos: inspecao.departamentos.len(),
            total_riscos: inspecao.departamentos.iter().map(Departamento::total_riscos).sum(),
            updated_at: inspecao.updated_at,
        })
    }
}
