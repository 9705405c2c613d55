// src/models/relatorio.rs
//
// Documento imprimível já desnormalizado: tudo vira texto e nenhum campo some.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::inspecao::InspecaoId;

pub const NAO_INFORMADO: &str = "Não informado";
pub const SEM_RISCOS: &str = "Nenhum risco identificado";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campo {
    pub rotulo: String,
    pub valor: String,
}

/// Texto do campo ou o marcador de ausência; vazio conta como ausente.
pub fn informado(valor: Option<&str>) -> String {
    valor
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NAO_INFORMADO)
        .to_string()
}

impl Campo {
    pub fn new(rotulo: &str, valor: Option<&str>) -> Self {
        Self {
            rotulo: rotulo.to_string(),
            valor: informado(valor),
        }
    }
}

/// Marcador explícito Sim/Não de uma lista de verificação.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Marcador {
    pub rotulo: String,
    pub marcado: bool,
}

impl Marcador {
    pub fn texto(&self) -> &'static str {
        if self.marcado { "[X] Sim" } else { "[ ] Não" }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoriaRisco {
    pub titulo: String,
    pub campos: Vec<Campo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlocoRisco {
    pub titulo: String,
    pub risco_presente: String,
    pub categorias: Vec<CategoriaRisco>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecaoSujeito {
    // "Grupo", "Cargo" ou "Funcionário"
    pub tipo: String,
    pub nome: String,
    pub observacoes: String,
    pub perfil_exposicao: String,
    pub descricao_atividade: Marcador,
    pub requisitos_nr: Vec<Marcador>,
    pub dados_ltcat: Vec<Marcador>,
    pub riscos: Vec<BlocoRisco>,
    pub aviso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecaoDepartamento {
    pub titulo: String,
    pub caracteristica: String,
    pub descricao: String,
    pub sujeitos: Vec<SecaoSujeito>,
    pub aviso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinhaPlanoAcao {
    pub atividade: String,
    pub descricao: String,
    pub prazo_inicio: String,
    pub prazo_fim: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Relatorio {
    pub inspecao_id: Option<InspecaoId>,
    pub titulo: String,
    pub empresa: Vec<Campo>,
    pub departamentos: Vec<SecaoDepartamento>,
    pub plano_de_acao: Vec<LinhaPlanoAcao>,
    pub atualizado_em: DateTime<Utc>,
}
