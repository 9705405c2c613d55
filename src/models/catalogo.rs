// src/models/catalogo.rs

use std::path::Path;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Subtipos psicossociais aparecem no catálogo como "<Tipo> - Psicossocial",
// mas são listados junto do tipo base.
pub const SUFIXO_PSICOSSOCIAL: &str = " - Psicossocial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntradaCatalogo {
    pub tipo: String,
    pub codigo_esocial: String,
    pub perigo: String,
    pub danos: String,
}

impl EntradaCatalogo {
    pub fn tipo_normalizado(&self) -> &str {
        let tipo = self.tipo.trim();
        tipo.strip_suffix(SUFIXO_PSICOSSOCIAL).unwrap_or(tipo).trim_end()
    }
}

/// Tabela de referência de perigos (somente leitura), na ordem do catálogo.
#[derive(Debug, Clone, Default)]
pub struct CatalogoPerigos {
    entradas: Vec<EntradaCatalogo>,
}

impl CatalogoPerigos {
    pub fn new(entradas: Vec<EntradaCatalogo>) -> Self {
        Self { entradas }
    }

    pub fn carregar(caminho: &Path) -> anyhow::Result<Self> {
        let conteudo = std::fs::read_to_string(caminho)?;
        let entradas: Vec<EntradaCatalogo> = serde_json::from_str(&conteudo)?;
        Ok(Self::new(entradas))
    }

    pub fn total_entradas(&self) -> usize {
        self.entradas.len()
    }

    /// Tipos distintos, na ordem em que aparecem pela primeira vez.
    pub fn tipos(&self) -> Vec<&str> {
        let mut tipos: Vec<&str> = Vec::new();
        for entrada in &self.entradas {
            let tipo = entrada.tipo_normalizado();
            if !tipos.contains(&tipo) {
                tipos.push(tipo);
            }
        }
        tipos
    }

    pub fn por_tipo(&self, tipo: &str) -> Vec<&EntradaCatalogo> {
        let tipo = tipo.trim();
        self.entradas
            .iter()
            .filter(|e| e.tipo_normalizado() == tipo)
            .collect()
    }

    pub fn buscar(&self, codigo_esocial: &str) -> Option<&EntradaCatalogo> {
        self.entradas.iter().find(|e| e.codigo_esocial == codigo_esocial)
    }
}
