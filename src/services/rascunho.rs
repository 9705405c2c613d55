// src/services/rascunho.rs
//
// Sessão de rascunho: a cópia de trabalho de uma inspeção mais o cursor do
// assistente (etapa, departamento ativo, alvo dos riscos, item em edição).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        formularios::{FormEmpresa, Formulario},
        inspecao::{
            Departamento, Inspecao, InspecaoId, PerfilRisco, Risco, SUFIXO_COPIA, TipoEntidade,
            novo_id_grupo,
        },
    },
};

// --- Cursor do assistente ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Etapa {
    #[default]
    Empresa,
    Departamentos,
    Sujeitos,
    Riscos,
}

impl From<Etapa> for u8 {
    fn from(etapa: Etapa) -> u8 {
        match etapa {
            Etapa::Empresa => 0,
            Etapa::Departamentos => 1,
            Etapa::Sujeitos => 2,
            Etapa::Riscos => 3,
        }
    }
}

impl TryFrom<u8> for Etapa {
    type Error = String;

    fn try_from(numero: u8) -> Result<Self, Self::Error> {
        match numero {
            0 => Ok(Etapa::Empresa),
            1 => Ok(Etapa::Departamentos),
            2 => Ok(Etapa::Sujeitos),
            3 => Ok(Etapa::Riscos),
            outro => Err(format!("etapa inexistente: {}", outro)),
        }
    }
}

/// De quem são os riscos editados na etapa 3. Só um alvo existe por vez.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "tipo", content = "valor", rename_all = "lowercase")]
pub enum AlvoRiscos {
    Cargo(usize),
    Funcionario(usize),
    // Grupos são referenciados pelo id, que sobrevive a reordenações.
    Grupo(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Edicao {
    pub tipo: TipoEntidade,
    pub indice: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CursorAssistente {
    #[schema(value_type = u8, minimum = 0, maximum = 3)]
    pub etapa: Etapa,
    pub departamento_ativo: Option<usize>,
    pub alvo: Option<AlvoRiscos>,
    pub edicao: Option<Edicao>,
}

// --- Operações genéricas sobre as coleções ---

fn verificar_indice(tipo: TipoEntidade, indice: usize, tamanho: usize) -> Result<(), AppError> {
    if indice >= tamanho {
        return Err(AppError::IndiceForaDoIntervalo {
            tipo,
            indice,
            tamanho,
        });
    }
    Ok(())
}

// Substitui no lugar quando o índice é válido; senão, acrescenta no fim.
fn inserir_ou_substituir<T>(
    colecao: &mut Vec<T>,
    novo: T,
    indice: Option<usize>,
    preservar: impl FnOnce(&mut T, T),
) -> usize {
    match indice.filter(|&i| i < colecao.len()) {
        Some(i) => {
            let antigo = std::mem::replace(&mut colecao[i], novo);
            preservar(&mut colecao[i], antigo);
        }
        None => colecao.push(novo),
    }
    colecao.len()
}

fn remover_em<T>(colecao: &mut Vec<T>, tipo: TipoEntidade, indice: usize) -> Result<T, AppError> {
    verificar_indice(tipo, indice, colecao.len())?;
    Ok(colecao.remove(indice))
}

fn duplicar_em<T: Clone>(
    colecao: &mut Vec<T>,
    tipo: TipoEntidade,
    indice: usize,
    ajustar: impl FnOnce(&mut T),
) -> Result<usize, AppError> {
    verificar_indice(tipo, indice, colecao.len())?;
    let mut copia = colecao[indice].clone();
    ajustar(&mut copia);
    colecao.insert(indice + 1, copia);
    Ok(indice + 1)
}

fn mover_em<T>(colecao: &mut Vec<T>, tipo: TipoEntidade, de: usize, para: usize) -> Result<(), AppError> {
    verificar_indice(tipo, de, colecao.len())?;
    verificar_indice(tipo, para, colecao.len())?;
    let item = colecao.remove(de);
    colecao.insert(para, item);
    Ok(())
}

// --- Remapeamento de índices do cursor ---

fn apos_remocao(atual: usize, removido: usize) -> Option<usize> {
    match atual.cmp(&removido) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(atual - 1),
        std::cmp::Ordering::Less => Some(atual),
    }
}

fn apos_insercao(atual: usize, inserido_em: usize) -> usize {
    if atual >= inserido_em { atual + 1 } else { atual }
}

fn apos_mover(atual: usize, de: usize, para: usize) -> usize {
    if atual == de {
        para
    } else if de < atual && atual <= para {
        atual - 1
    } else if para <= atual && atual < de {
        atual + 1
    } else {
        atual
    }
}

fn com_copia(nome: &mut String) {
    nome.push_str(SUFIXO_COPIA);
}

// Tipos cujos itens moram dentro de `ancestral`.
fn e_ancestral(ancestral: TipoEntidade, tipo: TipoEntidade) -> bool {
    use TipoEntidade as T;
    match ancestral {
        T::Departamento => matches!(tipo, T::Cargo | T::Funcionario | T::Grupo | T::Risco),
        T::Cargo | T::Funcionario | T::Grupo => tipo == T::Risco,
        T::Risco | T::Acao => false,
    }
}

// =============================================================================
//  SESSÃO
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessaoRascunho {
    geracao: Uuid,
    inspecao: Inspecao,
    cursor: CursorAssistente,
}

impl SessaoRascunho {
    pub fn nova() -> Self {
        Self::de_inspecao(Inspecao::nova())
    }

    pub fn de_inspecao(inspecao: Inspecao) -> Self {
        Self {
            geracao: Uuid::new_v4(),
            inspecao,
            cursor: CursorAssistente::default(),
        }
    }

    /// Identifica esta sessão entre aberturas sucessivas de rascunhos.
    pub fn geracao(&self) -> Uuid {
        self.geracao
    }

    pub fn inspecao(&self) -> &Inspecao {
        &self.inspecao
    }

    pub fn cursor(&self) -> &CursorAssistente {
        &self.cursor
    }

    pub fn id(&self) -> Option<InspecaoId> {
        self.inspecao.id
    }

    pub fn atribuir_id(&mut self, id: InspecaoId) {
        self.inspecao.id = Some(id);
    }

    pub fn carimbar(&mut self, agora: DateTime<Utc>) {
        self.inspecao.updated_at = agora;
    }

    // =========================================================================
    //  NAVEGAÇÃO
    // =========================================================================

    pub fn ir_para_etapa(&mut self, etapa: Etapa) -> Result<(), AppError> {
        match etapa {
            Etapa::Empresa | Etapa::Departamentos => {}
            Etapa::Sujeitos => {
                self.departamento_ativo()?;
            }
            Etapa::Riscos => {
                self.perfil_do_alvo()?;
            }
        }
        self.cursor.etapa = etapa;
        self.cursor.edicao = None;
        Ok(())
    }

    pub fn selecionar_departamento(&mut self, indice: usize) -> Result<(), AppError> {
        verificar_indice(TipoEntidade::Departamento, indice, self.inspecao.departamentos.len())?;
        self.cursor.departamento_ativo = Some(indice);
        self.cursor.alvo = None;
        self.cursor.edicao = None;
        Ok(())
    }

    /// Troca o dono dos riscos exibidos. Só mexe no cursor.
    pub fn selecionar_alvo(&mut self, alvo: AlvoRiscos) -> Result<(), AppError> {
        let anterior = self.cursor.alvo.replace(alvo);
        if let Err(e) = self.perfil_do_alvo() {
            self.cursor.alvo = anterior;
            return Err(e);
        }
        self.cursor.edicao = None;
        Ok(())
    }

    pub fn iniciar_edicao(&mut self, tipo: TipoEntidade, indice: usize) -> Result<(), AppError> {
        verificar_indice(tipo, indice, self.tamanho(tipo)?)?;
        self.cursor.edicao = Some(Edicao { tipo, indice });
        Ok(())
    }

    pub fn cancelar_edicao(&mut self) {
        self.cursor.edicao = None;
    }

    pub fn tamanho(&self, tipo: TipoEntidade) -> Result<usize, AppError> {
        Ok(match tipo {
            TipoEntidade::Departamento => self.inspecao.departamentos.len(),
            TipoEntidade::Cargo => self.departamento_ativo()?.cargos.len(),
            TipoEntidade::Funcionario => self.departamento_ativo()?.funcionarios.len(),
            TipoEntidade::Grupo => self.departamento_ativo()?.grupos.len(),
            TipoEntidade::Risco => self.riscos_do_alvo()?.len(),
            TipoEntidade::Acao => self.inspecao.plano_de_acao.len(),
        })
    }

    pub fn riscos_do_alvo(&self) -> Result<&[Risco], AppError> {
        Ok(&self.perfil_do_alvo()?.riscos)
    }

    fn departamento_ativo(&self) -> Result<&Departamento, AppError> {
        let indice = self
            .cursor
            .departamento_ativo
            .ok_or_else(|| AppError::NavegacaoInvalida("Selecione um departamento.".into()))?;
        let tamanho = self.inspecao.departamentos.len();
        self.inspecao
            .departamentos
            .get(indice)
            .ok_or(AppError::IndiceForaDoIntervalo {
                tipo: TipoEntidade::Departamento,
                indice,
                tamanho,
            })
    }

    fn departamento_ativo_mut(&mut self) -> Result<&mut Departamento, AppError> {
        self.departamento_ativo()?;
        let indice = self.cursor.departamento_ativo.unwrap_or_default();
        Ok(&mut self.inspecao.departamentos[indice])
    }

    fn perfil_do_alvo(&self) -> Result<&PerfilRisco, AppError> {
        let alvo = self
            .cursor
            .alvo
            .as_ref()
            .ok_or_else(|| AppError::NavegacaoInvalida("Selecione um cargo, funcionário ou grupo.".into()))?;
        let departamento = self.departamento_ativo()?;

        match alvo {
            AlvoRiscos::Cargo(i) => departamento
                .cargos
                .get(*i)
                .map(|c| &c.perfil)
                .ok_or(AppError::IndiceForaDoIntervalo {
                    tipo: TipoEntidade::Cargo,
                    indice: *i,
                    tamanho: departamento.cargos.len(),
                }),
            AlvoRiscos::Funcionario(i) => departamento
                .funcionarios
                .get(*i)
                .map(|f| &f.perfil)
                .ok_or(AppError::IndiceForaDoIntervalo {
                    tipo: TipoEntidade::Funcionario,
                    indice: *i,
                    tamanho: departamento.funcionarios.len(),
                }),
            AlvoRiscos::Grupo(id) => departamento
                .grupos
                .iter()
                .find(|g| &g.id == id)
                .map(|g| &g.perfil)
                .ok_or_else(|| AppError::NavegacaoInvalida(format!("O grupo {} não existe mais.", id))),
        }
    }

    fn riscos_do_alvo_mut(&mut self) -> Result<&mut Vec<Risco>, AppError> {
        // Valida primeiro com a versão imutável; daqui em diante o alvo existe.
        self.perfil_do_alvo()?;
        let alvo = self.cursor.alvo.clone();
        let departamento = self.departamento_ativo_mut()?;

        let perfil = match alvo {
            Some(AlvoRiscos::Cargo(i)) => departamento.cargos.get_mut(i).map(|c| &mut c.perfil),
            Some(AlvoRiscos::Funcionario(i)) => departamento.funcionarios.get_mut(i).map(|f| &mut f.perfil),
            Some(AlvoRiscos::Grupo(id)) => departamento
                .grupos
                .iter_mut()
                .find(|g| g.id == id)
                .map(|g| &mut g.perfil),
            None => None,
        };

        perfil
            .map(|p| &mut p.riscos)
            .ok_or_else(|| AppError::NavegacaoInvalida("Alvo dos riscos inválido.".into()))
    }

    // =========================================================================
    //  MUTAÇÕES
    // =========================================================================

    pub fn atualizar_empresa(&mut self, formulario: FormEmpresa) {
        self.inspecao.empresa = Some(formulario.into_empresa());
    }

    /// Grava o formulário no item em edição (índice válido) ou acrescenta um novo.
    /// Devolve o novo tamanho da coleção afetada.
    pub fn upsert(&mut self, formulario: Formulario, indice_edicao: Option<usize>) -> Result<usize, AppError> {
        formulario.validar()?;
        let tipo = formulario.tipo();

        let tamanho = match formulario {
            Formulario::Departamento(f) => inserir_ou_substituir(
                &mut self.inspecao.departamentos,
                f.into_departamento(),
                indice_edicao,
                |novo, antigo| {
                    novo.cargos = antigo.cargos;
                    novo.funcionarios = antigo.funcionarios;
                    novo.grupos = antigo.grupos;
                },
            ),
            Formulario::Cargo(f) => inserir_ou_substituir(
                &mut self.departamento_ativo_mut()?.cargos,
                f.into_cargo(),
                indice_edicao,
                |novo, antigo| novo.perfil.riscos = antigo.perfil.riscos,
            ),
            Formulario::Funcionario(f) => inserir_ou_substituir(
                &mut self.departamento_ativo_mut()?.funcionarios,
                f.into_cargo(),
                indice_edicao,
                |novo, antigo| novo.perfil.riscos = antigo.perfil.riscos,
            ),
            Formulario::Grupo(f) => inserir_ou_substituir(
                &mut self.departamento_ativo_mut()?.grupos,
                f.into_grupo(),
                indice_edicao,
                |novo, antigo| {
                    novo.id = antigo.id;
                    novo.perfil.riscos = antigo.perfil.riscos;
                },
            ),
            Formulario::Risco(f) => {
                inserir_ou_substituir(self.riscos_do_alvo_mut()?, f.into_risco(), indice_edicao, |_, _| {})
            }
            Formulario::Acao(f) => inserir_ou_substituir(
                &mut self.inspecao.plano_de_acao,
                f.into_acao(),
                indice_edicao,
                |_, _| {},
            ),
        };

        if self.cursor.edicao.is_some_and(|e| e.tipo == tipo) {
            self.cursor.edicao = None;
        }
        Ok(tamanho)
    }

    /// Aplica um formulário ainda aberto ao item em edição.
    /// Devolve `true` quando a alteração deve disparar o salvamento automático.
    pub fn atualizar_em_andamento(&mut self, formulario: Formulario) -> Result<bool, AppError> {
        let tipo = formulario.tipo();
        let Some(edicao) = self.cursor.edicao.filter(|e| e.tipo == tipo) else {
            return Ok(false);
        };
        if formulario.validar().is_err() {
            return Ok(false);
        }

        match formulario {
            Formulario::Risco(f) => match self.riscos_do_alvo_mut()?.get_mut(edicao.indice) {
                Some(risco) => *risco = f.into_risco(),
                None => return Ok(false),
            },
            Formulario::Acao(f) => match self.inspecao.plano_de_acao.get_mut(edicao.indice) {
                Some(acao) => *acao = f.into_acao(),
                None => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn remover(&mut self, tipo: TipoEntidade, indice: usize) -> Result<(), AppError> {
        match tipo {
            TipoEntidade::Departamento => {
                remover_em(&mut self.inspecao.departamentos, tipo, indice)?;
                self.remapear_departamento(|atual| apos_remocao(atual, indice));
            }
            TipoEntidade::Cargo => {
                remover_em(&mut self.departamento_ativo_mut()?.cargos, tipo, indice)?;
                self.remapear_alvo(tipo, |atual| apos_remocao(atual, indice));
            }
            TipoEntidade::Funcionario => {
                remover_em(&mut self.departamento_ativo_mut()?.funcionarios, tipo, indice)?;
                self.remapear_alvo(tipo, |atual| apos_remocao(atual, indice));
            }
            TipoEntidade::Grupo => {
                let removido = remover_em(&mut self.departamento_ativo_mut()?.grupos, tipo, indice)?;
                if self.cursor.alvo == Some(AlvoRiscos::Grupo(removido.id)) {
                    self.cursor.alvo = None;
                    self.recuar_etapa_se_necessario();
                }
            }
            TipoEntidade::Risco => {
                remover_em(self.riscos_do_alvo_mut()?, tipo, indice)?;
            }
            TipoEntidade::Acao => {
                remover_em(&mut self.inspecao.plano_de_acao, tipo, indice)?;
            }
        }
        self.remapear_edicao(tipo, |atual| apos_remocao(atual, indice));
        Ok(())
    }

    /// Cópia profunda inserida logo após a origem. Devolve o índice da cópia.
    pub fn duplicar(&mut self, tipo: TipoEntidade, indice: usize) -> Result<usize, AppError> {
        let nova_posicao = match tipo {
            TipoEntidade::Departamento => {
                duplicar_em(&mut self.inspecao.departamentos, tipo, indice, |d| {
                    com_copia(&mut d.nome);
                    // Ids de grupo não podem se repetir dentro da inspeção.
                    for grupo in &mut d.grupos {
                        grupo.id = novo_id_grupo();
                    }
                })?
            }
            TipoEntidade::Cargo => duplicar_em(&mut self.departamento_ativo_mut()?.cargos, tipo, indice, |c| {
                com_copia(&mut c.nome)
            })?,
            TipoEntidade::Funcionario => {
                duplicar_em(&mut self.departamento_ativo_mut()?.funcionarios, tipo, indice, |f| {
                    com_copia(&mut f.nome)
                })?
            }
            TipoEntidade::Grupo => duplicar_em(&mut self.departamento_ativo_mut()?.grupos, tipo, indice, |g| {
                g.id = novo_id_grupo();
                // Apenas o primeiro cargo da lista recebe o sufixo.
                if let Some(primeiro) = g.lista_de_cargos.first_mut() {
                    com_copia(primeiro);
                }
            })?,
            TipoEntidade::Risco => duplicar_em(self.riscos_do_alvo_mut()?, tipo, indice, |r| {
                com_copia(&mut r.perigo)
            })?,
            TipoEntidade::Acao => duplicar_em(&mut self.inspecao.plano_de_acao, tipo, indice, |a| {
                com_copia(&mut a.atividade)
            })?,
        };

        match tipo {
            TipoEntidade::Departamento => {
                self.remapear_departamento(|atual| Some(apos_insercao(atual, nova_posicao)))
            }
            TipoEntidade::Cargo | TipoEntidade::Funcionario => {
                self.remapear_alvo(tipo, |atual| Some(apos_insercao(atual, nova_posicao)))
            }
            _ => {}
        }
        self.remapear_edicao(tipo, |atual| Some(apos_insercao(atual, nova_posicao)));
        Ok(nova_posicao)
    }

    /// Move um item para `para`, preservando a ordem relativa dos demais.
    pub fn reordenar(&mut self, tipo: TipoEntidade, de: usize, para: usize) -> Result<(), AppError> {
        match tipo {
            TipoEntidade::Departamento => {
                mover_em(&mut self.inspecao.departamentos, tipo, de, para)?;
                self.remapear_departamento(|atual| Some(apos_mover(atual, de, para)));
            }
            TipoEntidade::Cargo => {
                mover_em(&mut self.departamento_ativo_mut()?.cargos, tipo, de, para)?;
                self.remapear_alvo(tipo, |atual| Some(apos_mover(atual, de, para)));
            }
            TipoEntidade::Funcionario => {
                mover_em(&mut self.departamento_ativo_mut()?.funcionarios, tipo, de, para)?;
                self.remapear_alvo(tipo, |atual| Some(apos_mover(atual, de, para)));
            }
            TipoEntidade::Grupo => mover_em(&mut self.departamento_ativo_mut()?.grupos, tipo, de, para)?,
            TipoEntidade::Risco => mover_em(self.riscos_do_alvo_mut()?, tipo, de, para)?,
            TipoEntidade::Acao => mover_em(&mut self.inspecao.plano_de_acao, tipo, de, para)?,
        }
        self.remapear_edicao(tipo, |atual| Some(apos_mover(atual, de, para)));
        Ok(())
    }

    // --- Manutenção do cursor após mudanças estruturais ---

    fn remapear_departamento(&mut self, f: impl FnOnce(usize) -> Option<usize>) {
        if let Some(atual) = self.cursor.departamento_ativo {
            self.cursor.departamento_ativo = f(atual);
            if self.cursor.departamento_ativo.is_none() {
                self.cursor.alvo = None;
                self.recuar_etapa_se_necessario();
            }
        }
    }

    fn remapear_alvo(&mut self, tipo: TipoEntidade, f: impl FnOnce(usize) -> Option<usize>) {
        let novo = match (&self.cursor.alvo, tipo) {
            (Some(AlvoRiscos::Cargo(i)), TipoEntidade::Cargo) => Some(f(*i).map(AlvoRiscos::Cargo)),
            (Some(AlvoRiscos::Funcionario(i)), TipoEntidade::Funcionario) => {
                Some(f(*i).map(AlvoRiscos::Funcionario))
            }
            _ => None,
        };
        if let Some(novo) = novo {
            self.cursor.alvo = novo;
            if self.cursor.alvo.is_none() {
                self.recuar_etapa_se_necessario();
            }
        }
    }

    fn remapear_edicao(&mut self, tipo: TipoEntidade, f: impl FnOnce(usize) -> Option<usize>) {
        let Some(edicao) = self.cursor.edicao else {
            return;
        };
        if edicao.tipo == tipo {
            self.cursor.edicao = f(edicao.indice).map(|indice| Edicao { tipo, indice });
        } else if e_ancestral(tipo, edicao.tipo) {
            self.cursor.edicao = None;
        }
    }

    // Sem departamento não há etapa 2; sem alvo não há etapa 3.
    fn recuar_etapa_se_necessario(&mut self) {
        if self.cursor.departamento_ativo.is_none() && self.cursor.etapa > Etapa::Departamentos {
            self.cursor.etapa = Etapa::Departamentos;
        } else if self.cursor.alvo.is_none() && self.cursor.etapa > Etapa::Sujeitos {
            self.cursor.etapa = Etapa::Sujeitos;
        }
    }
}
