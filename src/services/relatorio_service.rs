// src/services/relatorio_service.rs

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use genpdf::{Element, elements, style};

use crate::{
    common::error::AppError,
    db::InspecaoStore,
    models::{
        inspecao::{DADOS_LTCAT_PERMITIDOS, Departamento, Inspecao, InspecaoId, PerfilRisco, Risco, SimNao},
        relatorio::{
            BlocoRisco, Campo, CategoriaRisco, LinhaPlanoAcao, Marcador, NAO_INFORMADO, Relatorio, SEM_RISCOS,
            SecaoDepartamento, SecaoSujeito, informado,
        },
    },
};

const FAMILIA_FONTE: &str = "Roboto";

// =============================================================================
//  COMPILAÇÃO (pura)
// =============================================================================

/// Projeta uma inspeção salva no documento imprimível. Não toca em nada externo.
pub fn compilar(inspecao: &Inspecao) -> Relatorio {
    let empresa = inspecao.empresa.clone().unwrap_or_default();

    Relatorio {
        inspecao_id: inspecao.id,
        titulo: format!(
            "Relatório de Inspeção - {}",
            inspecao.nome_empresa().unwrap_or(NAO_INFORMADO)
        ),
        empresa: vec![
            Campo::new("Empresa", Some(empresa.nome.as_str())),
            Campo::new("CNPJ", empresa.cnpj.as_deref()),
            Campo::new("Data", data(empresa.data).as_deref()),
            Campo::new("Elaborado por", empresa.elaborado.as_deref()),
            Campo::new("Aprovado por", empresa.aprovado.as_deref()),
        ],
        departamentos: inspecao.departamentos.iter().map(secao_departamento).collect(),
        plano_de_acao: inspecao
            .plano_de_acao
            .iter()
            .map(|acao| LinhaPlanoAcao {
                atividade: informado(Some(acao.atividade.as_str())),
                descricao: informado(acao.descricao.as_deref()),
                prazo_inicio: informado(data(acao.prazo_inicio).as_deref()),
                prazo_fim: informado(data(acao.prazo_fim).as_deref()),
                status: acao.status.rotulo().to_string(),
            })
            .collect(),
        atualizado_em: inspecao.updated_at,
    }
}

fn data(valor: Option<NaiveDate>) -> Option<String> {
    valor.map(|d| d.format("%d/%m/%Y").to_string())
}

fn secao_departamento(departamento: &Departamento) -> SecaoDepartamento {
    // Ordem fixa do relatório: grupos, cargos, funcionários.
    let sujeitos: Vec<SecaoSujeito> = departamento
        .grupos
        .iter()
        .map(|g| secao_sujeito("Grupo", &g.rotulo(), &g.perfil))
        .chain(departamento.cargos.iter().map(|c| secao_sujeito("Cargo", &c.nome, &c.perfil)))
        .chain(
            departamento
                .funcionarios
                .iter()
                .map(|f| secao_sujeito("Funcionário", &f.nome, &f.perfil)),
        )
        .collect();

    SecaoDepartamento {
        titulo: informado(Some(departamento.nome.as_str())),
        caracteristica: informado(departamento.caracteristica.as_deref()),
        descricao: informado(departamento.descricao.as_deref()),
        aviso: departamento.sem_sujeitos().then(|| SEM_RISCOS.to_string()),
        sujeitos,
    }
}

fn marcador(rotulo: &str, valor: SimNao) -> Marcador {
    Marcador {
        rotulo: rotulo.to_string(),
        marcado: valor == SimNao::Sim,
    }
}

fn secao_sujeito(tipo: &str, nome: &str, perfil: &PerfilRisco) -> SecaoSujeito {
    let nr = &perfil.requisitos_nr;
    let riscos: Vec<BlocoRisco> = perfil.riscos.iter().map(bloco_risco).collect();
    let observacoes = (!perfil.observacoes.is_empty()).then(|| perfil.observacoes.join(", "));

    SecaoSujeito {
        tipo: tipo.to_string(),
        nome: informado(Some(nome)),
        observacoes: informado(observacoes.as_deref()),
        perfil_exposicao: informado(perfil.perfil_exposicao.as_deref()),
        descricao_atividade: marcador("Descrição da atividade", perfil.descricao_atividade),
        requisitos_nr: vec![
            marcador("Medida de proteção adequada ao risco (NR-06)", nr.medida),
            marcador("Condição de conservação do EPI (NR-06)", nr.condicao),
            marcador("Prazo de validade do CA (NR-06)", nr.prazo),
            marcador("Periodicidade de troca definida (NR-01)", nr.periodicidade),
            marcador("Higienização e manutenção (NR-06)", nr.higienizacao),
        ],
        dados_ltcat: DADOS_LTCAT_PERMITIDOS
            .iter()
            .map(|rotulo| Marcador {
                rotulo: rotulo.to_string(),
                marcado: perfil.dados_ltcat.iter().any(|d| d == rotulo),
            })
            .collect(),
        aviso: riscos.is_empty().then(|| SEM_RISCOS.to_string()),
        riscos,
    }
}

fn categoria(titulo: &str, campos: &[(&str, Option<&str>)]) -> CategoriaRisco {
    CategoriaRisco {
        titulo: titulo.to_string(),
        campos: campos.iter().map(|(rotulo, valor)| Campo::new(rotulo, *valor)).collect(),
    }
}

fn bloco_risco(risco: &Risco) -> BlocoRisco {
    BlocoRisco {
        titulo: informado(Some(risco.perigo.as_str())),
        risco_presente: risco.risco_presente.rotulo().to_string(),
        categorias: vec![
            categoria(
                "Informações básicas",
                &[
                    ("Tipo", risco.tipo.as_deref()),
                    ("Código eSocial", risco.codigo_esocial.as_deref()),
                    ("Perigo", Some(risco.perigo.as_str())),
                    ("Descrição detalhada", risco.descricao_detalhada.as_deref()),
                ],
            ),
            categoria(
                "Fonte e exposição",
                &[
                    ("Fonte geradora", risco.fonte_geradora.as_deref()),
                    ("Perfil de exposição", risco.perfil_exposicao.as_deref()),
                    ("Medição", risco.medicao.as_deref()),
                    ("Tempo de exposição", risco.tempo_exposicao.as_deref()),
                    ("Tipo de exposição", risco.tipo_exposicao.as_deref()),
                    ("Observações ambientais", risco.obs_ambientais.as_deref()),
                ],
            ),
            categoria(
                "Avaliação",
                &[
                    ("Probabilidade", risco.probabilidade.as_deref()),
                    ("Severidade", risco.severidade.as_deref()),
                    ("Aceitabilidade", risco.aceitabilidade.as_deref()),
                    ("Danos", risco.danos.as_deref()),
                ],
            ),
            categoria(
                "Controles",
                &[
                    ("EPI utilizado", risco.epi_utilizado.as_deref()),
                    ("CA", risco.ca.as_deref()),
                    ("EPC", risco.epc.as_deref()),
                    ("EPI sugerido", risco.epi_sugerido.as_deref()),
                    ("Ações necessárias", risco.acoes_necessarias.as_deref()),
                    ("Observações gerais", risco.observacoes_gerais.as_deref()),
                ],
            ),
        ],
    }
}

// =============================================================================
//  SERVIÇO (carrega do banco e renderiza PDF)
// =============================================================================

#[derive(Clone)]
pub struct RelatorioService {
    store: Arc<dyn InspecaoStore>,
    fonts_dir: PathBuf,
}

impl RelatorioService {
    pub fn new(store: Arc<dyn InspecaoStore>, fonts_dir: PathBuf) -> Self {
        Self { store, fonts_dir }
    }

    pub async fn gerar(&self, id: InspecaoId) -> Result<Relatorio, AppError> {
        let inspecao = self.store.get(id).await?;
        Ok(compilar(&inspecao))
    }

    pub async fn gerar_pdf(&self, id: InspecaoId) -> Result<Vec<u8>, AppError> {
        let relatorio = self.gerar(id).await?;
        self.renderizar_pdf(&relatorio)
    }

    pub fn renderizar_pdf(&self, relatorio: &Relatorio) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FAMILIA_FONTE, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "Fonte {} não encontrada na pasta {}",
                FAMILIA_FONTE,
                self.fonts_dir.display()
            ))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(relatorio.titulo.clone());
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let negrito = style::Style::new().bold();

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(relatorio.titulo.clone()).styled(negrito.with_font_size(16)));
        doc.push(elements::Break::new(1));
        for campo in &relatorio.empresa {
            doc.push(elements::Paragraph::new(format!("{}: {}", campo.rotulo, campo.valor)));
        }

        // --- DEPARTAMENTOS ---
        for departamento in &relatorio.departamentos {
            doc.push(elements::Break::new(2));
            doc.push(
                elements::Paragraph::new(format!("Departamento: {}", departamento.titulo))
                    .styled(negrito.with_font_size(14)),
            );
            doc.push(elements::Paragraph::new(format!("Característica: {}", departamento.caracteristica)));
            doc.push(elements::Paragraph::new(format!("Descrição: {}", departamento.descricao)));
            if let Some(aviso) = &departamento.aviso {
                doc.push(elements::Paragraph::new(aviso.clone()).styled(style::Style::new().italic()));
            }

            for sujeito in &departamento.sujeitos {
                doc.push(elements::Break::new(1));
                doc.push(
                    elements::Paragraph::new(format!("{}: {}", sujeito.tipo, sujeito.nome))
                        .styled(negrito.with_font_size(12)),
                );
                doc.push(elements::Paragraph::new(format!("Observações: {}", sujeito.observacoes)));
                doc.push(elements::Paragraph::new(format!(
                    "Perfil de exposição: {}",
                    sujeito.perfil_exposicao
                )));
                doc.push(tabela_marcadores(
                    std::iter::once(&sujeito.descricao_atividade)
                        .chain(&sujeito.requisitos_nr)
                        .chain(&sujeito.dados_ltcat),
                )?);

                if let Some(aviso) = &sujeito.aviso {
                    doc.push(elements::Paragraph::new(aviso.clone()).styled(style::Style::new().italic()));
                }
                for risco in &sujeito.riscos {
                    doc.push(elements::Break::new(0.5));
                    doc.push(
                        elements::Paragraph::new(format!(
                            "Risco: {} (presente: {})",
                            risco.titulo, risco.risco_presente
                        ))
                        .styled(negrito),
                    );
                    for categoria in &risco.categorias {
                        doc.push(elements::Paragraph::new(categoria.titulo.clone()).styled(style::Style::new().italic()));
                        doc.push(tabela_campos(&categoria.campos)?);
                    }
                }
            }
        }

        // --- PLANO DE AÇÃO ---
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new("Plano de Ação").styled(negrito.with_font_size(14)));
        if relatorio.plano_de_acao.is_empty() {
            doc.push(elements::Paragraph::new(NAO_INFORMADO));
        } else {
            let mut tabela = elements::TableLayout::new(vec![3, 3, 2, 2, 2]);
            tabela.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
            tabela
                .row()
                .element(elements::Paragraph::new("Atividade").styled(negrito))
                .element(elements::Paragraph::new("Descrição").styled(negrito))
                .element(elements::Paragraph::new("Início").styled(negrito))
                .element(elements::Paragraph::new("Fim").styled(negrito))
                .element(elements::Paragraph::new("Status").styled(negrito))
                .push()
                .map_err(erro_pdf)?;
            for linha in &relatorio.plano_de_acao {
                tabela
                    .row()
                    .element(elements::Paragraph::new(linha.atividade.clone()))
                    .element(elements::Paragraph::new(linha.descricao.clone()))
                    .element(elements::Paragraph::new(linha.prazo_inicio.clone()))
                    .element(elements::Paragraph::new(linha.prazo_fim.clone()))
                    .element(elements::Paragraph::new(linha.status.clone()))
                    .push()
                    .map_err(erro_pdf)?;
            }
            doc.push(tabela);
        }

        doc.push(elements::Break::new(2));
        doc.push(
            elements::Paragraph::new(format!(
                "Atualizado em {}",
                relatorio.atualizado_em.format("%d/%m/%Y %H:%M")
            ))
            .styled(style::Style::new().italic().with_font_size(8)),
        );

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(erro_pdf)?;
        Ok(buffer)
    }
}

fn erro_pdf(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

fn tabela_campos(campos: &[Campo]) -> Result<elements::TableLayout, AppError> {
    let mut tabela = elements::TableLayout::new(vec![1, 2]);
    tabela.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    for campo in campos {
        tabela
            .row()
            .element(elements::Paragraph::new(campo.rotulo.clone()))
            .element(elements::Paragraph::new(campo.valor.clone()))
            .push()
            .map_err(erro_pdf)?;
    }
    Ok(tabela)
}

fn tabela_marcadores<'a>(marcadores: impl Iterator<Item = &'a Marcador>) -> Result<elements::TableLayout, AppError> {
    let mut tabela = elements::TableLayout::new(vec![3, 1]);
    tabela.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    for marcador in marcadores {
        tabela
            .row()
            .element(elements::Paragraph::new(marcador.rotulo.clone()))
            .element(elements::Paragraph::new(marcador.texto()))
            .push()
            .map_err(erro_pdf)?;
    }
    Ok(tabela)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inspecao::{AcaoPlano, Empresa, Grupo, PerfilCargo, StatusAcao};
    use crate::test_utils::MemoriaStore;

    fn risco(perigo: &str) -> Risco {
        Risco {
            perigo: perigo.into(),
            ..Risco::novo()
        }
    }

    fn inspecao_exemplo() -> Inspecao {
        let mut inspecao = Inspecao::nova();
        inspecao.id = Some(InspecaoId(7));
        inspecao.empresa = Some(Empresa {
            nome: "Acme".into(),
            cnpj: Some("12.345.678/0001-90".into()),
            data: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..Default::default()
        });

        let mut soldador = PerfilCargo {
            nome: "Soldador".into(),
            ..PerfilCargo::novo()
        };
        soldador.perfil.riscos.push(Risco {
            fonte_geradora: Some("Solda MIG".into()),
            ..risco("Inalação de fumos metálicos")
        });
        soldador.perfil.dados_ltcat = vec!["Insalubridade".into()];

        let mut manutencao = Grupo::novo();
        manutencao.lista_de_cargos = vec!["Mecânico".into(), "Eletricista".into()];

        let producao = Departamento {
            nome: "Produção".into(),
            cargos: vec![soldador],
            funcionarios: vec![PerfilCargo {
                nome: "João".into(),
                ..PerfilCargo::novo()
            }],
            grupos: vec![manutencao],
            ..Departamento::novo()
        };
        let vazio = Departamento {
            nome: "Almoxarifado".into(),
            ..Departamento::novo()
        };
        inspecao.departamentos = vec![producao, vazio];

        inspecao.plano_de_acao = vec![
            AcaoPlano {
                atividade: "Instalar exaustão".into(),
                prazo_fim: NaiveDate::from_ymd_opt(2025, 6, 30),
                status: StatusAcao::EmAndamento,
                ..AcaoPlano::nova()
            },
            AcaoPlano {
                atividade: "Treinar equipe".into(),
                ..AcaoPlano::nova()
            },
        ];
        inspecao
    }

    #[test]
    fn sujeitos_saem_na_ordem_grupo_cargo_funcionario() {
        let relatorio = compilar(&inspecao_exemplo());
        let producao = &relatorio.departamentos[0];

        let ordem: Vec<(&str, &str)> = producao
            .sujeitos
            .iter()
            .map(|s| (s.tipo.as_str(), s.nome.as_str()))
            .collect();
        assert_eq!(
            ordem,
            vec![
                ("Grupo", "Mecânico, Eletricista"),
                ("Cargo", "Soldador"),
                ("Funcionário", "João")
            ]
        );
        assert!(producao.aviso.is_none());
    }

    #[test]
    fn departamento_vazio_sai_com_o_aviso() {
        let relatorio = compilar(&inspecao_exemplo());
        let almoxarifado = &relatorio.departamentos[1];

        assert_eq!(almoxarifado.titulo, "Almoxarifado");
        assert!(almoxarifado.sujeitos.is_empty());
        assert_eq!(almoxarifado.aviso.as_deref(), Some(SEM_RISCOS));
        assert_eq!(almoxarifado.caracteristica, NAO_INFORMADO);
    }

    #[test]
    fn sujeito_sem_riscos_tambem_recebe_o_aviso() {
        let relatorio = compilar(&inspecao_exemplo());
        let joao = &relatorio.departamentos[0].sujeitos[2];
        assert!(joao.riscos.is_empty());
        assert_eq!(joao.aviso.as_deref(), Some(SEM_RISCOS));
    }

    #[test]
    fn risco_tem_as_quatro_categorias_com_todos_os_campos() {
        let relatorio = compilar(&inspecao_exemplo());
        let soldador = &relatorio.departamentos[0].sujeitos[1];
        let bloco = &soldador.riscos[0];

        assert_eq!(bloco.titulo, "Inalação de fumos metálicos");
        assert_eq!(bloco.risco_presente, "Sim");

        let titulos: Vec<&str> = bloco.categorias.iter().map(|c| c.titulo.as_str()).collect();
        assert_eq!(
            titulos,
            vec!["Informações básicas", "Fonte e exposição", "Avaliação", "Controles"]
        );
        let total: usize = bloco.categorias.iter().map(|c| c.campos.len()).sum();
        assert_eq!(total, 20);

        let fonte = &bloco.categorias[1].campos[0];
        assert_eq!((fonte.rotulo.as_str(), fonte.valor.as_str()), ("Fonte geradora", "Solda MIG"));
        let medicao = &bloco.categorias[1].campos[2];
        assert_eq!(medicao.valor, NAO_INFORMADO);
    }

    #[test]
    fn checklists_mostram_sim_e_nao_explicitos() {
        let relatorio = compilar(&inspecao_exemplo());
        let soldador = &relatorio.departamentos[0].sujeitos[1];

        assert_eq!(soldador.requisitos_nr.len(), 5);
        assert!(soldador.requisitos_nr.iter().all(|m| m.texto() == "[ ] Não"));

        let ltcat: Vec<(&str, bool)> = soldador
            .dados_ltcat
            .iter()
            .map(|m| (m.rotulo.as_str(), m.marcado))
            .collect();
        assert_eq!(ltcat.len(), DADOS_LTCAT_PERMITIDOS.len());
        assert!(ltcat.contains(&("Insalubridade", true)));
        assert!(ltcat.contains(&("Periculosidade", false)));
        assert_eq!(soldador.observacoes, NAO_INFORMADO);
    }

    #[test]
    fn empresa_e_plano_de_acao_usam_marcadores_de_ausencia() {
        let relatorio = compilar(&inspecao_exemplo());

        assert_eq!(relatorio.titulo, "Relatório de Inspeção - Acme");
        assert_eq!(relatorio.empresa[2].valor, "14/03/2025");
        assert_eq!(relatorio.empresa[3].valor, NAO_INFORMADO);

        let plano = &relatorio.plano_de_acao;
        assert_eq!(plano.len(), 2);
        assert_eq!(plano[0].atividade, "Instalar exaustão");
        assert_eq!(plano[0].prazo_inicio, NAO_INFORMADO);
        assert_eq!(plano[0].prazo_fim, "30/06/2025");
        assert_eq!(plano[0].status, "Em Andamento");
        assert_eq!(plano[1].status, "Pendente");
    }

    #[test]
    fn inspecao_sem_empresa_ainda_compila() {
        let relatorio = compilar(&Inspecao::nova());
        assert_eq!(relatorio.titulo, format!("Relatório de Inspeção - {}", NAO_INFORMADO));
        assert!(relatorio.empresa.iter().all(|c| c.valor == NAO_INFORMADO));
        assert!(relatorio.departamentos.is_empty());
    }

    #[tokio::test]
    async fn gerar_busca_no_armazenamento() {
        let store = Arc::new(MemoriaStore::default());
        let id = store.semear(inspecao_exemplo());
        let servico = RelatorioService::new(store, PathBuf::from("./fonts"));

        let relatorio = servico.gerar(id).await.unwrap();
        assert_eq!(relatorio.inspecao_id, Some(id));

        let erro = servico.gerar(InspecaoId(999)).await.unwrap_err();
        assert!(matches!(erro, AppError::InspecaoNaoEncontrada(_)));
    }

    #[test]
    fn pdf_sem_fontes_retorna_erro_de_fonte() {
        let servico = RelatorioService::new(
            Arc::new(MemoriaStore::default()),
            PathBuf::from("/caminho/que/nao/existe"),
        );
        let erro = servico.renderizar_pdf(&compilar(&inspecao_exemplo())).unwrap_err();
        assert!(matches!(erro, AppError::FontNotFound(_)));
    }
}
