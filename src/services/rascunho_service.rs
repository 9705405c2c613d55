// src/services/rascunho_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::InspecaoStore,
    models::{formularios::Formulario, inspecao::InspecaoId},
    services::{
        autosave_service::{AutosaveHandle, RascunhoCompartilhado, ResultadoSalvamento, StatusSalvamento},
        rascunho::SessaoRascunho,
    },
};

/// Dono do rascunho aberto. Toda alteração passa por aqui e agenda o salvamento.
#[derive(Clone)]
pub struct RascunhoService {
    rascunho: RascunhoCompartilhado,
    store: Arc<dyn InspecaoStore>,
    autosave: AutosaveHandle,
}

impl RascunhoService {
    pub fn new(rascunho: RascunhoCompartilhado, store: Arc<dyn InspecaoStore>, autosave: AutosaveHandle) -> Self {
        Self {
            rascunho,
            store,
            autosave,
        }
    }

    /// Descarta o rascunho atual (o que não foi salvo se perde) e começa outro.
    pub async fn novo(&self) -> SessaoRascunho {
        self.autosave.cancelar();
        let sessao = SessaoRascunho::nova();
        *self.rascunho.lock().await = Some(sessao.clone());
        tracing::info!("📝 Nova inspeção em rascunho");
        sessao
    }

    pub async fn abrir(&self, id: InspecaoId) -> Result<SessaoRascunho, AppError> {
        let inspecao = self.store.get(id).await?;
        self.autosave.cancelar();
        let sessao = SessaoRascunho::de_inspecao(inspecao);
        *self.rascunho.lock().await = Some(sessao.clone());
        tracing::info!(%id, "📂 Inspeção aberta para edição");
        Ok(sessao)
    }

    pub async fn visao(&self) -> Result<SessaoRascunho, AppError> {
        self.rascunho.lock().await.clone().ok_or(AppError::RascunhoNaoAberto)
    }

    /// Aplica uma alteração ao rascunho e agenda o salvamento automático.
    /// Devolve a sessão já alterada junto com o resultado da operação.
    pub async fn mutar<T>(
        &self,
        operacao: impl FnOnce(&mut SessaoRascunho) -> Result<T, AppError>,
    ) -> Result<(T, SessaoRascunho), AppError> {
        let resultado = self.aplicar(operacao).await?;
        self.autosave.agendar();
        Ok(resultado)
    }

    /// Só move o cursor do assistente; não agenda salvamento.
    pub async fn navegar(
        &self,
        operacao: impl FnOnce(&mut SessaoRascunho) -> Result<(), AppError>,
    ) -> Result<SessaoRascunho, AppError> {
        let ((), sessao) = self.aplicar(operacao).await?;
        tracing::debug!(etapa = ?sessao.cursor().etapa, "cursor do assistente movido");
        Ok(sessao)
    }

    /// Formulário de risco ou ação sendo digitado. Só agenda quando o item já existe.
    pub async fn em_andamento(&self, formulario: Formulario) -> Result<bool, AppError> {
        let (qualifica, _) = self.aplicar(|sessao| sessao.atualizar_em_andamento(formulario)).await?;
        if qualifica {
            self.autosave.agendar();
        }
        Ok(qualifica)
    }

    /// Apaga a inspeção do armazenamento. Se ela é o rascunho aberto, o rascunho
    /// é fechado antes, para que nenhum salvamento a traga de volta.
    pub async fn excluir(&self, id: InspecaoId) -> Result<(), AppError> {
        let estava_aberta = {
            let mut guarda = self.rascunho.lock().await;
            let aberta = guarda.as_ref().is_some_and(|sessao| sessao.id() == Some(id));
            if aberta {
                *guarda = None;
            }
            aberta
        };
        if estava_aberta {
            // Uma gravação já iniciada termina antes da exclusão.
            self.autosave.descartar_pendente().await;
            tracing::info!(%id, "rascunho aberto fechado pela exclusão da inspeção");
        }
        self.store.delete(id).await?;
        tracing::info!(%id, "🗑️ Inspeção excluída");
        Ok(())
    }

    pub async fn salvar(&self) -> Result<ResultadoSalvamento, AppError> {
        self.autosave.salvar_agora().await
    }

    pub fn status(&self) -> StatusSalvamento {
        self.autosave.status()
    }

    async fn aplicar<T>(
        &self,
        operacao: impl FnOnce(&mut SessaoRascunho) -> Result<T, AppError>,
    ) -> Result<(T, SessaoRascunho), AppError> {
        let mut guarda = self.rascunho.lock().await;
        let sessao = guarda.as_mut().ok_or(AppError::RascunhoNaoAberto)?;
        let valor = operacao(sessao)?;
        Ok((valor, sessao.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{Mutex, watch};

    use super::*;
    use crate::db::InspecaoRepository;
    use crate::models::formularios::{FormAcao, FormDepartamento, FormEmpresa, FormPerfil, FormRisco};
    use crate::models::inspecao::{Inspecao, SimNao, TipoEntidade};
    use crate::services::autosave_service::{AutoSaveConfig, CoordenadorAutosave};
    use crate::services::rascunho::{AlvoRiscos, Etapa};
    use crate::test_utils::{MemoriaStore, pool_em_memoria};

    fn montar(store: Arc<dyn InspecaoStore>) -> RascunhoService {
        let rascunho: RascunhoCompartilhado = Arc::new(Mutex::new(None));
        // Sem emissor: a tarefa deixa de ouvir a conectividade e segue online.
        let (_, conectividade) = watch::channel(true);
        let coordenador = CoordenadorAutosave::new(store.clone(), rascunho.clone(), AutoSaveConfig::default(), true);
        RascunhoService::new(rascunho, store, AutosaveHandle::iniciar(coordenador, conectividade))
    }

    fn empresa(nome: &str) -> FormEmpresa {
        FormEmpresa {
            nome: nome.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn acme_producao_soldador_e_salva_e_recarregada_do_sqlite() {
        let pool = pool_em_memoria().await;
        let store: Arc<dyn InspecaoStore> = Arc::new(InspecaoRepository::new(pool));
        let servico = montar(store.clone());

        servico.novo().await;
        servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap();
        servico
            .mutar(|s| {
                s.upsert(
                    Formulario::Departamento(FormDepartamento {
                        nome: "Produção".into(),
                        ..Default::default()
                    }),
                    None,
                )
            })
            .await
            .unwrap();
        servico.navegar(|s| s.selecionar_departamento(0)).await.unwrap();
        servico
            .mutar(|s| {
                s.upsert(
                    Formulario::Cargo(FormPerfil {
                        nome: "Soldador".into(),
                        ..Default::default()
                    }),
                    None,
                )
            })
            .await
            .unwrap();
        servico
            .navegar(|s| {
                s.selecionar_alvo(AlvoRiscos::Cargo(0))?;
                s.ir_para_etapa(Etapa::Riscos)
            })
            .await
            .unwrap();
        servico
            .mutar(|s| {
                s.upsert(
                    Formulario::Risco(FormRisco {
                        perigo: "Inalação de fumos metálicos".into(),
                        ..Default::default()
                    }),
                    None,
                )
            })
            .await
            .unwrap();

        let id = match servico.salvar().await.unwrap() {
            ResultadoSalvamento::Salvo { id } => id,
            outro => panic!("resultado inesperado: {:?}", outro),
        };
        assert_eq!(servico.visao().await.unwrap().id(), Some(id));

        let recarregada = store.get(id).await.unwrap();
        assert_eq!(recarregada.id, Some(id));
        assert_eq!(recarregada.nome_empresa(), Some("Acme"));
        assert_eq!(recarregada.departamentos.len(), 1);

        let producao = &recarregada.departamentos[0];
        assert_eq!(producao.nome, "Produção");
        assert_eq!(producao.cargos.len(), 1);
        assert_eq!(producao.cargos[0].nome, "Soldador");

        let riscos = &producao.cargos[0].perfil.riscos;
        assert_eq!(riscos.len(), 1);
        assert_eq!(riscos[0].perigo, "Inalação de fumos metálicos");
        assert_eq!(riscos[0].risco_presente, SimNao::Sim);

        // Reabrir traz a mesma árvore com o cursor zerado.
        let reaberta = servico.abrir(id).await.unwrap();
        assert_eq!(reaberta.inspecao().departamentos, recarregada.departamentos);
        assert_eq!(reaberta.cursor().etapa, Etapa::Empresa);
    }

    #[tokio::test]
    async fn sem_rascunho_aberto_as_alteracoes_falham() {
        let servico = montar(Arc::new(MemoriaStore::default()));

        let erro = servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::RascunhoNaoAberto));
        assert!(matches!(servico.visao().await, Err(AppError::RascunhoNaoAberto)));
    }

    #[tokio::test]
    async fn abrir_inexistente_mantem_o_rascunho_atual() {
        let servico = montar(Arc::new(MemoriaStore::default()));
        let atual = servico.novo().await;

        let erro = servico.abrir(InspecaoId(42)).await.unwrap_err();
        assert!(matches!(erro, AppError::InspecaoNaoEncontrada(InspecaoId(42))));
        assert_eq!(servico.visao().await.unwrap().geracao(), atual.geracao());
    }

    #[tokio::test]
    async fn erro_de_validacao_nao_altera_o_rascunho() {
        let servico = montar(Arc::new(MemoriaStore::default()));
        servico.novo().await;

        let erro = servico
            .mutar(|s| s.upsert(Formulario::Departamento(FormDepartamento::default()), None))
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::ValidationError(_)));
        assert!(servico.visao().await.unwrap().inspecao().departamentos.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn alteracoes_depois_do_primeiro_salvamento_sao_salvas_sozinhas() {
        let store = Arc::new(MemoriaStore::default());
        let servico = montar(store.clone());

        servico.novo().await;
        servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap();

        // Ainda sem id: o automático não grava nada.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.gravacoes(), 0);

        servico.salvar().await.unwrap();
        assert_eq!(store.gravacoes(), 1);

        servico
            .mutar(|s| {
                s.upsert(
                    Formulario::Acao(FormAcao {
                        atividade: "Instalar exaustão".into(),
                        ..Default::default()
                    }),
                    None,
                )
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.gravacoes(), 2);

        // Ação nova em digitação não agenda; a existente em edição sim.
        let parcial = Formulario::Acao(FormAcao {
            atividade: "Instalar exaustão local".into(),
            ..Default::default()
        });
        assert!(!servico.em_andamento(parcial.clone()).await.unwrap());
        servico
            .navegar(|s| s.iniciar_edicao(TipoEntidade::Acao, 0))
            .await
            .unwrap();
        assert!(servico.em_andamento(parcial).await.unwrap());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.gravacoes(), 3);

        let id = servico.visao().await.unwrap().id().unwrap();
        assert_eq!(
            store.get(id).await.unwrap().plano_de_acao[0].atividade,
            "Instalar exaustão local"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn excluir_a_inspecao_aberta_fecha_o_rascunho_e_nada_a_recria() {
        let store = Arc::new(MemoriaStore::default());
        let servico = montar(store.clone());

        servico.novo().await;
        servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap();
        let id = match servico.salvar().await.unwrap() {
            ResultadoSalvamento::Salvo { id } => id,
            outro => panic!("resultado inesperado: {:?}", outro),
        };

        // Alteração com prazo pendente no momento da exclusão.
        servico
            .mutar(|s| {
                s.upsert(
                    Formulario::Departamento(FormDepartamento {
                        nome: "Produção".into(),
                        ..Default::default()
                    }),
                    None,
                )
            })
            .await
            .unwrap();

        servico.excluir(id).await.unwrap();
        assert!(matches!(servico.visao().await, Err(AppError::RascunhoNaoAberto)));

        let erro = servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::RascunhoNaoAberto));
        assert!(matches!(servico.salvar().await, Err(AppError::RascunhoNaoAberto)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(matches!(store.get(id).await, Err(AppError::InspecaoNaoEncontrada(_))));
        assert_eq!(store.gravacoes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn excluir_outra_inspecao_mantem_o_rascunho_aberto() {
        let store = Arc::new(MemoriaStore::default());
        let outra = store.semear(Inspecao::nova());
        let servico = montar(store.clone());

        servico.novo().await;
        servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme"));
                Ok(())
            })
            .await
            .unwrap();
        servico.salvar().await.unwrap();
        let aberta = servico.visao().await.unwrap();

        servico.excluir(outra).await.unwrap();

        assert!(matches!(store.get(outra).await, Err(AppError::InspecaoNaoEncontrada(_))));
        let depois = servico.visao().await.unwrap();
        assert_eq!(depois.geracao(), aberta.geracao());

        servico
            .mutar(|s| {
                s.atualizar_empresa(empresa("Acme Ltda"));
                Ok(())
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.gravacoes(), 2);
        let id = depois.id().unwrap();
        assert_eq!(store.get(id).await.unwrap().nome_empresa(), Some("Acme Ltda"));
    }
}
