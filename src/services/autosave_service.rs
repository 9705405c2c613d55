// src/services/autosave_service.rs
//
// Salvamento automático com atraso (debounce), sensível à conexão.
// `CoordenadorAutosave` é a máquina de estados, com o relógio injetado;
// `AutosaveHandle` a executa numa tarefa tokio e recebe os comandos.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::InspecaoStore,
    models::inspecao::InspecaoId,
    services::rascunho::SessaoRascunho,
};

/// O único rascunho aberto, compartilhado entre a API e o coordenador.
pub type RascunhoCompartilhado = Arc<Mutex<Option<SessaoRascunho>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    /// Depois de uma alteração, espera este tempo antes de salvar.
    /// Novas alterações reiniciam a contagem.
    pub debounce_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 2500 }
    }
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoAutosave {
    Ocioso,
    Agendado { prazo: Instant },
    Salvando,
}

/// O que a interface mostra sobre o último salvamento.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "estado", rename_all = "camelCase")]
pub enum StatusSalvamento {
    Ocioso,
    Salvando,
    Salvo { id: InspecaoId, em: DateTime<Utc> },
    Erro { mensagem: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gatilho {
    Autosave,
    Explicito,
    Reconexao,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "resultado", rename_all = "camelCase")]
pub enum ResultadoSalvamento {
    Salvo { id: InspecaoId },
    // Empresa ainda sem nome: nada foi gravado.
    Ignorado,
}

pub struct CoordenadorAutosave {
    store: Arc<dyn InspecaoStore>,
    rascunho: RascunhoCompartilhado,
    config: AutoSaveConfig,
    estado: EstadoAutosave,
    online: bool,
    status: watch::Sender<StatusSalvamento>,
}

impl CoordenadorAutosave {
    pub fn new(
        store: Arc<dyn InspecaoStore>,
        rascunho: RascunhoCompartilhado,
        config: AutoSaveConfig,
        online: bool,
    ) -> Self {
        let (status, _) = watch::channel(StatusSalvamento::Ocioso);
        Self {
            store,
            rascunho,
            config,
            estado: EstadoAutosave::Ocioso,
            online,
            status,
        }
    }

    pub fn status(&self) -> watch::Receiver<StatusSalvamento> {
        self.status.subscribe()
    }

    pub fn estado(&self) -> EstadoAutosave {
        self.estado
    }

    pub fn prazo(&self) -> Option<Instant> {
        match self.estado {
            EstadoAutosave::Agendado { prazo } => Some(prazo),
            _ => None,
        }
    }

    // Só rascunhos que já foram salvos uma vez (com id) entram no automático.
    async fn elegivel(&self) -> bool {
        self.rascunho
            .lock()
            .await
            .as_ref()
            .is_some_and(|sessao| sessao.id().is_some())
    }

    /// Rearma o prazo único a partir de `agora`, descartando o anterior.
    pub async fn agendar(&mut self, agora: Instant) {
        if !self.elegivel().await {
            tracing::debug!("rascunho ainda não salvo: salvamento automático ignorado");
            return;
        }
        let prazo = agora + self.config.debounce();
        self.estado = EstadoAutosave::Agendado { prazo };
        tracing::debug!(atraso_ms = self.config.debounce_ms, "salvamento automático agendado");
    }

    pub fn cancelar(&mut self) {
        if let EstadoAutosave::Agendado { .. } = self.estado {
            self.estado = EstadoAutosave::Ocioso;
        }
    }

    /// Salva se o prazo venceu. `None` quando nada foi tentado.
    pub async fn disparar(&mut self, agora: Instant) -> Option<Result<ResultadoSalvamento, AppError>> {
        match self.estado {
            EstadoAutosave::Agendado { prazo } if agora >= prazo => {}
            _ => return None,
        }
        self.estado = EstadoAutosave::Ocioso;

        // O rascunho pode ter sido trocado por um novo desde o agendamento.
        if !self.elegivel().await {
            return None;
        }
        Some(self.persistir(Gatilho::Autosave).await)
    }

    /// Salvamento explícito ("salvar e continuar/sair"): ignora o atraso.
    pub async fn salvar_agora(&mut self) -> Result<ResultadoSalvamento, AppError> {
        self.cancelar();
        self.persistir(Gatilho::Explicito).await
    }

    /// Ao voltar a conexão, grava na hora o que se acumulou offline.
    pub async fn conectividade_alterada(&mut self, online: bool) -> Option<Result<ResultadoSalvamento, AppError>> {
        let reconectou = online && !self.online;
        self.online = online;

        if !online {
            tracing::info!("📴 Sem conexão: salvando apenas no banco local, em silêncio");
            return None;
        }
        if !reconectou || !self.elegivel().await {
            return None;
        }

        tracing::info!("📶 Conexão restabelecida: salvando o rascunho aberto");
        self.cancelar();
        Some(self.persistir(Gatilho::Reconexao).await)
    }

    async fn persistir(&mut self, gatilho: Gatilho) -> Result<ResultadoSalvamento, AppError> {
        // Offline o automático grava sem mostrar indicador de "salvando".
        let visivel = gatilho == Gatilho::Explicito || self.online;

        let (geracao, retrato) = {
            let mut guarda = self.rascunho.lock().await;
            let sessao = guarda.as_mut().ok_or(AppError::RascunhoNaoAberto)?;
            if !sessao.inspecao().pode_persistir() {
                tracing::debug!(?gatilho, "empresa sem nome: nada a salvar");
                return Ok(ResultadoSalvamento::Ignorado);
            }
            sessao.carimbar(Utc::now());
            (sessao.geracao(), sessao.inspecao().clone())
        };

        self.estado = EstadoAutosave::Salvando;
        if visivel {
            self.status.send_replace(StatusSalvamento::Salvando);
        }

        let resultado = self.store.put(&retrato).await;
        self.estado = EstadoAutosave::Ocioso;

        match resultado {
            Ok(id) => {
                if retrato.id.is_none() {
                    let mut guarda = self.rascunho.lock().await;
                    if let Some(sessao) = guarda.as_mut().filter(|s| s.geracao() == geracao) {
                        sessao.atribuir_id(id);
                    }
                }
                tracing::info!(%id, ?gatilho, "✅ Inspeção salva");
                if visivel {
                    self.status.send_replace(StatusSalvamento::Salvo {
                        id,
                        em: retrato.updated_at,
                    });
                }
                Ok(ResultadoSalvamento::Salvo { id })
            }
            Err(e) => {
                // O rascunho em memória fica como está; a próxima tentativa leva tudo.
                tracing::error!(erro = %e, ?gatilho, "🔥 Falha ao salvar inspeção");
                self.status.send_replace(StatusSalvamento::Erro {
                    mensagem: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

// =============================================================================
//  TAREFA EM SEGUNDO PLANO
// =============================================================================

enum Comando {
    Agendar,
    Cancelar,
    // Cancela e responde quando não houver gravação em curso.
    Descartar(oneshot::Sender<()>),
    SalvarAgora(oneshot::Sender<Result<ResultadoSalvamento, AppError>>),
}

/// Ponta de envio para o coordenador. Uma tarefa só consome os comandos,
/// então nunca há duas gravações em andamento ao mesmo tempo.
#[derive(Clone)]
pub struct AutosaveHandle {
    comandos: mpsc::UnboundedSender<Comando>,
    status: watch::Receiver<StatusSalvamento>,
}

impl AutosaveHandle {
    pub fn iniciar(coordenador: CoordenadorAutosave, conectividade: watch::Receiver<bool>) -> Self {
        let status = coordenador.status();
        let (comandos, receptor) = mpsc::unbounded_channel();
        tokio::spawn(executar(coordenador, receptor, conectividade));
        Self { comandos, status }
    }

    pub fn agendar(&self) {
        if self.comandos.send(Comando::Agendar).is_err() {
            tracing::warn!("coordenador de salvamento encerrado; alteração não agendada");
        }
    }

    pub fn cancelar(&self) {
        if self.comandos.send(Comando::Cancelar).is_err() {
            tracing::warn!("coordenador de salvamento encerrado; cancelamento não entregue");
        }
    }

    /// Como `cancelar`, mas só retorna depois que o coordenador processou o pedido.
    pub async fn descartar_pendente(&self) {
        let (resposta, receptor) = oneshot::channel();
        if self.comandos.send(Comando::Descartar(resposta)).is_err() || receptor.await.is_err() {
            tracing::warn!("coordenador de salvamento encerrado; descarte não confirmado");
        }
    }

    pub async fn salvar_agora(&self) -> Result<ResultadoSalvamento, AppError> {
        let (resposta, receptor) = oneshot::channel();
        self.comandos
            .send(Comando::SalvarAgora(resposta))
            .map_err(|_| anyhow::anyhow!("coordenador de salvamento encerrado"))?;
        receptor
            .await
            .map_err(|_| anyhow::anyhow!("coordenador de salvamento não respondeu"))?
    }

    pub fn status(&self) -> StatusSalvamento {
        self.status.borrow().clone()
    }
}

async fn executar(
    mut coordenador: CoordenadorAutosave,
    mut comandos: mpsc::UnboundedReceiver<Comando>,
    mut conectividade: watch::Receiver<bool>,
) {
    let mut ouvindo_conectividade = true;

    loop {
        let prazo = coordenador.prazo();

        tokio::select! {
            comando = comandos.recv() => match comando {
                Some(Comando::Agendar) => coordenador.agendar(Instant::now()).await,
                Some(Comando::Cancelar) => coordenador.cancelar(),
                Some(Comando::Descartar(resposta)) => {
                    coordenador.cancelar();
                    let _ = resposta.send(());
                }
                Some(Comando::SalvarAgora(resposta)) => {
                    let resultado = coordenador.salvar_agora().await;
                    let _ = resposta.send(resultado);
                }
                None => break,
            },
            _ = tokio::time::sleep_until(prazo.unwrap_or_else(Instant::now)), if prazo.is_some() => {
                // Falhas já foram registradas e publicadas no status.
                let _ = coordenador.disparar(Instant::now()).await;
            }
            mudanca = conectividade.changed(), if ouvindo_conectividade => match mudanca {
                Ok(()) => {
                    let online = *conectividade.borrow_and_update();
                    let _ = coordenador.conectividade_alterada(online).await;
                }
                Err(_) => ouvindo_conectividade = false,
            },
        }
    }

    tracing::debug!(estado = ?coordenador.estado(), "coordenador de salvamento automático encerrado");
}
