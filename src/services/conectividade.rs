// src/services/conectividade.rs

use tokio::sync::watch;

/// Sinal de conexão informado pela interface. Quem assina recebe só as mudanças.
#[derive(Clone)]
pub struct SinalConectividade {
    online: watch::Sender<bool>,
}

impl SinalConectividade {
    pub fn new(online: bool) -> Self {
        let (online, _) = watch::channel(online);
        Self { online }
    }

    /// Retorna `true` quando o valor mudou.
    pub fn definir_online(&self, online: bool) -> bool {
        let mudou = self.online.send_if_modified(|atual| {
            if *atual == online {
                return false;
            }
            *atual = online;
            true
        });
        if mudou {
            tracing::info!(online, "Conectividade alterada");
        }
        mudou
    }

    pub fn online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn assinar(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assinante_so_acorda_quando_o_valor_muda() {
        let sinal = SinalConectividade::new(true);
        let mut rx = sinal.assinar();

        assert!(!sinal.definir_online(true));
        assert!(!rx.has_changed().unwrap());

        assert!(sinal.definir_online(false));
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
        assert!(!sinal.online());
    }
}
