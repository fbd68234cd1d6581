// src/realtime/groups.rs

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::metrics::MetricsPush;

// Capacidade do canal de cada empresa. Receptores lentos perdem mensagens
// antigas (Lagged) — aceitável: a entrega é melhor-esforço, sem retry.
const GROUP_CHANNEL_CAPACITY: usize = 64;

// ---
// Grupos de broadcast por empresa
// ---
// O fan-out do pipeline: o agendador publica no canal da empresa e TODAS as
// conexões daquela empresa recebem. Cada conexão compara o connection_id da
// mensagem com o seu e descarta o que não for endereçado a ela.
//
// O lock nunca é segurado através de um await (operações síncronas e curtas).
#[derive(Clone, Default)]
pub struct CompanyGroups {
    inner: Arc<RwLock<HashMap<Uuid, broadcast::Sender<MetricsPush>>>>,
}

impl CompanyGroups {
    pub fn new() -> Self {
        Self::default()
    }

    // Entra no grupo da empresa (criando o canal se for a primeira conexão)
    pub fn join(&self, company_id: Uuid) -> broadcast::Receiver<MetricsPush> {
        let mut groups = self.inner.write().unwrap();
        groups
            .entry(company_id)
            .or_insert_with(|| broadcast::channel(GROUP_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    // Sai do grupo: o Receiver já foi dropado pelo chamador; aqui só
    // removemos o canal se não sobrou mais ninguém inscrito.
    pub fn leave(&self, company_id: Uuid) {
        let mut groups = self.inner.write().unwrap();
        if let Some(sender) = groups.get(&company_id) {
            if sender.receiver_count() == 0 {
                groups.remove(&company_id);
            }
        }
    }

    // Publica no grupo da empresa. Fire-and-forget: se ninguém está
    // escutando, a mensagem é simplesmente descartada.
    pub fn publish(&self, company_id: Uuid, push: MetricsPush) -> usize {
        let groups = self.inner.read().unwrap();
        match groups.get(&company_id) {
            Some(sender) => sender.send(push).unwrap_or(0),
            None => 0,
        }
    }

    pub fn group_size(&self, company_id: Uuid) -> usize {
        let groups = self.inner.read().unwrap();
        groups
            .get(&company_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::MetricsSnapshot;
    use chrono::Utc;

    fn push_for(company_id: Uuid, connection_id: &str) -> MetricsPush {
        MetricsPush {
            company_id,
            connection_id: connection_id.to_string(),
            metrics: MetricsSnapshot::zeroed(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_member_of_the_group() {
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let mut rx_a = groups.join(company);
        let mut rx_b = groups.join(company);
        assert_eq!(groups.group_size(company), 2);

        let delivered = groups.publish(company, push_for(company, "conn-a"));
        assert_eq!(delivered, 2);

        // Os dois recebem; cada um decide pelo connection_id se é para si
        assert_eq!(rx_a.recv().await.unwrap().connection_id, "conn-a");
        assert_eq!(rx_b.recv().await.unwrap().connection_id, "conn-a");
    }

    #[tokio::test]
    async fn publish_to_empty_group_is_dropped() {
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        assert_eq!(groups.publish(company, push_for(company, "conn-a")), 0);
    }

    #[tokio::test]
    async fn leave_prunes_the_channel_when_last_member_drops() {
        let groups = CompanyGroups::new();
        let company = Uuid::new_v4();

        let rx = groups.join(company);
        drop(rx);
        groups.leave(company);

        assert_eq!(groups.group_size(company), 0);
        assert_eq!(groups.publish(company, push_for(company, "conn-a")), 0);
    }
}
