use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::repositories::ip_reputation::{HttpIpReputationResolver, IpReputationResolver};
use crate::repositories::ledger::{LedgerStore, PgLedgerStore};
use crate::repositories::signals::{PgSignalStore, SignalStore};
use crate::settings::Settings;

pub mod detectors;
pub mod events;
pub mod http;
pub mod ledger;
pub mod notifications;
pub mod risk;

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let ledger_store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool.clone()));
    let signal_store: Arc<dyn SignalStore> = Arc::new(PgSignalStore::new(pool));
    let resolver: Arc<dyn IpReputationResolver> = Arc::new(HttpIpReputationResolver::new(
        settings.ip_reputation.url.clone(),
        Duration::from_millis(settings.ip_reputation.timeout_ms),
    )?);

    let (ledger_tx, mut ledger_rx) = mpsc::channel(512);
    let (risk_tx, mut risk_rx) = mpsc::channel(512);
    let (event_tx, mut event_rx) = mpsc::channel(512);
    let (notification_tx, mut notification_rx) = mpsc::channel(512);

    let publisher = events::EventPublisher::new(event_tx);

    log::info!("Starting event relay.");
    let mut event_service = events::EventRelayService::new();
    tokio::spawn(async move {
        event_service
            .run(events::EventRelayHandler::new(), &mut event_rx)
            .await;
    });

    log::info!("Starting notification service.");
    let mut notification_service = notifications::NotificationService::new();
    tokio::spawn(async move {
        notification_service
            .run(notifications::NotificationHandler::new(), &mut notification_rx)
            .await;
    });

    log::info!("Starting ledger service.");
    let mut ledger_service = ledger::LedgerService::new();
    let ledger_handler = ledger::LedgerRequestHandler::new(
        ledger_store.clone(),
        publisher.clone(),
        Arc::new(settings.rewards.clone()),
    );
    tokio::spawn(async move {
        ledger_service.run(ledger_handler, &mut ledger_rx).await;
    });

    log::info!("Starting risk service.");
    let mut risk_service = risk::RiskService::new();
    let risk_handler = risk::RiskRequestHandler::new(
        ledger_store,
        signal_store,
        resolver,
        publisher,
        notification_tx,
        Arc::new(settings.risk.clone()),
    );
    tokio::spawn(async move {
        risk_service.run(risk_handler, &mut risk_rx).await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.http.bind, ledger_tx, risk_tx).await?;

    Ok(())
}
