use async_trait::async_trait;

use super::{RequestHandler, Service};

#[derive(Clone, Copy, Debug)]
pub enum NotificationKind {
    CoinsFrozen,
    AccountSuspended,
    AccountBanned,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub account_id: String,
    pub kind: NotificationKind,
    pub message: String,
}

/// Delivery itself (push/email/SMS) happens in an external system; this
/// actor records the request and is the seam where that system plugs in.
#[derive(Clone)]
pub struct NotificationHandler;

impl NotificationHandler {
    pub fn new() -> Self {
        NotificationHandler {}
    }
}

#[async_trait]
impl RequestHandler<Notification> for NotificationHandler {
    async fn handle_request(&self, notification: Notification) {
        log::info!(
            "Notifying account {} ({:?}): {}",
            notification.account_id,
            notification.kind,
            notification.message
        );
    }
}

pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        NotificationService {}
    }
}

#[async_trait]
impl Service<Notification, NotificationHandler> for NotificationService {}
