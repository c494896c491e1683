//! Event dispatch.
//!
//! Holds the shared state and routes each incoming event through the
//! resolver and on to delivery.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::onebot::OneBotClient;
use crate::onebot::event::RawEvent;
use crate::welcome::{
    DeliveryReport, MemberLookup, MessageSender, Outcome, WelcomeResolver, deliver,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Welcome logic over the immutable settings.
    pub resolver: Arc<WelcomeResolver>,

    /// Member name lookup (the OneBot API in production).
    pub lookup: Arc<dyn MemberLookup>,

    /// Outbound message delivery (the OneBot API in production).
    pub sender: Arc<dyn MessageSender>,

    /// Token expected on incoming webhook requests.
    pub access_token: Option<String>,
}

impl AppState {
    /// Create a new application state backed by the OneBot API.
    pub fn new(resolver: WelcomeResolver, api: OneBotClient, access_token: Option<String>) -> Self {
        let api = Arc::new(api);
        Self::with_backends(resolver, api.clone(), api, access_token)
    }

    /// Create a state with explicit lookup and delivery backends.
    pub fn with_backends(
        resolver: WelcomeResolver,
        lookup: Arc<dyn MemberLookup>,
        sender: Arc<dyn MessageSender>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            lookup,
            sender,
            access_token,
        }
    }

    /// Handle one event end to end. Never fails; problems are logged.
    pub async fn handle_event(&self, event: RawEvent) -> Option<DeliveryReport> {
        handle_event(&self.resolver, self.lookup.as_ref(), self.sender.as_ref(), &event).await
    }
}

/// Resolve an event and deliver whatever it produces.
///
/// Returns `None` when nothing was sent.
pub async fn handle_event(
    resolver: &WelcomeResolver,
    lookup: &dyn MemberLookup,
    sender: &dyn MessageSender,
    event: &RawEvent,
) -> Option<DeliveryReport> {
    if event.is_meta() {
        trace!("Meta event: {:?}", event.meta_event_type);
        return None;
    }

    match resolver.handle(event, lookup).await {
        Outcome::Ignored(_) | Outcome::Empty { .. } => None,
        Outcome::Fragments {
            group_id,
            fragments,
        } => {
            debug!("Delivering {} welcome segment(s) to group {}", fragments.len(), group_id);
            let report = deliver(sender, group_id, &fragments).await;
            if !report.is_complete() {
                warn!(
                    "Welcome to group {} partially delivered: {} of {} segments failed",
                    group_id,
                    report.failed.len(),
                    report.total()
                );
            }
            Some(report)
        }
    }
}
