//! Subscription registry for background listeners
//!
//! Each listener is keyed by `<host>#<topic>`. At most one listener may exist
//! per key; a second `listen` on a live key fails and leaves the first one in
//! place. Entries are only inserted after the transport accepted the
//! subscription, so a failed subscribe never leaves a dangling key behind.

use std::collections::HashMap;
use std::sync::Arc;

use clara_models::{ComponentDescriptor, ReportKind, Topic};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::topics::subscription_key;
use crate::transport::{ListenerHandle, Message, MessageCallback, Transport};
use crate::types::{DataTypeSet, EngineData};

pub struct SubscriptionRegistry {
    transport: Arc<dyn Transport>,
    entries: Mutex<HashMap<String, ListenerHandle>>,
}

impl SubscriptionRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes `callback` to `topic` through the proxy of `target`
    ///
    /// Returns the subscription key, which is also what [`Self::contains`]
    /// expects.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use clara_models::{ComponentDescriptor, DpeName, ClaraLang, Topic};
    /// use clara_orchestrations::registry::SubscriptionRegistry;
    /// use clara_orchestrations::transport::{LocalTransport, MessageCallback};
    ///
    /// # async fn run() -> clara_orchestrations::Result<()> {
    /// let registry = SubscriptionRegistry::new(Arc::new(LocalTransport::default()));
    /// let dpe = DpeName::new("10.1.1.1", ClaraLang::Java)?;
    /// let callback: MessageCallback = Arc::new(|message: clara_orchestrations::transport::Message| println!("{:?}", message));
    /// let key = registry
    ///     .listen(&ComponentDescriptor::dpe(&dpe), Topic::build("dpe-alive"), callback)
    ///     .await?;
    /// assert_eq!(key, "10.1.1.1#dpe-alive");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn listen(
        &self,
        target: &ComponentDescriptor,
        topic: Topic,
        callback: MessageCallback,
    ) -> Result<String> {
        let key = subscription_key(target.host(), &topic);

        // held across subscribe so two listens on one key cannot both pass the check
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&key) {
            return Err(Error::DuplicateSubscription { key });
        }

        let handle = self
            .transport
            .subscribe(target, &topic, callback)
            .await?;
        info!(key = %key, handle = %handle, "Listening");
        entries.insert(key.clone(), handle);

        Ok(key)
    }

    /// Cancels the listener for `topic`; does nothing when there is none
    ///
    /// The entry stays registered when the transport fails to cancel it, so
    /// the call can be retried and the key stays taken.
    pub async fn unlisten(&self, target: &ComponentDescriptor, topic: &Topic) -> Result<()> {
        let key = subscription_key(target.host(), topic);

        let mut entries = self.entries.lock().await;
        let Some(handle) = entries.get(&key) else {
            return Ok(());
        };
        self.transport.unsubscribe(handle.clone()).await?;
        entries.remove(&key);
        info!(key = %key, "Stopped listening");

        Ok(())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

/// Wraps a report callback so it only sees `expected` reports
///
/// Reports of another kind are dropped silently: several listeners may share
/// one multiplexed feed. Payloads that cannot be decoded are dropped with a
/// warning.
pub fn report_callback<F>(expected: ReportKind, data_types: DataTypeSet, callback: F) -> MessageCallback
where
    F: Fn(EngineData) + Send + Sync + 'static,
{
    Arc::new(move |message: Message| {
        if message.meta.report != Some(expected) {
            return;
        }
        match data_types.deserialize(&message.meta.mime_type, &message.data) {
            Ok(value) => {
                let mut data = EngineData::new(message.meta.mime_type, value)
                    .with_description(message.meta.description);
                if let ReportKind::Status(status) = expected {
                    data.status = Some(status);
                }
                callback(data);
            }
            Err(e) => {
                warn!(topic = %message.topic, kind = %expected, error = %e, "Dropping undecodable report");
            }
        }
    })
}

/// Wraps a callback for text broadcasts such as DPE liveness reports
pub fn text_callback<F>(callback: F) -> MessageCallback
where
    F: Fn(String) + Send + Sync + 'static,
{
    Arc::new(move |message: Message| match message.as_text() {
        Some(text) => callback(text.to_string()),
        None => {
            warn!(topic = %message.topic, mime_type = %message.meta.mime_type, "Dropping non-text report");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::report_topic;
    use crate::transport::{LocalTransport, MessageMeta, TransportError};
    use crate::types::mime;
    use clara_models::{EngineStatus, ServiceName};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn service() -> ServiceName {
        "10.1.1.1_java:master:engine1".parse().unwrap()
    }

    fn report(kind: ReportKind, body: &str) -> Message {
        Message::new(
            report_topic(kind, &service()),
            MessageMeta {
                mime_type: mime::STRING.to_string(),
                report: Some(kind),
                ..MessageMeta::default()
            },
            body.as_bytes().to_vec(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_listen_is_rejected() {
        let transport = Arc::new(LocalTransport::default());
        let registry = SubscriptionRegistry::new(transport.clone());
        let target = ComponentDescriptor::service(&service());
        let topic = report_topic(ReportKind::Done, &service());

        registry.listen(&target, topic.clone(), Arc::new(|_: Message| {})).await.unwrap();
        let result = registry.listen(&target, topic.clone(), Arc::new(|_: Message| {})).await;

        assert!(matches!(result, Err(Error::DuplicateSubscription { .. })));
        assert_eq!(transport.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn test_failed_subscribe_leaves_no_entry() {
        let transport = Arc::new(LocalTransport::default());
        transport.reject_subscriptions(true);
        let registry = SubscriptionRegistry::new(transport.clone());
        let target = ComponentDescriptor::service(&service());
        let topic = report_topic(ReportKind::Data, &service());

        let result = registry.listen(&target, topic.clone(), Arc::new(|_: Message| {})).await;
        assert!(matches!(result, Err(Error::Transport(TransportError::Subscribe(_)))));
        assert!(!registry.contains(&subscription_key("10.1.1.1", &topic)).await);
    }

    #[tokio::test]
    async fn test_failed_unsubscribe_keeps_entry() {
        let transport = Arc::new(LocalTransport::default());
        let registry = SubscriptionRegistry::new(transport.clone());
        let target = ComponentDescriptor::service(&service());
        let topic = report_topic(ReportKind::Done, &service());
        let key = registry.listen(&target, topic.clone(), Arc::new(|_: Message| {})).await.unwrap();

        transport.reject_unsubscribes(true);
        let result = registry.unlisten(&target, &topic).await;
        assert!(matches!(result, Err(Error::Transport(TransportError::Io(_)))));
        assert!(registry.contains(&key).await);
        assert_eq!(transport.active_subscriptions(), 1);

        let again = registry.listen(&target, topic.clone(), Arc::new(|_: Message| {})).await;
        assert!(matches!(again, Err(Error::DuplicateSubscription { .. })));

        transport.reject_unsubscribes(false);
        registry.unlisten(&target, &topic).await.unwrap();
        assert!(!registry.contains(&key).await);
        assert_eq!(transport.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_unlisten_unknown_key_is_noop() {
        let transport = Arc::new(LocalTransport::default());
        let registry = SubscriptionRegistry::new(transport.clone());
        let target = ComponentDescriptor::service(&service());

        registry
            .unlisten(&target, &report_topic(ReportKind::Done, &service()))
            .await
            .unwrap();
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_report_callback_filters_by_kind() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = report_callback(
            ReportKind::Status(EngineStatus::Error),
            DataTypeSet::with_defaults(),
            move |data| {
                let _ = tx.send(data);
            },
        );

        callback(report(ReportKind::Status(EngineStatus::Warning), "careful"));
        callback(report(ReportKind::Status(EngineStatus::Error), "failed"));

        let data = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(data.value, serde_json::json!("failed"));
        assert_eq!(data.status, Some(EngineStatus::Error));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_report_callback_drops_unknown_types() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = report_callback(ReportKind::Data, DataTypeSet::with_defaults(), move |data| {
            let _ = tx.send(data);
        });

        let mut message = report(ReportKind::Data, "payload");
        message.meta.mime_type = "binary/evio".to_string();
        callback(message);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_text_callback_ignores_binary() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = text_callback(move |text| {
            let _ = tx.send(text);
        });

        let mut binary = Message::text(Topic::build("dpe-alive"), "x");
        binary.meta.mime_type = mime::BYTES.to_string();
        callback(binary);
        callback(Message::text(Topic::build("dpe-alive"), "10.1.1.1:7771_java alive"));

        assert_eq!(rx.try_recv().unwrap(), "10.1.1.1:7771_java alive");
        assert!(rx.try_recv().is_err());
    }
}
