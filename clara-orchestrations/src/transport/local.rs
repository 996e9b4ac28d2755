//! In-process transport
//!
//! Routes published messages to local subscriptions whose proxy address and
//! topic match, keeps a registrar table for discovery queries and answers
//! synchronous requests from scripted responders. Every call and published
//! message is recorded so callers can inspect exactly what would reach a real
//! broker.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use clara_models::{ComponentDescriptor, ProxyAddress, RegistrationRecord, Topic, DEFAULT_POOL_SIZE};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error};

use super::{ListenerHandle, Message, MessageCallback, Transport, TransportError};

/// Produces the reply to a synchronous request, or `None` to stay silent
pub type Responder = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// A message as it was handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub target: ComponentDescriptor,
    pub message: Message,
    pub sync: bool,
}

struct Subscription {
    address: ProxyAddress,
    topic: Topic,
    active: Arc<AtomicBool>,
    queue: mpsc::UnboundedSender<Message>,
}

struct Inner {
    workers: Arc<Semaphore>,
    next_id: AtomicU64,
    calls: AtomicUsize,
    reject_subscriptions: AtomicBool,
    reject_unsubscribes: AtomicBool,
    subscriptions: Mutex<HashMap<u64, Subscription>>,
    published: Mutex<Vec<Published>>,
    registrations: Mutex<Vec<RegistrationRecord>>,
    responders: Mutex<Vec<(Topic, Responder)>>,
}

#[derive(Clone)]
pub struct LocalTransport {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking holder cannot leave these tables half-updated
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl LocalTransport {
    /// `pool_size` bounds how many callbacks run at the same time
    pub fn new(pool_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                workers: Arc::new(Semaphore::new(pool_size.max(1))),
                next_id: AtomicU64::new(1),
                calls: AtomicUsize::new(0),
                reject_subscriptions: AtomicBool::new(false),
                reject_unsubscribes: AtomicBool::new(false),
                subscriptions: Mutex::new(HashMap::new()),
                published: Mutex::new(Vec::new()),
                registrations: Mutex::new(Vec::new()),
                responders: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of calls made through the [`Transport`] trait
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Every message published so far, oldest first
    pub fn published(&self) -> Vec<Published> {
        lock(&self.inner.published).clone()
    }

    pub fn last_published(&self) -> Option<Published> {
        lock(&self.inner.published).last().cloned()
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.inner.subscriptions).len()
    }

    /// Adds an entry to the registrar table
    pub fn register(&self, record: RegistrationRecord) {
        lock(&self.inner.registrations).push(record);
    }

    /// Replies to synchronous requests published on topics under `topic`
    pub fn respond_with<F>(&self, topic: Topic, responder: F)
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        lock(&self.inner.responders).push((topic, Arc::new(responder)));
    }

    /// Makes every following subscribe call fail
    pub fn reject_subscriptions(&self, reject: bool) {
        self.inner.reject_subscriptions.store(reject, Ordering::SeqCst);
    }

    /// Makes every following unsubscribe call fail, leaving the listener live
    pub fn reject_unsubscribes(&self, reject: bool) {
        self.inner.reject_unsubscribes.store(reject, Ordering::SeqCst);
    }

    /// Delivers `message` as if a remote actor had published it through `address`
    pub fn inject(&self, address: &ProxyAddress, message: Message) -> usize {
        self.route(address, &message)
    }

    fn record_call(&self) {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn route(&self, address: &ProxyAddress, message: &Message) -> usize {
        let subscriptions = lock(&self.inner.subscriptions);
        let mut delivered = 0;
        for subscription in subscriptions.values() {
            if &subscription.address == address
                && subscription.topic.is_parent_of(&message.topic)
                && subscription.queue.send(message.clone()).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    fn spawn_worker(
        &self,
        id: u64,
        topic: Topic,
        active: Arc<AtomicBool>,
        callback: MessageCallback,
    ) -> mpsc::UnboundedSender<Message> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let workers = self.inner.workers.clone();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let Ok(_permit) = workers.acquire().await else {
                    break;
                };
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                let callback = callback.clone();
                if catch_unwind(AssertUnwindSafe(|| callback(message))).is_err() {
                    error!(subscription = id, topic = %topic, "Listener callback panicked");
                }
            }
            debug!(subscription = id, topic = %topic, "Listener worker stopped");
        });

        tx
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn publish(&self, target: &ComponentDescriptor, message: Message) -> Result<(), TransportError> {
        self.record_call();
        let delivered = self.route(&target.address(), &message);
        debug!(
            target_name = target.canonical_name(),
            topic = %message.topic,
            delivered,
            "Published message"
        );
        lock(&self.inner.published).push(Published {
            target: target.clone(),
            message,
            sync: false,
        });
        Ok(())
    }

    async fn sync_publish(
        &self,
        target: &ComponentDescriptor,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, TransportError> {
        self.record_call();
        self.route(&target.address(), &message);

        let reply = {
            let responders = lock(&self.inner.responders);
            responders
                .iter()
                .find(|(topic, _)| topic.is_parent_of(&message.topic))
                .map(|(_, responder)| responder.clone())
        }
        .and_then(|responder| responder(&message));

        debug!(
            target_name = target.canonical_name(),
            topic = %message.topic,
            answered = reply.is_some(),
            "Published synchronous request"
        );
        lock(&self.inner.published).push(Published {
            target: target.clone(),
            message,
            sync: true,
        });

        match reply {
            Some(reply) => Ok(reply),
            None => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout { timeout })
            }
        }
    }

    async fn subscribe(
        &self,
        target: &ComponentDescriptor,
        topic: &Topic,
        callback: MessageCallback,
    ) -> Result<ListenerHandle, TransportError> {
        self.record_call();
        if self.inner.reject_subscriptions.load(Ordering::SeqCst) {
            return Err(TransportError::Subscribe(format!(
                "{} refused subscription to {}",
                target.address(),
                topic
            )));
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let active = Arc::new(AtomicBool::new(true));
        let queue = self.spawn_worker(id, topic.clone(), active.clone(), callback);

        lock(&self.inner.subscriptions).insert(
            id,
            Subscription {
                address: target.address(),
                topic: topic.clone(),
                active,
                queue,
            },
        );
        Ok(ListenerHandle::new(id, topic.clone()))
    }

    async fn unsubscribe(&self, handle: ListenerHandle) -> Result<(), TransportError> {
        self.record_call();
        if self.inner.reject_unsubscribes.load(Ordering::SeqCst) {
            return Err(TransportError::Io(format!("failed to cancel listener {}", handle)));
        }
        if let Some(subscription) = lock(&self.inner.subscriptions).remove(&handle.id()) {
            // dropping the sender ends the worker once queued messages are skipped
            subscription.active.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn query_registrant_names(
        &self,
        _registrar: &ComponentDescriptor,
        pattern: &Topic,
    ) -> Result<String, TransportError> {
        self.record_call();
        let names: BTreeSet<String> = lock(&self.inner.registrations)
            .iter()
            .filter(|record| pattern.is_parent_of(&record.topic))
            .map(|record| record.name.clone())
            .collect();
        Ok(names.into_iter().collect::<Vec<_>>().join(" "))
    }

    async fn query_registration_records(
        &self,
        _registrar: &ComponentDescriptor,
        pattern: &Topic,
    ) -> Result<HashSet<RegistrationRecord>, TransportError> {
        self.record_call();
        Ok(lock(&self.inner.registrations)
            .iter()
            .filter(|record| pattern.is_parent_of(&record.topic))
            .cloned()
            .collect())
    }
}
