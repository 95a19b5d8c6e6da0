//! End-to-end subscribe/publish scenarios exercising the dispatcher,
//! publication manager, and subscription manager together.

use async_trait::async_trait;
use rpcbus::config::RpcConfig;
use rpcbus::dispatch::Dispatcher;
use rpcbus::error::RpcError;
use rpcbus::message::{
    Envelope, MessageFactory, MessagingQos, RpcValue, SubscriptionQos, SubscriptionRequest,
    SubscriptionStop,
};
use rpcbus::participant::ParticipantId;
use rpcbus::provider::{EnvelopeSender, RequestCaller, SendHandle};
use rpcbus::publication::SystemClock;
use rpcbus::subscription::{Listener, SubscriptionManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct CapturingSender {
    envelopes: Mutex<Vec<Envelope>>,
}

impl CapturingSender {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            envelopes: Mutex::new(Vec::new()),
        })
    }

    async fn len(&self) -> usize {
        self.envelopes.lock().await.len()
    }
}

#[async_trait]
impl EnvelopeSender for CapturingSender {
    async fn send(&self, envelope: Envelope) {
        self.envelopes.lock().await.push(envelope);
    }
}

struct CountingLocationCaller {
    getter_calls: AtomicUsize,
}

impl CountingLocationCaller {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            getter_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RequestCaller for CountingLocationCaller {
    async fn invoke(
        &self,
        _operation_name: &str,
        _params: Vec<RpcValue>,
        _param_datatypes: Vec<String>,
    ) -> Result<Vec<RpcValue>, RpcError> {
        Ok(vec![])
    }

    async fn get_attribute(&self, _attribute_name: &str) -> Result<Vec<RpcValue>, RpcError> {
        self.getter_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RpcValue::F64(52.5), RpcValue::F64(13.4)])
    }
}

fn dispatcher(sender: Arc<CapturingSender>) -> Dispatcher {
    let config = RpcConfig::default();
    Dispatcher::new(&config, SendHandle::new(sender), Arc::new(SystemClock))
}

fn subscription_request(period: Duration) -> SubscriptionRequest {
    SubscriptionRequest {
        subscription_id: rpcbus::subscription::SubscriptionId::generate(),
        subscribe_to_name: "location".into(),
        qos: SubscriptionQos::periodic(period, None, None).unwrap(),
    }
}

/// E1 — provider already registered, consumer sends a SubscriptionRequest;
/// the getter must be invoked at least once within 1000 ms.
#[tokio::test]
async fn e1_subscribe_and_poll() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();
    let caller = CountingLocationCaller::new();
    dispatcher.add_request_caller(provider.clone(), Arc::clone(&caller) as Arc<dyn RequestCaller>);

    let request = subscription_request(Duration::from_millis(20));
    let envelope =
        MessageFactory::create_subscription_request(consumer, provider, &MessagingQos::default(), &request).unwrap();
    dispatcher.receive(envelope);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(caller.getter_calls.load(Ordering::SeqCst) >= 1);
}

struct RecordingListener {
    received: Mutex<Vec<Vec<RpcValue>>>,
    errors: AtomicUsize,
}

impl RecordingListener {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
            errors: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn on_receive(&self, response: Vec<RpcValue>) {
        self.received.lock().await.push(response);
    }
    async fn on_error(&self, _error: RpcError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// E2 — a registered callback receives exactly one `on_receive` call for a
/// single publication, with no duplicate delivery shortly after.
#[tokio::test]
async fn e2_publication_delivery() {
    let manager = SubscriptionManager::new();
    let listener = RecordingListener::new();
    let request = manager.register_subscription(
        "location",
        Arc::clone(&listener) as Arc<dyn Listener>,
        SubscriptionQos::on_change(Duration::from_millis(100), None),
    );

    manager
        .deliver(rpcbus::message::SubscriptionPublication::success(
            request.subscription_id,
            vec![RpcValue::F64(48.1), RpcValue::F64(11.5)],
        ))
        .await;

    tokio::time::sleep(Duration::from_millis(250)).await;
    let received = listener.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(listener.errors.load(Ordering::SeqCst), 0);
}

/// E3 — an enum-shaped publication (modeled as an `RpcValue::Str` tag) is
/// delivered exactly once, same as any other payload shape.
#[tokio::test]
async fn e3_enum_publication() {
    let manager = SubscriptionManager::new();
    let listener = RecordingListener::new();
    let request = manager.register_subscription(
        "status",
        Arc::clone(&listener) as Arc<dyn Listener>,
        SubscriptionQos::on_change(Duration::from_millis(100), None),
    );

    manager
        .deliver(rpcbus::message::SubscriptionPublication::success(
            request.subscription_id,
            vec![RpcValue::Str("ZERO".into())],
        ))
        .await;

    let received = listener.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], vec![RpcValue::Str("ZERO".into())]);
}

/// E4 — a SubscriptionRequest arrives before the provider is registered;
/// once `add_request_caller` runs, the getter fires within the window.
#[tokio::test]
async fn e4_deferred_activation() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();

    let request = subscription_request(Duration::from_millis(20));
    let envelope =
        MessageFactory::create_subscription_request(consumer, provider.clone(), &MessagingQos::default(), &request)
            .unwrap();
    dispatcher.receive(envelope);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let caller = CountingLocationCaller::new();
    dispatcher.add_request_caller(provider, Arc::clone(&caller) as Arc<dyn RequestCaller>);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(caller.getter_calls.load(Ordering::SeqCst) >= 1);
}

/// E5 — removing the provider's caller stops further periodic ticks.
#[tokio::test]
async fn e5_caller_removal_stops_publications() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();
    let caller = CountingLocationCaller::new();
    dispatcher.add_request_caller(provider.clone(), Arc::clone(&caller) as Arc<dyn RequestCaller>);

    let request = subscription_request(Duration::from_millis(100));
    let envelope =
        MessageFactory::create_subscription_request(consumer, provider.clone(), &MessagingQos::default(), &request)
            .unwrap();
    dispatcher.receive(envelope);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let calls_before = caller.getter_calls.load(Ordering::SeqCst);
    assert!(calls_before >= 2);

    dispatcher.remove_request_caller(&provider);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let calls_after = caller.getter_calls.load(Ordering::SeqCst);
    assert!(calls_after - calls_before < 2);
}

/// E6 — identical to E5 but termination is via a SubscriptionStop
/// envelope rather than caller removal.
#[tokio::test]
async fn e6_stop_message_halts_publications() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();
    let caller = CountingLocationCaller::new();
    dispatcher.add_request_caller(provider.clone(), Arc::clone(&caller) as Arc<dyn RequestCaller>);

    let request = subscription_request(Duration::from_millis(100));
    let subscription_id = request.subscription_id;
    let envelope =
        MessageFactory::create_subscription_request(consumer.clone(), provider.clone(), &MessagingQos::default(), &request)
            .unwrap();
    dispatcher.receive(envelope);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let calls_before = caller.getter_calls.load(Ordering::SeqCst);
    assert!(calls_before >= 2);

    let stop = SubscriptionStop { subscription_id };
    let stop_envelope =
        MessageFactory::create_subscription_stop(consumer, provider, &MessagingQos::default(), &stop).unwrap();
    dispatcher.receive(stop_envelope);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let calls_after = caller.getter_calls.load(Ordering::SeqCst);
    assert!(calls_after - calls_before < 2);
}

/// Invariant 1 — expired envelopes produce no side effects at all.
#[tokio::test]
async fn expired_envelopes_are_dropped_without_side_effects() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();

    let request = rpcbus::message::Request::new("noop", vec![], vec![]);
    let mut envelope =
        MessageFactory::create_request(consumer, provider, &MessagingQos::default(), &request).unwrap();
    envelope.expiry_date_ms = 1;
    dispatcher.receive(envelope);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sender.len().await, 0);
}

/// Invariant 7 — a request whose interpreter returns value V produces a
/// reply whose decoded response equals V.
#[tokio::test]
async fn request_reply_round_trip_preserves_value() {
    struct EchoCaller;
    #[async_trait]
    impl RequestCaller for EchoCaller {
        async fn invoke(
            &self,
            _operation_name: &str,
            params: Vec<RpcValue>,
            _param_datatypes: Vec<String>,
        ) -> Result<Vec<RpcValue>, RpcError> {
            Ok(params)
        }
        async fn get_attribute(&self, _attribute_name: &str) -> Result<Vec<RpcValue>, RpcError> {
            Ok(vec![])
        }
    }

    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();
    dispatcher.add_request_caller(provider.clone(), Arc::new(EchoCaller));

    let value = vec![RpcValue::Str("hello".into()), RpcValue::I64(9)];
    let request = rpcbus::message::Request::new("echo", value.clone(), vec!["string".into(), "i64".into()]);
    let envelope =
        MessageFactory::create_request(consumer, provider, &MessagingQos::default(), &request).unwrap();
    dispatcher.receive(envelope);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let sent = sender.envelopes.lock().await;
    assert_eq!(sent.len(), 1);
    let reply: rpcbus::message::Reply = serde_json::from_slice(&sent[0].payload).unwrap();
    match reply.body {
        rpcbus::message::ReplyBody::Response(response) => assert_eq!(response, value),
        rpcbus::message::ReplyBody::Error(err) => panic!("unexpected error: {err:?}"),
    }
}

/// Invariant 9 — `remove_request_caller` followed shortly by what would
/// have been a periodic tick produces no outbound publication for that
/// provider.
#[tokio::test]
async fn removed_caller_yields_no_publication_on_next_tick() {
    let sender = CapturingSender::new();
    let dispatcher = dispatcher(Arc::clone(&sender));
    let provider = ParticipantId::new("provider-1").unwrap();
    let consumer = ParticipantId::new("consumer-1").unwrap();
    let caller = CountingLocationCaller::new();
    dispatcher.add_request_caller(provider.clone(), Arc::clone(&caller) as Arc<dyn RequestCaller>);

    let request = subscription_request(Duration::from_millis(50));
    let envelope =
        MessageFactory::create_subscription_request(consumer, provider.clone(), &MessagingQos::default(), &request)
            .unwrap();
    dispatcher.receive(envelope);
    tokio::time::sleep(Duration::from_millis(75)).await;

    dispatcher.remove_request_caller(&provider);
    let calls_at_removal = caller.getter_calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(caller.getter_calls.load(Ordering::SeqCst), calls_at_removal);
}
