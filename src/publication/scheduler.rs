//! The per-entry task that produces publications at the cadence its QoS
//! demands.

use super::clock::Clock;
use super::entry::{EntryState, SubscriptionEntry};
use crate::error::RpcError;
use crate::message::{MessageFactory, MessagingQos, SubscriptionPublication, SubscriptionQos};
use crate::participant::ParticipantId;
use crate::provider::{RequestCaller, SendHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

const PUBLICATION_TTL: Duration = Duration::from_secs(60);

/// Spawn the scheduling task for a newly activated entry. The returned
/// handle is owned by the [`super::PublicationManager`]; aborting it is
/// the cancellation path used by `stop`, `stop_publications`, and expiry.
pub fn spawn(
    entry: Arc<SubscriptionEntry>,
    caller: Arc<dyn RequestCaller>,
    send: SendHandle,
    clock: Arc<dyn Clock>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(entry, caller, send, clock))
}

async fn run(
    entry: Arc<SubscriptionEntry>,
    caller: Arc<dyn RequestCaller>,
    send: SendHandle,
    clock: Arc<dyn Clock>,
) {
    match entry.request.qos {
        SubscriptionQos::Periodic { period, alert_after, .. } => {
            run_periodic(entry, caller, send, clock, period, alert_after).await
        }
        SubscriptionQos::OnChange { min_interval, .. } => {
            run_on_change(entry, caller, send, clock, min_interval, None, None).await
        }
        SubscriptionQos::OnChangeWithKeepAlive {
            min_interval,
            max_interval,
            alert_after,
            ..
        } => run_on_change(entry, caller, send, clock, min_interval, Some(max_interval), alert_after).await,
    }
}

async fn publish(
    entry: &SubscriptionEntry,
    send: &SendHandle,
    clock: &dyn Clock,
    body: Result<Vec<crate::message::RpcValue>, RpcError>,
) {
    let publication = match body {
        Ok(values) => SubscriptionPublication::success(entry.subscription_id(), values),
        Err(err) => SubscriptionPublication::failure(entry.subscription_id(), err),
    };
    match MessageFactory::create_subscription_publication(
        entry.provider_participant_id.clone(),
        entry.proxy_participant_id.clone(),
        &MessagingQos::with_ttl(PUBLICATION_TTL),
        &publication,
    ) {
        Ok(envelope) => send.send(envelope).await,
        Err(err) => warn!(error = %err, "failed to encode subscription publication"),
    }
    entry.mark_published(clock.now_ms());
}

async fn run_periodic(
    entry: Arc<SubscriptionEntry>,
    caller: Arc<dyn RequestCaller>,
    send: SendHandle,
    clock: Arc<dyn Clock>,
    period: Duration,
    alert_after: Option<Duration>,
) {
    let mut tick = tokio::time::interval(period);
    let mut alert_tick = alert_after.map(tokio::time::interval);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if entry.is_expired_at(clock.now_ms()) {
                    entry.set_state(EntryState::Expired);
                    return;
                }
                if entry.state() != EntryState::Active {
                    return;
                }
                let value = caller.get_attribute(&entry.request.subscribe_to_name).await;
                publish(&entry, &send, clock.as_ref(), value).await;
            }
            _ = async { alert_tick.as_mut().unwrap().tick().await }, if alert_tick.is_some() => {
                if entry.is_expired_at(clock.now_ms()) {
                    entry.set_state(EntryState::Expired);
                    return;
                }
                if entry.state() != EntryState::Active {
                    return;
                }
                let since = clock.now_ms().saturating_sub(entry.last_publication_at_ms());
                if since >= alert_after.unwrap().as_millis() as u64 {
                    publish(&entry, &send, clock.as_ref(), Err(RpcError::publication_missed(
                        format!("no publication sent within {:?}", alert_after.unwrap())
                    ))).await;
                }
            }
        }
    }
}

async fn run_on_change(
    entry: Arc<SubscriptionEntry>,
    caller: Arc<dyn RequestCaller>,
    send: SendHandle,
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    max_interval: Option<Duration>,
    alert_after: Option<Duration>,
) {
    let mut changes = match caller.subscribe_to_changes(&entry.request.subscribe_to_name) {
        Some(rx) => rx,
        None => {
            warn!(
                attribute = %entry.request.subscribe_to_name,
                "provider does not support change notification; on-change subscription will never publish"
            );
            let (_tx, rx) = broadcast::channel(1);
            rx
        }
    };

    let mut keep_alive = max_interval.map(tokio::time::interval);
    let mut alert_tick = alert_after.map(tokio::time::interval);
    let mut pending_value: Option<Vec<crate::message::RpcValue>> = None;

    loop {
        tokio::select! {
            changed = changes.recv() => {
                match changed {
                    Ok(value) => pending_value = Some(value),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
            _ = async { keep_alive.as_mut().unwrap().tick().await }, if keep_alive.is_some() => {
                if entry.is_expired_at(clock.now_ms()) {
                    entry.set_state(EntryState::Expired);
                    return;
                }
                if entry.state() != EntryState::Active {
                    return;
                }
                if pending_value.is_none() {
                    let value = caller.get_attribute(&entry.request.subscribe_to_name).await;
                    publish(&entry, &send, clock.as_ref(), value).await;
                    continue;
                }
            }
            _ = async { alert_tick.as_mut().unwrap().tick().await }, if alert_tick.is_some() => {
                if entry.is_expired_at(clock.now_ms()) {
                    entry.set_state(EntryState::Expired);
                    return;
                }
                if entry.state() != EntryState::Active {
                    return;
                }
                let since = clock.now_ms().saturating_sub(entry.last_publication_at_ms());
                if since >= alert_after.unwrap().as_millis() as u64 {
                    publish(&entry, &send, clock.as_ref(), Err(RpcError::publication_missed(
                        format!("no publication sent within {:?}", alert_after.unwrap())
                    ))).await;
                }
            }
        }

        if entry.is_expired_at(clock.now_ms()) {
            entry.set_state(EntryState::Expired);
            return;
        }
        if entry.state() != EntryState::Active {
            return;
        }

        if let Some(value) = pending_value.take() {
            let elapsed = clock.now_ms().saturating_sub(entry.last_publication_at_ms());
            if elapsed < min_interval.as_millis() as u64 {
                tokio::time::sleep(Duration::from_millis(min_interval.as_millis() as u64 - elapsed)).await;
            }
            publish(&entry, &send, clock.as_ref(), Ok(value)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SubscriptionRequest;
    use crate::subscription::SubscriptionId;

    #[test]
    fn periodic_qos_maps_to_fixed_period_tick() {
        let qos = SubscriptionQos::periodic(Duration::from_millis(50), None, None).unwrap();
        match qos {
            SubscriptionQos::Periodic { period, .. } => assert_eq!(period, Duration::from_millis(50)),
            _ => panic!("expected periodic"),
        }
    }

    #[test]
    fn entry_tracks_subscription_id_from_request() {
        let id = SubscriptionId::generate();
        let request = SubscriptionRequest {
            subscription_id: id,
            subscribe_to_name: "location".into(),
            qos: SubscriptionQos::on_change(Duration::from_millis(100), None),
        };
        let entry = SubscriptionEntry::new(
            request,
            ParticipantId::new("consumer").unwrap(),
            ParticipantId::new("provider").unwrap(),
            0,
        );
        assert_eq!(entry.subscription_id(), id);
    }
}
