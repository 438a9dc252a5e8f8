//! Mock adapters for testing

use async_trait::async_trait;
use geowatch_api::{NotificationRequest, Position, Zone};
use geowatch_util::EntityId;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{NotifyError, NotifyResult, Notifier, Observation, PositionSource, SourceError, SourceResult};

/// Scripted answer for one `fetch` call
#[derive(Debug, Clone)]
pub enum MockResponse {
    Observation(Observation),
    Fail,
    /// Never completes; exercises caller timeouts
    Hang,
}

impl MockResponse {
    /// Unit square zone around the origin, position at its centre
    pub fn inside() -> Self {
        Self::Observation(Observation::new(Position::new(0.5, 0.5), unit_square()))
    }

    /// Unit square zone around the origin, position well east of it
    pub fn outside() -> Self {
        Self::Observation(Observation::new(Position::new(0.5, 5.0), unit_square()))
    }
}

/// `[lon, lat]` unit square with corners at (0, 0) and (1, 1)
pub fn unit_square() -> Zone {
    Zone::new(vec![vec![
        [0.0, 0.0],
        [1.0, 0.0],
        [1.0, 1.0],
        [0.0, 1.0],
        [0.0, 0.0],
    ]])
}

#[derive(Debug, Default)]
struct MockSourceState {
    scripts: HashMap<EntityId, VecDeque<MockResponse>>,
    fallback: HashMap<EntityId, MockResponse>,
}

/// Mock position source for unit/integration testing.
///
/// Each entity has a queue of scripted responses. Once the queue is empty the
/// last response handed out keeps repeating; entities with no script fail.
#[derive(Clone, Default)]
pub struct MockSource {
    state: Arc<Mutex<MockSourceState>>,
    calls: Arc<AtomicU64>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for an entity, in order
    pub fn script(&self, entity_id: impl Into<EntityId>, responses: Vec<MockResponse>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .scripts
            .entry(entity_id.into())
            .or_default()
            .extend(responses);
    }

    /// Total number of `fetch` calls made so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionSource for MockSource {
    async fn fetch(&self, entity_id: &EntityId) -> SourceResult<Observation> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let next = state.scripts.get_mut(entity_id).and_then(|q| q.pop_front());
            match next {
                Some(response) => {
                    state.fallback.insert(entity_id.clone(), response.clone());
                    Some(response)
                }
                None => state.fallback.get(entity_id).cloned(),
            }
        };

        match response {
            Some(MockResponse::Observation(observation)) => Ok(observation),
            Some(MockResponse::Fail) => Err(SourceError::Transport("Mock fetch failure".into())),
            Some(MockResponse::Hang) => {
                std::future::pending::<()>().await;
                Err(SourceError::Transport("unreachable".into()))
            }
            None => Err(SourceError::Malformed(format!("No script for entity {}", entity_id))),
        }
    }
}

/// Notifier that records every request it receives
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<NotificationRequest>>>,
    attempts: Arc<AtomicU64>,

    /// Configure delivery to fail
    pub fail: Arc<AtomicBool>,

    /// Simulated transport latency
    pub delay: Arc<Mutex<Option<Duration>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Successfully delivered requests, in delivery order
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Rendered reasons of delivered requests, in delivery order
    pub fn reasons(&self) -> Vec<String> {
        self.sent().iter().map(|r| r.reason.to_string()).collect()
    }

    /// Delivery attempts including failed ones
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, request: &NotificationRequest) -> NotifyResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("Mock delivery failure".into()));
        }

        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
