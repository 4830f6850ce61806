//! Publication controller
//!
//! Walks the qualifying videos in order and publishes each one at most once:
//!
//! 1. Each region gets a fixed number of slots per pass. Inspecting a video
//!    uses a slot whatever the outcome.
//! 2. The composed payload is checked against the ledger; known payloads are
//!    never sent again.
//! 3. A rate-limited publish suspends the whole pass for the backoff interval
//!    and then retries the same payload, up to a retry cap.
//! 4. Each successful publish is committed to the ledger file before the next
//!    video is looked at.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::composer::{compose, Payload};
use crate::error::Result;
use crate::hashtags::{default_general_hashtags, hashtags_for, HashtagExtractor};
use crate::platforms::{PublishOutcome, Publisher};
use crate::quota::{RegionQuota, DEFAULT_PER_REGION_LIMIT};
use crate::store::{Ledger, LedgerStore};
use crate::types::{Region, VideoSnapshot};

/// Suspends the pass while a rate limit cools down
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real waiter backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioWaiter;

#[async_trait]
impl Waiter for TokioWaiter {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Tunables for one pass of the controller
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub per_region_limit: u32,
    pub rate_limit_backoff: Duration,
    /// Retries after the first rate-limited attempt before giving up on a post
    pub max_rate_limit_retries: u32,
    /// Tags added to every post
    pub general_hashtags: Vec<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            per_region_limit: DEFAULT_PER_REGION_LIMIT,
            rate_limit_backoff: Duration::from_secs(15 * 60),
            max_rate_limit_retries: 3,
            general_hashtags: default_general_hashtags(),
        }
    }
}

/// What happened to one inspected video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Sent and committed to the ledger
    Published { post_id: String },
    /// Payload was already in the ledger; nothing sent
    AlreadyPublished,
    /// Rejected by validation or the transport; not retried this pass
    Failed { reason: String },
    /// Still rate limited after every allowed retry
    RateLimitExhausted { attempts: u32 },
}

/// Per-video line of a [`PassReport`]
#[derive(Debug, Clone, Serialize)]
pub struct VideoOutcome {
    pub video_id: String,
    pub region: Region,
    pub payload: Payload,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Summary of one controller run
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Inspected videos in order
    pub outcomes: Vec<VideoOutcome>,
    /// Slots consumed per region
    pub slots: BTreeMap<Region, u32>,
    /// Qualifying videos left alone because their region was full
    pub over_quota: usize,
}

impl PassReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Published { .. }))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyPublished))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn rate_limited(&self) -> usize {
        self.count(|o| matches!(o, Outcome::RateLimitExhausted { .. }))
    }
}

/// Publish attempt state for one payload
enum AttemptState {
    /// About to call the transport
    Ready,
    /// Waiting out a rate limit before retrying the same payload
    Suspended { detail: String },
    Done(Outcome),
}

pub struct PublicationController {
    publisher: Box<dyn Publisher>,
    extractor: Box<dyn HashtagExtractor>,
    waiter: Box<dyn Waiter>,
    ledger_store: LedgerStore,
    ledger: Ledger,
    settings: ControllerSettings,
}

impl PublicationController {
    /// Create a controller over an already loaded `ledger`
    pub fn new(
        publisher: Box<dyn Publisher>,
        extractor: Box<dyn HashtagExtractor>,
        waiter: Box<dyn Waiter>,
        ledger_store: LedgerStore,
        ledger: Ledger,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            publisher,
            extractor,
            waiter,
            ledger_store,
            ledger,
            settings,
        }
    }

    /// Load the ledger from `ledger_store` and create a controller over it
    pub fn load(
        publisher: Box<dyn Publisher>,
        extractor: Box<dyn HashtagExtractor>,
        waiter: Box<dyn Waiter>,
        ledger_store: LedgerStore,
        settings: ControllerSettings,
    ) -> Result<Self> {
        let ledger = ledger_store.load()?;
        Ok(Self::new(
            publisher,
            extractor,
            waiter,
            ledger_store,
            ledger,
            settings,
        ))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run one publication sweep over `qualifying`, in order.
    ///
    /// Publish errors never abort the sweep. Failing to persist the ledger
    /// after a successful publish does.
    pub async fn run(&mut self, qualifying: &[VideoSnapshot]) -> Result<PassReport> {
        let started_at = Utc::now();
        let mut quota = RegionQuota::new(self.settings.per_region_limit);
        let mut outcomes = Vec::new();
        let mut over_quota = 0;

        for (index, video) in qualifying.iter().enumerate() {
            if quota.exhausted() {
                over_quota += qualifying.len() - index;
                debug!("Every region is at its limit, ending sweep");
                break;
            }
            if !quota.has_capacity(video.region) {
                over_quota += 1;
                debug!(
                    video_id = %video.id,
                    region = %video.region,
                    "Region quota used up, not composing"
                );
                continue;
            }

            let hashtags = hashtags_for(
                &*self.extractor,
                &self.settings.general_hashtags,
                &video.title,
                &video.description,
            );
            let payload = compose(video, &hashtags);
            let outcome = self.publish_payload(&payload).await?;
            quota.consume(video.region);

            match &outcome {
                Outcome::Published { post_id } => {
                    info!("Published {} ({}) as {}", video.id, video.region, post_id)
                }
                Outcome::AlreadyPublished => {
                    info!("Skipping {} ({}): already published", video.id, video.region)
                }
                Outcome::Failed { reason } => {
                    warn!("Failed to publish {} ({}): {}", video.id, video.region, reason)
                }
                Outcome::RateLimitExhausted { attempts } => warn!(
                    "Giving up on {} ({}) after {} rate-limited attempts",
                    video.id, video.region, attempts
                ),
            }

            outcomes.push(VideoOutcome {
                video_id: video.id.clone(),
                region: video.region,
                payload,
                outcome,
            });
        }

        let slots = Region::ALL
            .iter()
            .map(|r| (*r, quota.consumed(*r)))
            .collect();

        Ok(PassReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            slots,
            over_quota,
        })
    }

    /// Publish `payload` unless the ledger already has it.
    ///
    /// On success the ledger is saved before returning.
    pub async fn publish_payload(&mut self, payload: &Payload) -> Result<Outcome> {
        if self.ledger.contains(payload.as_str()) {
            return Ok(Outcome::AlreadyPublished);
        }

        if let Err(e) = self.publisher.validate_content(payload.as_str()) {
            return Ok(Outcome::Failed {
                reason: e.to_string(),
            });
        }

        let outcome = self.attempt(payload).await;
        if let Outcome::Published { .. } = outcome {
            self.ledger.insert(payload.as_str());
            self.ledger_store.save(&self.ledger)?;
        }
        Ok(outcome)
    }

    /// Drive one payload through the rate-limit state machine
    async fn attempt(&self, payload: &Payload) -> Outcome {
        let mut state = AttemptState::Ready;
        let mut retries = 0;

        loop {
            state = match state {
                AttemptState::Ready => {
                    let result = self.publisher.publish(payload.as_str()).await;
                    match PublishOutcome::from_result(result) {
                        PublishOutcome::Published(post_id) => {
                            AttemptState::Done(Outcome::Published { post_id })
                        }
                        PublishOutcome::Failed(reason) => {
                            AttemptState::Done(Outcome::Failed { reason })
                        }
                        PublishOutcome::RateLimited(_)
                            if retries >= self.settings.max_rate_limit_retries =>
                        {
                            AttemptState::Done(Outcome::RateLimitExhausted {
                                attempts: retries + 1,
                            })
                        }
                        PublishOutcome::RateLimited(detail) => AttemptState::Suspended { detail },
                    }
                }
                AttemptState::Suspended { detail } => {
                    retries += 1;
                    warn!(
                        "Rate limited by {} ({}). Suspending for {} before retry {}/{}",
                        self.publisher.name(),
                        detail,
                        humantime::format_duration(self.settings.rate_limit_backoff),
                        retries,
                        self.settings.max_rate_limit_retries
                    );
                    self.waiter.wait(self.settings.rate_limit_backoff).await;
                    AttemptState::Ready
                }
                AttemptState::Done(outcome) => return outcome,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::hashtags::KeywordExtractor;
    use crate::platforms::mock::{MockPublisher, MockResponse};
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records requested waits instead of sleeping
    #[derive(Clone, Default)]
    struct RecordingWaiter {
        waits: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingWaiter {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Waiter for RecordingWaiter {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn video(id: &str, region: Region) -> VideoSnapshot {
        VideoSnapshot {
            id: id.to_string(),
            title: format!("Video {}", id),
            description: String::new(),
            url: VideoSnapshot::watch_url(id),
            view_count: 42_000,
            region,
        }
    }

    struct Harness {
        _temp: TempDir,
        store: LedgerStore,
        publisher: MockPublisher,
        waiter: RecordingWaiter,
    }

    impl Harness {
        fn new(publisher: MockPublisher) -> Self {
            let temp = TempDir::new().unwrap();
            let store = LedgerStore::new(temp.path().join("ledger.json"));
            Self {
                _temp: temp,
                store,
                publisher,
                waiter: RecordingWaiter::default(),
            }
        }

        fn controller(&self) -> PublicationController {
            PublicationController::load(
                Box::new(self.publisher.clone()),
                Box::new(KeywordExtractor::default()),
                Box::new(self.waiter.clone()),
                self.store.clone(),
                ControllerSettings::default(),
            )
            .unwrap()
        }
    }

    #[tokio::test]
    async fn test_publishes_and_commits_each_success() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let mut controller = harness.controller();

        let report = controller
            .run(&[video("a", Region::Turkey), video("b", Region::UnitedStates)])
            .await
            .unwrap();

        assert_eq!(report.published(), 2);
        assert_eq!(harness.publisher.call_count(), 2);

        let persisted = harness.store.load().unwrap();
        assert_eq!(persisted.len(), 2);
        for line in &report.outcomes {
            assert!(persisted.contains(line.payload.as_str()));
        }
    }

    #[tokio::test]
    async fn test_second_run_short_circuits_on_ledger() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let videos = [video("a", Region::Turkey)];

        harness.controller().run(&videos).await.unwrap();
        let report = harness.controller().run(&videos).await.unwrap();

        assert_eq!(harness.publisher.call_count(), 1);
        assert_eq!(report.duplicates(), 1);
        assert_eq!(report.slots[&Region::Turkey], 1);
    }

    #[tokio::test]
    async fn test_region_cap_limits_attempts_to_first_three() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let mut controller = harness.controller();
        let videos: Vec<_> = (1..=5)
            .map(|i| video(&format!("tr{}", i), Region::Turkey))
            .collect();

        let report = controller.run(&videos).await.unwrap();

        let attempted: Vec<_> = report.outcomes.iter().map(|o| o.video_id.as_str()).collect();
        assert_eq!(attempted, vec!["tr1", "tr2", "tr3"]);
        assert_eq!(report.over_quota, 2);
        assert_eq!(report.slots[&Region::Turkey], 3);
        assert_eq!(harness.publisher.call_count(), 3);
        assert!(harness
            .publisher
            .calls()
            .iter()
            .all(|text| !text.contains("tr4") && !text.contains("tr5")));
    }

    #[tokio::test]
    async fn test_duplicates_consume_slots() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let first: Vec<_> = (1..=3)
            .map(|i| video(&format!("v{}", i), Region::Turkey))
            .collect();
        harness.controller().run(&first).await.unwrap();

        let mut second = first.clone();
        second.push(video("v4", Region::Turkey));
        let report = harness.controller().run(&second).await.unwrap();

        assert_eq!(report.duplicates(), 3);
        assert_eq!(report.over_quota, 1);
        assert_eq!(harness.publisher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_regions_are_capped_independently() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let mut videos: Vec<_> = (1..=4)
            .map(|i| video(&format!("tr{}", i), Region::Turkey))
            .collect();
        videos.extend((1..=4).map(|i| video(&format!("us{}", i), Region::UnitedStates)));

        let report = harness.controller().run(&videos).await.unwrap();

        assert_eq!(report.slots[&Region::Turkey], 3);
        assert_eq!(report.slots[&Region::UnitedStates], 3);
        assert_eq!(report.published(), 6);
    }

    /// Counts how many payloads get composed
    #[derive(Clone, Default)]
    struct CountingExtractor {
        calls: Arc<Mutex<usize>>,
    }

    impl HashtagExtractor for CountingExtractor {
        fn extract(&self, _title: &str, _description: &str) -> BTreeSet<String> {
            *self.calls.lock().unwrap() += 1;
            BTreeSet::new()
        }
    }

    #[tokio::test]
    async fn test_sweep_ends_once_every_region_is_full() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let extractor = CountingExtractor::default();
        let mut controller = PublicationController::load(
            Box::new(harness.publisher.clone()),
            Box::new(extractor.clone()),
            Box::new(harness.waiter.clone()),
            harness.store.clone(),
            ControllerSettings {
                per_region_limit: 1,
                ..ControllerSettings::default()
            },
        )
        .unwrap();
        let videos = [
            video("tr1", Region::Turkey),
            video("us1", Region::UnitedStates),
            video("tr2", Region::Turkey),
            video("us2", Region::UnitedStates),
            video("tr3", Region::Turkey),
        ];

        let report = controller.run(&videos).await.unwrap();

        assert_eq!(report.published(), 2);
        assert_eq!(report.over_quota, 3);
        assert_eq!(*extractor.calls.lock().unwrap(), 2);
        assert_eq!(harness.publisher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success_records_once() {
        let publisher = MockPublisher::success("mock").with_script(vec![MockResponse::Fail(
            PlatformError::RateLimit("429".to_string()),
        )]);
        let harness = Harness::new(publisher);

        let report = harness
            .controller()
            .run(&[video("a", Region::Turkey)])
            .await
            .unwrap();

        assert_eq!(report.published(), 1);
        assert_eq!(harness.waiter.waits(), vec![Duration::from_secs(15 * 60)]);

        let calls = harness.publisher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1], "retry must resend the same payload");

        let persisted = harness.store.load().unwrap();
        assert_eq!(persisted.len(), 1);
        assert!(persisted.contains(&calls[0]));
    }

    #[tokio::test]
    async fn test_rate_limit_retries_are_capped() {
        let publisher =
            MockPublisher::failing("mock", PlatformError::RateLimit("429".to_string()));
        let harness = Harness::new(publisher);

        let report = harness
            .controller()
            .run(&[video("a", Region::Turkey), video("b", Region::Turkey)])
            .await
            .unwrap();

        assert_eq!(report.rate_limited(), 2);
        assert_eq!(
            report.outcomes[0].outcome,
            Outcome::RateLimitExhausted { attempts: 4 }
        );
        // 1 attempt + 3 retries per video
        assert_eq!(harness.publisher.call_count(), 8);
        assert_eq!(harness.waiter.waits().len(), 6);
        assert!(harness.store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_skip_without_retry() {
        let publisher = MockPublisher::success("mock").with_script(vec![MockResponse::Fail(
            PlatformError::Posting("500 Internal Server Error".to_string()),
        )]);
        let harness = Harness::new(publisher);

        let report = harness
            .controller()
            .run(&[video("a", Region::Turkey), video("b", Region::Turkey)])
            .await
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.published(), 1);
        assert_eq!(report.slots[&Region::Turkey], 2);
        assert!(harness.waiter.waits().is_empty());

        let persisted = harness.store.load().unwrap();
        assert_eq!(persisted.len(), 1);
        assert!(!persisted.contains(report.outcomes[0].payload.as_str()));
    }

    #[tokio::test]
    async fn test_failed_post_is_retried_in_a_later_pass() {
        let publisher = MockPublisher::success("mock").with_script(vec![MockResponse::Fail(
            PlatformError::Network("timeout".to_string()),
        )]);
        let harness = Harness::new(publisher);
        let videos = [video("a", Region::Turkey)];

        let first = harness.controller().run(&videos).await.unwrap();
        let second = harness.controller().run(&videos).await.unwrap();

        assert_eq!(first.failed(), 1);
        assert_eq!(second.published(), 1);
        assert_eq!(harness.publisher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_content_not_sent() {
        let harness = Harness::new(MockPublisher::success("mock").with_limit(20));

        let report = harness
            .controller()
            .run(&[video("a", Region::Turkey)])
            .await
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.slots[&Region::Turkey], 1);
        assert_eq!(harness.publisher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_save_failure_aborts() {
        let temp = TempDir::new().unwrap();
        // A directory where the ledger file should be makes the rename fail
        let ledger_path = temp.path().join("ledger.json");
        std::fs::create_dir(&ledger_path).unwrap();
        std::fs::write(ledger_path.join("occupant"), "x").unwrap();

        let publisher = MockPublisher::success("mock");
        let mut controller = PublicationController::new(
            Box::new(publisher.clone()),
            Box::new(KeywordExtractor::default()),
            Box::new(RecordingWaiter::default()),
            LedgerStore::new(&ledger_path),
            Ledger::new(),
            ControllerSettings::default(),
        );

        let result = controller
            .run(&[video("a", Region::Turkey), video("b", Region::Turkey)])
            .await;
        assert!(result.is_err());
        assert_eq!(publisher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_payload_is_idempotent() {
        let harness = Harness::new(MockPublisher::success("mock"));
        let mut controller = harness.controller();
        let payload = compose(&video("a", Region::Turkey), &Default::default());

        let first = controller.publish_payload(&payload).await.unwrap();
        let second = controller.publish_payload(&payload).await.unwrap();

        assert!(matches!(first, Outcome::Published { .. }));
        assert_eq!(second, Outcome::AlreadyPublished);
        assert_eq!(harness.publisher.call_count(), 1);
        assert!(controller.ledger().contains(payload.as_str()));
    }
}
