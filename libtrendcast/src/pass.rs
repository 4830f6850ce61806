//! One full pass: fetch, filter, publish
//!
//! A pass reads the ledger, fetches every region's trending chart, drops
//! repeated ids, runs the trend filter (which persists the baseline), and
//! hands the qualifying videos to the publication controller.
//!
//! Any fetch failure aborts the pass before the baseline or ledger is touched.

use tracing::info;

use crate::config::Config;
use crate::controller::{
    ControllerSettings, PassReport, PublicationController, TokioWaiter, Waiter,
};
use crate::error::Result;
use crate::hashtags::{HashtagExtractor, KeywordExtractor};
use crate::platforms::twitter::TwitterClient;
use crate::platforms::Publisher;
use crate::source::youtube::YouTubeClient;
use crate::source::{fetch_all, TrendSource};
use crate::store::{BaselineStore, LedgerStore};
use crate::trend::{TrendFilter, DEFAULT_VIEW_THRESHOLD};
use crate::types::dedupe_by_id;

/// Everything a pass needs besides its collaborators
#[derive(Debug, Clone)]
pub struct PassSettings {
    pub max_results: u32,
    pub view_threshold: u64,
    pub controller: ControllerSettings,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            view_threshold: DEFAULT_VIEW_THRESHOLD,
            controller: ControllerSettings::default(),
        }
    }
}

impl PassSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            max_results: config.youtube.max_results,
            view_threshold: config.trend.view_threshold,
            controller: ControllerSettings {
                per_region_limit: config.publishing.per_region_limit,
                rate_limit_backoff: config.rate_limit_backoff()?,
                max_rate_limit_retries: config.publishing.max_rate_limit_retries,
                general_hashtags: config.hashtags.general.clone(),
            },
        })
    }
}

/// A single fetch → filter → publish run with injected collaborators
pub struct TrendPass {
    source: Box<dyn TrendSource>,
    publisher: Box<dyn Publisher>,
    extractor: Box<dyn HashtagExtractor>,
    waiter: Box<dyn Waiter>,
    baseline_store: BaselineStore,
    ledger_store: LedgerStore,
    settings: PassSettings,
}

impl TrendPass {
    /// Create a pass with the default extractor and a real-time waiter
    pub fn new(
        source: Box<dyn TrendSource>,
        publisher: Box<dyn Publisher>,
        baseline_store: BaselineStore,
        ledger_store: LedgerStore,
        settings: PassSettings,
    ) -> Self {
        Self {
            source,
            publisher,
            extractor: Box::new(KeywordExtractor::default()),
            waiter: Box::new(TokioWaiter),
            baseline_store,
            ledger_store,
            settings,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn HashtagExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_waiter(mut self, waiter: Box<dyn Waiter>) -> Self {
        self.waiter = waiter;
        self
    }

    /// Wire the YouTube source and X publisher described by `config`
    ///
    /// Credentials are read from the environment variables the config names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = PassSettings::from_config(config)?;

        let api_key = config.youtube_api_key()?;
        let source = match &config.youtube.base_url {
            Some(url) => YouTubeClient::with_base_url(api_key, url)?,
            None => YouTubeClient::new(api_key)?,
        };

        let token = config.twitter_bearer_token()?;
        let publisher = match &config.twitter.base_url {
            Some(url) => TwitterClient::with_base_url(token, url)?,
            None => TwitterClient::new(token)?,
        };

        Ok(Self::new(
            Box::new(source),
            Box::new(publisher),
            BaselineStore::new(config.baseline_path()),
            LedgerStore::new(config.ledger_path()),
            settings,
        )
        .with_extractor(Box::new(KeywordExtractor::new(config.hashtags.max_dynamic))))
    }

    /// Run the pass to completion
    pub async fn run(self) -> Result<PassReport> {
        // Read before fetching so a corrupt ledger stops the pass early
        let mut controller = PublicationController::load(
            self.publisher,
            self.extractor,
            self.waiter,
            self.ledger_store,
            self.settings.controller,
        )?;

        let fetched = fetch_all(&*self.source, self.settings.max_results).await?;
        let videos = dedupe_by_id(fetched);

        let filter = TrendFilter::new(self.baseline_store, self.settings.view_threshold);
        let outcome = filter.run(&videos)?;
        let qualifying: Vec<_> = outcome.videos().cloned().collect();

        let report = controller.run(&qualifying).await?;
        info!(
            "Pass complete: {} published, {} already published, {} failed, {} rate limited",
            report.published(),
            report.duplicates(),
            report.failed(),
            report.rate_limited()
        );
        Ok(report)
    }
}
