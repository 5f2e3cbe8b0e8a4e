use crate::config::{Config, ConfigError, ConfigSource, LoadStatus};
use crate::detect;
use crate::grocy::{self, GrocyError};
use crate::notify::{summary_message, Presenter, NOTIFICATION_TITLE};
use crate::scheduler::EngineState;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Why a cycle produced no result.
#[derive(Debug, Error)]
enum CycleError {
    #[error("error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("error fetching chores: {0}")]
    Fetch(#[from] GrocyError),
}

/// Result of one fetch-evaluate-update pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub cycle_id: Uuid,
    /// `false` when the cycle was skipped because config or fetch failed.
    pub completed: bool,
    pub overdue_names: Vec<String>,
    pub overdue_count: usize,
    pub user_id_for_link: Option<i64>,
}

impl CycleOutcome {
    fn skipped(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            completed: false,
            overdue_names: Vec::new(),
            overdue_count: 0,
            user_id_for_link: None,
        }
    }

    pub fn has_overdue(&self) -> bool {
        self.overdue_count > 0
    }
}

/// Runs polling cycles and owns the [`EngineState`] they produce.
///
/// Cheap to clone; clones share state. Cycles are serialized: a cycle
/// triggered while another is in flight waits for it to finish.
#[derive(Clone)]
pub struct PollController {
    config: Arc<dyn ConfigSource>,
    presenter: Arc<dyn Presenter>,
    state: Arc<RwLock<EngineState>>,
    cycle_lock: Arc<Mutex<()>>,
}

impl PollController {
    pub fn new(config: Arc<dyn ConfigSource>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            config,
            presenter,
            state: Arc::new(RwLock::new(EngineState::default())),
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot of the state left by the last completed cycle.
    pub fn state(&self) -> EngineState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config_source(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    /// Load the current config. When the backing file had gone missing and
    /// was recreated with defaults, the user is told and shown where it is.
    pub async fn load_config(&self) -> Result<Config, ConfigError> {
        let (config, status) = self.config.load_with_status()?;
        if status == LoadStatus::Created {
            self.announce_new_config().await;
        }
        Ok(config)
    }

    async fn announce_new_config(&self) {
        if let Err(e) = self
            .presenter
            .notify(
                "No Config",
                "Created default config, please edit it with your actual values",
            )
            .await
        {
            warn!(error = %e, "Error sending notification");
        }
        if let Some(dir) = self.config.path().and_then(|p| p.parent()) {
            if let Err(e) = self.presenter.open_path(dir).await {
                warn!(error = %e, "Error opening file browser");
            }
        }
    }

    /// The currently configured polling interval.
    pub async fn check_interval(&self) -> Result<Duration, ConfigError> {
        self.load_config().await.map(|c| c.check_interval())
    }

    /// Chores overview URL for the last user seen.
    pub async fn web_link(&self) -> Result<String, ConfigError> {
        let config = self.load_config().await?;
        Ok(grocy::web_link(&config.grocy_url, self.state().last_user_id))
    }

    /// Fetch, evaluate, and update [`EngineState`]. Never fails: errors are
    /// logged and yield a non-completed outcome with state left as it was.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let _guard = self.cycle_lock.lock().await;
        let cycle_id = Uuid::new_v4();

        match self.try_cycle(cycle_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(cycle = %cycle_id, error = %e, "Cycle skipped");
                CycleOutcome::skipped(cycle_id)
            }
        }
    }

    async fn try_cycle(&self, cycle_id: Uuid) -> Result<CycleOutcome, CycleError> {
        let config = self.load_config().await?;
        let chores = grocy::client::fetch_chores(&config.grocy_url, &config.api_key).await?;

        let now = chrono::Local::now();
        let evaluation = detect::evaluate(&chores, &config.username, &now);

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.has_overdue = evaluation.has_overdue();
            state.last_user_id = evaluation.last_user_id;
        }

        info!(
            cycle = %cycle_id,
            user = %config.username,
            chores = chores.len(),
            overdue = evaluation.overdue_count(),
            "Cycle complete"
        );

        Ok(CycleOutcome {
            cycle_id,
            completed: true,
            overdue_count: evaluation.overdue_count(),
            overdue_names: evaluation.overdue_names,
            user_id_for_link: evaluation.last_user_id,
        })
    }

    /// Run a cycle and present it: icon always, notification only when
    /// something is overdue. Skipped cycles present nothing.
    pub async fn check_and_notify(&self) -> CycleOutcome {
        let outcome = self.run_cycle().await;
        if !outcome.completed {
            return outcome;
        }

        self.presenter.set_icon(outcome.has_overdue());

        if let Some(message) = summary_message(&outcome.overdue_names) {
            if let Err(e) = self.presenter.notify(NOTIFICATION_TITLE, &message).await {
                warn!(cycle = %outcome.cycle_id, error = %e, "Error sending notification");
            }
        }

        outcome
    }
}
