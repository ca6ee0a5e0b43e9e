//! Session coordinator: owns the indexing state and turns poll events,
//! source changes and searches into intents for the host.
//!
//! While [`SessionController::run`] is active the host talks to the session
//! through a [`SessionHandle`]: commands travel over an mpsc channel and the
//! latest [`MachineState`] is published on a watch channel.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use indexmap::IndexMap;
use precept_core::BundledResult;
use precept_core::ClientConfig;
use precept_core::IndexingPhase;
use precept_core::IndexingStateMachine;
use precept_core::Intent;
use precept_core::MachineState;
use precept_core::Toast;
use precept_core::bundle;
use precept_protocol::ConnectedDataSource;
use precept_protocol::DataSourceType;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::error::SearchError;
use crate::error::SessionClosed;
use crate::error::StorageError;
use crate::host::Presenter;
use crate::host::Visibility;
use crate::poller::PollEvent;
use crate::poller::PollerConfig;
use crate::poller::StatusPoller;
use crate::storage::FIRST_TIME_INDEXING_KEY;
use crate::storage::KeyValueStore;
use crate::storage::installation_id;

const COMMAND_BUFFER: usize = 32;

type SearchReply = oneshot::Sender<Result<SearchOutcome, SearchError>>;

/// Bundled hits of one search plus request bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<BundledResult>,
    /// Hits returned by the server before bundling.
    pub raw_count: usize,
    pub duration: Duration,
}

/// Host request served by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Search { query: String, reply: SearchReply },
    DataSourceAdded(ConnectedDataSource),
    DataSourceRemoved(i64),
}

/// Cloneable front end for a session inside [`SessionController::run`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<MachineState>,
}

impl SessionHandle {
    /// Searches are admitted in order with the other commands, then run
    /// off the session loop so polling keeps going during the request.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Search {
            query: query.to_string(),
            reply,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionClosed)?
    }

    pub async fn data_source_added(
        &self,
        source: ConnectedDataSource,
    ) -> Result<(), SessionClosed> {
        self.send(SessionCommand::DataSourceAdded(source)).await
    }

    pub async fn data_source_removed(&self, id: i64) -> Result<(), SessionClosed> {
        self.send(SessionCommand::DataSourceRemoved(id)).await
    }

    /// Latest state published by the session.
    pub fn state(&self) -> MachineState {
        self.state.borrow().clone()
    }

    pub fn in_indexing(&self) -> bool {
        self.state.borrow().indexing.in_indexing()
    }

    pub fn status_text(&self) -> String {
        self.state.borrow().indexing.status_text()
    }

    /// Resolves on the next published state change.
    pub async fn changed(&mut self) -> Result<(), SessionClosed> {
        self.state.changed().await.map_err(|_| SessionClosed)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }
}

pub struct SessionController {
    config: ClientConfig,
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    visibility: Arc<dyn Visibility>,
    presenter: Arc<dyn Presenter>,
    machine: IndexingStateMachine,
    state: MachineState,
    state_tx: watch::Sender<MachineState>,
    installation_id: Uuid,
    source_in_indexing: Option<String>,
    connected_sources: Vec<ConnectedDataSource>,
    source_types: IndexMap<String, DataSourceType>,
}

impl SessionController {
    /// Restores the durable flags. A pending first-time indexing run from a
    /// previous session keeps search blocked until it completes.
    pub fn new(
        config: ClientConfig,
        api: ApiClient,
        store: Arc<dyn KeyValueStore>,
        visibility: Arc<dyn Visibility>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self, StorageError> {
        let installation_id = installation_id(store.as_ref())?;
        let source_in_indexing = store.get(FIRST_TIME_INDEXING_KEY)?;
        let mut state = MachineState::default();
        if let Some(source) = &source_in_indexing {
            info!(source = %source, "resuming first-time indexing");
            state.indexing.is_first_time_indexing = true;
            presenter.present(&Intent::ShowNotReadyBanner);
        }
        let (state_tx, _) = watch::channel(state.clone());
        Ok(Self {
            machine: IndexingStateMachine::new(config.machine_config()),
            config,
            api,
            store,
            visibility,
            presenter,
            state,
            state_tx,
            installation_id,
            source_in_indexing,
            connected_sources: Vec::new(),
            source_types: IndexMap::new(),
        })
    }

    /// A handle for the host and the command receiver to pass to
    /// [`SessionController::run`].
    pub fn command_channel(&self) -> (SessionHandle, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = SessionHandle {
            commands: tx,
            state: self.state_tx.subscribe(),
        };
        (handle, rx)
    }

    /// Start polling, refresh the listings, then serve poll events and host
    /// commands until `cancel` fires. Dropping every handle only stops the
    /// command side; polling continues.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        cancel: CancellationToken,
    ) {
        let source = Arc::new(self.api.clone());
        let poller = StatusPoller::new(source, PollerConfig::from(&self.config));
        let (handle, mut events) = poller.spawn(cancel.clone());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = self.refresh(true, true) => {}
        }

        let mut commands_open = true;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        self.apply_poll(event).await;
                    }
                    None => break,
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("all session handles dropped");
                        commands_open = false;
                    }
                },
            }
        }
        drop(events);
        if let Err(err) = handle.await {
            warn!("status poller task failed: {err}");
        }
        info!("session stopped");
    }

    /// Fold one poll result into the state and carry out its intents.
    pub async fn apply_poll(&mut self, event: PollEvent) -> IndexingPhase {
        let visible = self.visibility.is_visible();
        let transition =
            self.machine
                .transition(&self.state, &event.outcome, event.observed_at, visible);
        self.set_state(transition.next);
        self.dispatch(transition.intents).await;
        transition.phase
    }

    /// A source was connected from the host's settings screen.
    pub async fn data_source_added(&mut self, source: ConnectedDataSource) {
        let first_source = self.connected_sources.is_empty();
        let transition = self
            .machine
            .mark_indexing_started(&self.state, &source.name, first_source);
        self.set_state(transition.next);
        self.connected_sources.push(source);
        self.dispatch(transition.intents).await;
    }

    pub fn data_source_removed(&mut self, id: i64) {
        let before = self.connected_sources.len();
        self.connected_sources.retain(|source| source.id != id);
        if self.connected_sources.len() == before {
            debug!(id, "removed data source was not in the connected list");
        }
    }

    pub async fn refresh_connected_sources(&mut self) {
        self.refresh(true, false).await;
    }

    /// Only the configured source types are offered to the user.
    pub async fn refresh_source_types(&mut self) {
        self.refresh(false, true).await;
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let query = self.admit_search(query)?;
        run_search(
            &self.api,
            &self.installation_id,
            self.presenter.as_ref(),
            &query,
        )
        .await
    }

    /// Gate checks that need the session state. First-time indexing blocks
    /// every search, blank ones included.
    fn admit_search(&self, query: &str) -> Result<String, SearchError> {
        if self.state.indexing.is_first_time_indexing {
            self.presenter.present(&Intent::ShowNotReadyBanner);
            return Err(SearchError::NotReady);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(query.to_string())
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Search { query, reply } => match self.admit_search(&query) {
                Ok(query) => {
                    let api = self.api.clone();
                    let installation_id = self.installation_id;
                    let presenter = Arc::clone(&self.presenter);
                    tokio::spawn(async move {
                        let result =
                            run_search(&api, &installation_id, presenter.as_ref(), &query).await;
                        if reply.send(result).is_err() {
                            debug!("search caller went away before the reply");
                        }
                    });
                }
                Err(err) => {
                    if reply.send(Err(err)).is_err() {
                        debug!("search caller went away before the reply");
                    }
                }
            },
            SessionCommand::DataSourceAdded(source) => self.data_source_added(source).await,
            SessionCommand::DataSourceRemoved(id) => self.data_source_removed(id),
        }
    }

    async fn dispatch(&mut self, intents: Vec<Intent>) {
        let mut refresh_sources = false;
        let mut refresh_types = false;
        for intent in intents {
            match intent {
                Intent::PersistFirstTimeIndexing(source) => {
                    if let Err(err) = self.store.set(FIRST_TIME_INDEXING_KEY, &source) {
                        warn!("failed to persist first-time indexing flag: {err}");
                    }
                    self.source_in_indexing = Some(source);
                }
                Intent::ClearFirstTimeIndexingPersistent => {
                    if let Err(err) = self.store.remove(FIRST_TIME_INDEXING_KEY) {
                        warn!("failed to clear first-time indexing flag: {err}");
                    }
                    self.source_in_indexing = None;
                }
                Intent::RefreshConnectedSources => refresh_sources = true,
                Intent::RefreshSourceTypes => refresh_types = true,
                other => self.presenter.present(&other),
            }
        }
        self.refresh(refresh_sources, refresh_types).await;
    }

    /// Fetch the requested listings concurrently. Failures are logged and
    /// leave the previous listing in place.
    async fn refresh(&mut self, sources: bool, types: bool) {
        if !sources && !types {
            return;
        }
        let api = &self.api;
        let (connected, listed) = tokio::join!(
            async {
                if sources {
                    Some(api.connected_data_sources().await)
                } else {
                    None
                }
            },
            async {
                if types {
                    Some(api.data_source_types().await)
                } else {
                    None
                }
            },
        );
        if let Some(result) = connected {
            self.apply_connected_sources(result);
        }
        if let Some(result) = listed {
            self.apply_source_types(result);
        }
    }

    fn apply_connected_sources(&mut self, result: Result<Vec<ConnectedDataSource>, ApiError>) {
        match result {
            Ok(sources) => {
                debug!(count = sources.len(), "connected data sources refreshed");
                self.connected_sources = sources;
            }
            Err(err) => warn!("failed to list connected data sources: {err}"),
        }
    }

    fn apply_source_types(&mut self, result: Result<Vec<DataSourceType>, ApiError>) {
        match result {
            Ok(types) => {
                let visible = &self.config.visible_source_types;
                self.source_types = types
                    .into_iter()
                    .filter(|source_type| visible.contains(&source_type.name))
                    .map(|source_type| (source_type.name.clone(), source_type))
                    .collect();
                debug!(count = self.source_types.len(), "data source types refreshed");
            }
            Err(err) => warn!("failed to list data source types: {err}"),
        }
    }

    fn set_state(&mut self, next: MachineState) {
        self.state = next;
        self.state_tx.send_replace(self.state.clone());
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn in_indexing(&self) -> bool {
        self.state.indexing.in_indexing()
    }

    pub fn status_text(&self) -> String {
        self.state.indexing.status_text()
    }

    /// Name of the source whose first indexing run is pending, if any.
    pub fn source_in_indexing(&self) -> Option<&str> {
        self.source_in_indexing.as_deref()
    }

    pub fn connected_sources(&self) -> &[ConnectedDataSource] {
        &self.connected_sources
    }

    pub fn source_types(&self) -> &IndexMap<String, DataSourceType> {
        &self.source_types
    }

    pub fn installation_id(&self) -> Uuid {
        self.installation_id
    }
}

async fn run_search(
    api: &ApiClient,
    installation_id: &Uuid,
    presenter: &dyn Presenter,
    query: &str,
) -> Result<SearchOutcome, SearchError> {
    let started = Instant::now();
    let raw = match api.search(query, installation_id).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(query, "search failed: {err}");
            presenter.present(&Intent::ShowToast(Toast::search_failed(&err.detail())));
            return Err(err.into());
        }
    };
    let duration = started.elapsed();
    if raw.is_empty() {
        presenter.present(&Intent::ShowToast(Toast::no_results()));
    }
    let results = bundle(&raw);
    info!(
        query,
        raw = raw.len(),
        bundled = results.len(),
        elapsed = ?duration,
        "search finished"
    );
    Ok(SearchOutcome {
        results,
        raw_count: raw.len(),
        duration,
    })
}
