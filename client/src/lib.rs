//! Async half of the Precept client: HTTP access, the perpetual status
//! poller, durable flags, and the session coordinator that ties them to the
//! pure logic in `precept-core`.

pub mod api;
pub mod error;
pub mod host;
pub mod poller;
pub mod session;
pub mod storage;

pub use api::ApiClient;
pub use error::ApiError;
pub use error::SearchError;
pub use error::SessionClosed;
pub use error::StorageError;
pub use host::AlwaysVisible;
pub use host::Presenter;
pub use host::TracingPresenter;
pub use host::Visibility;
pub use host::VisibilityFlag;
pub use poller::Clock;
pub use poller::PollEvent;
pub use poller::PollerConfig;
pub use poller::StatusPoller;
pub use poller::StatusSource;
pub use poller::TokioClock;
pub use session::SearchOutcome;
pub use session::SessionCommand;
pub use session::SessionController;
pub use session::SessionHandle;
pub use storage::FileStore;
pub use storage::KeyValueStore;
pub use storage::MemoryStore;
pub use storage::installation_id;
pub use storage::open_store;
