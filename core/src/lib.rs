/*!
# Precept client core

Pure, synchronous logic shared by every Precept front end:

- **Indexing state machine**: folds `/status` samples and poll failures into
  the `is_indexing` / `is_preparing_indexing` / `is_server_down` /
  `is_first_time_indexing` flags and emits presentation [`Intent`]s.
- **Result bundling**: merges Google Drive fragments of the same document and
  trims Slack hits down to their snippet.
- **Configuration**: [`ClientConfig`], loaded from TOML.

Nothing here performs I/O besides reading a configuration file; the polling
loop, HTTP and storage live in `precept-client`.
*/

pub mod bundle;
pub mod config;
pub mod indexing;
pub mod intent;
pub mod poll;

pub use bundle::BundledResult;
pub use bundle::bundle;
pub use config::ClientConfig;
pub use config::ConfigError;
pub use indexing::FailureState;
pub use indexing::IndexingPhase;
pub use indexing::IndexingProgress;
pub use indexing::IndexingState;
pub use indexing::IndexingStateMachine;
pub use indexing::MachineConfig;
pub use indexing::MachineState;
pub use indexing::Transition;
pub use indexing::transition;
pub use intent::Intent;
pub use intent::Toast;
pub use intent::ToastLevel;
pub use poll::PollError;
pub use poll::PollErrorKind;
pub use poll::PollOutcome;
