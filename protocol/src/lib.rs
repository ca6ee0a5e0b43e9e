//! Wire types shared between the search server and the client core.

pub mod data_source;
pub mod search;
pub mod status;

pub use data_source::ConnectedDataSource;
pub use data_source::DataSourceType;
pub use search::DataSource;
pub use search::FileType;
pub use search::ResultType;
pub use search::SearchResultDetails;
pub use search::TextPart;
pub use status::StatusSample;
