use serde::Deserialize;
use serde::Serialize;

/// One response of `GET /status`: the server's view of background indexing.
///
/// The counters are not guaranteed to be consistent with each other from one
/// sample to the next; callers should treat them as noisy hints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSample {
    /// Documents currently being embedded/indexed.
    pub docs_in_indexing: u32,
    /// Documents fetched from a source and waiting in the queue.
    pub docs_left_to_index: u32,
    /// Documents already searchable.
    pub docs_indexed: u32,
}

impl StatusSample {
    pub fn new(docs_in_indexing: u32, docs_left_to_index: u32, docs_indexed: u32) -> Self {
        Self {
            docs_in_indexing,
            docs_left_to_index,
            docs_indexed,
        }
    }

    /// True when the sample itself reports queued or in-flight work.
    pub fn has_pending_work(&self) -> bool {
        self.docs_in_indexing > 0 || self.docs_left_to_index > 0
    }
}
