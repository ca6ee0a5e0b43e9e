use super::IndexingState;

/// Indexed documents against everything the server currently knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexingProgress {
    pub indexed: u64,
    pub total: u64,
}

impl IndexingProgress {
    /// Whole percent, rounded down.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.indexed.saturating_mul(100) / self.total;
        pct.min(100) as u8
    }
}

impl IndexingState {
    pub fn progress(&self) -> Option<IndexingProgress> {
        let indexed = u64::from(self.docs_indexed);
        let total =
            indexed + u64::from(self.docs_in_indexing) + u64::from(self.docs_left_to_index);
        (total > 0).then_some(IndexingProgress { indexed, total })
    }

    /// One-line banner text describing what the server is doing.
    pub fn status_text(&self) -> String {
        if self.is_preparing_indexing {
            return "Indexing process in progress...".to_string();
        }

        let indexed = self.docs_indexed;
        let queued = self.docs_left_to_index;
        if self.docs_in_indexing > 0 {
            let mut text = format!("Indexing {} documents...", self.docs_in_indexing);
            match (queued > 0, indexed > 0) {
                (true, true) => text.push_str(&format!(" ({queued} in queue, {indexed} indexed)")),
                (true, false) => text.push_str(&format!(" ({queued} in queue)")),
                (false, true) => text.push_str(&format!(" ({indexed} indexed)")),
                (false, false) => {}
            }
            return text;
        }

        if queued > 0 {
            return if indexed > 0 {
                format!("Fetching docs... ({queued} docs in queue, {indexed} indexed)")
            } else {
                format!("Fetching docs... ({queued} docs in queue)")
            };
        }

        format!("Indexing... ({indexed} indexed)")
    }
}
