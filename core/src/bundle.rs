//! Display-time grouping of search hits.
//!
//! The server ranks individual fragments, so one Drive document can show up
//! several times in a page of results. Bundling folds those fragments into a
//! single entry before rendering.

use precept_protocol::DataSource;
use precept_protocol::ResultType;
use precept_protocol::SearchResultDetails;
use tracing::debug;

/// A hit after bundling: merged content, best score.
pub type BundledResult = SearchResultDetails;

/// Identity of a hit for bundling purposes. Score and content are left out
/// so fragments of the same document at different scores still match.
#[derive(PartialEq, Eq)]
struct BundleKey<'a> {
    title: &'a str,
    kind: &'a ResultType,
    author: &'a str,
    time: &'a str,
    data_source: &'a DataSource,
}

impl<'a> BundleKey<'a> {
    fn of(result: &'a SearchResultDetails) -> Self {
        Self {
            title: &result.title,
            kind: &result.kind,
            author: &result.author,
            time: &result.time,
            data_source: &result.data_source,
        }
    }
}

/// Fold a ranked result list into display entries, keeping rank order.
///
/// - Google Drive hits with the same identity merge into the first one:
///   content is concatenated in encounter order and the higher score wins.
/// - Slack hits are never merged and keep only their snippet fragment.
/// - Everything else passes through untouched.
pub fn bundle(results: &[SearchResultDetails]) -> Vec<BundledResult> {
    let mut bundled: Vec<BundledResult> = Vec::with_capacity(results.len());
    for result in results {
        match result.data_source {
            DataSource::GoogleDrive => {
                let key = BundleKey::of(result);
                let found = bundled
                    .iter()
                    .position(|existing| BundleKey::of(existing) == key);
                match found {
                    Some(index) => merge_into(&mut bundled[index], result),
                    None => bundled.push(result.clone()),
                }
            }
            DataSource::Slack => {
                let mut message = result.clone();
                message.content.truncate(1);
                bundled.push(message);
            }
            DataSource::Other(_) => bundled.push(result.clone()),
        }
    }
    debug!(
        input = results.len(),
        output = bundled.len(),
        "bundled search results"
    );
    bundled
}

fn merge_into(target: &mut BundledResult, fragment: &SearchResultDetails) {
    target.content.extend(fragment.content.iter().cloned());
    target.score = target.score.max(fragment.score);
}
