// Web search providers
//
// Search is a black box to the conversation controller: a query in, ranked
// title/description records out. Ranking and fact extraction happen in
// `conversation::search`.

use anyhow::Result;
use async_trait::async_trait;

use crate::conversation::SearchRecord;

pub mod brave;

pub use brave::BraveSearchProvider;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `count` ranked records for `query`; may return fewer
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchRecord>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
