//! Reader session: the active document, the search over it, and the
//! recent-uploads list.

use std::sync::Arc;

use crate::error::{ExtractionError, StoreError};
use crate::highlight::{render, Segment};
use crate::navigator::MatchNavigator;
use crate::pipeline::ExtractionPipeline;
use crate::recent::RecentUploads;
use crate::search::{search, MatchSet};
use crate::types::Document;

/// Identifies one extraction attempt. Only the most recently issued ticket
/// may apply its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The document was added and is now active.
    Loaded,
    /// A newer extraction started before this one finished; result dropped.
    Stale,
}

pub struct Session {
    pipeline: Arc<ExtractionPipeline>,
    store: Box<dyn RecentUploads>,
    documents: Vec<Document>,
    active: Option<usize>,
    query: String,
    matches: MatchSet,
    navigator: MatchNavigator,
    generation: u64,
}

impl Session {
    /// Start a session with whatever the store hands back.
    pub fn new(
        pipeline: Arc<ExtractionPipeline>,
        store: Box<dyn RecentUploads>,
    ) -> Result<Self, StoreError> {
        let documents = store.load()?;
        tracing::debug!(documents = documents.len(), "loaded recent uploads");
        Ok(Self {
            pipeline,
            store,
            documents,
            active: None,
            query: String::new(),
            matches: MatchSet::default(),
            navigator: MatchNavigator::default(),
            generation: 0,
        })
    }

    pub fn pipeline(&self) -> Arc<ExtractionPipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|i| self.documents.get(i))
    }

    /// Supersede any extraction still in flight.
    pub fn begin_extraction(&mut self) -> ExtractionTicket {
        self.generation += 1;
        ExtractionTicket(self.generation)
    }

    /// Apply the result of the extraction identified by `ticket`.
    pub fn finish_extraction(
        &mut self,
        ticket: ExtractionTicket,
        result: Result<Document, ExtractionError>,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        if ticket.0 != self.generation {
            tracing::warn!(
                ticket = ticket.0,
                current = self.generation,
                "discarding superseded extraction result"
            );
            return Ok(ExtractionOutcome::Stale);
        }

        let document = result?;
        if let Err(e) = self.store.append(&document) {
            tracing::warn!(error = %e, file = %document.name, "could not save to recent uploads");
        }
        self.documents.push(document);
        self.activate(self.documents.len() - 1);
        Ok(ExtractionOutcome::Loaded)
    }

    /// Extract a file and make it the active document.
    pub async fn open(
        &mut self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let ticket = self.begin_extraction();
        let pipeline = self.pipeline();
        let result = pipeline.run(file_name, bytes).await;
        self.finish_extraction(ticket, result)
    }

    /// Make a recent document active. Returns false for an unknown index.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.documents.len() {
            return false;
        }
        self.activate(index);
        true
    }

    fn activate(&mut self, index: usize) {
        self.active = Some(index);
        self.query.clear();
        self.recompute();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.recompute();
    }

    fn recompute(&mut self) {
        let text = self
            .active
            .and_then(|i| self.documents.get(i))
            .map(|d| d.text.as_str())
            .unwrap_or("");
        self.matches = search(text, &self.query);
        self.navigator.reset(&self.matches);
    }

    pub fn matches(&self) -> &MatchSet {
        &self.matches
    }

    pub fn cursor(&self) -> Option<usize> {
        self.navigator.cursor()
    }

    pub fn next_match(&mut self) {
        self.navigator.next();
    }

    pub fn prev_match(&mut self) {
        self.navigator.prev();
    }

    pub fn select_match(&mut self, index: usize) {
        self.navigator.select(index);
    }

    pub fn position_label(&self) -> Option<String> {
        self.navigator.position_label()
    }

    /// Display segments of the active document; empty when none is active.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        match self.active() {
            Some(doc) => render(&doc.text, &self.matches, self.cursor()),
            None => Vec::new(),
        }
    }

    pub fn reset_viewer(&mut self) {
        self.active = None;
        self.query.clear();
        self.recompute();
    }

    pub fn clear_recent(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.documents.clear();
        self.reset_viewer();
        Ok(())
    }
}
