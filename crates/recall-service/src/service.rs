//! Retrieval orchestrator.
//!
//! [`KnowledgeService`] composes the embedder, ranker, generator, rate
//! governor and repository into item ingestion, regeneration and question
//! answering. Embedding and generation failures degrade; rate-limit,
//! not-found and validation failures surface as typed errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use recall_core::defaults::{
    AI_UNAVAILABLE_ANSWER, CONTEXT_CHAR_BUDGET, GENERATION_FAILED_ANSWER, NO_ITEMS_ANSWER,
    NO_RELEVANT_ITEMS_ANSWER, RATE_LIMIT_PURGE_EVERY, RETRIEVAL_TOP_K, UNKNOWN_CLIENT_KEY,
};
use recall_core::{
    validate_question, Answer, AnswerOutcome, EmbeddingBackend, Error, GenerationBackend,
    ItemDraft, ItemPatch, ItemUpdate, KnowledgeItem, KnowledgeRepository, ListItemsRequest,
    ListItemsResponse, NewKnowledgeItem, RateGovernor, Result, ScoredItem, SourceRef,
};
use recall_inference::{answer_prompt, build_context, ContextEntry, Embedder, EmbeddingCache, Generator};
use recall_search::{BruteForceRanker, SimilarityRanker};

use crate::config::ServiceConfig;
use crate::rate_limit::{build_governor, FixedWindowGovernor};

/// Knowledge base operations over injected collaborators.
#[derive(Clone)]
pub struct KnowledgeService {
    repository: Arc<dyn KnowledgeRepository>,
    embedder: Embedder,
    generator: Generator,
    ranker: Arc<dyn SimilarityRanker>,
    governor: Arc<dyn RateGovernor>,
    /// Admissions seen, shared across clones; drives the expired-record sweep.
    admissions: Arc<AtomicU64>,
    purge_every: u64,
    top_k: usize,
    context_char_budget: usize,
}

impl KnowledgeService {
    /// Service with the brute-force ranker, the default fixed-window
    /// governor (15 requests / 60 s) and default retrieval settings.
    pub fn new(
        repository: Arc<dyn KnowledgeRepository>,
        embedder: Embedder,
        generator: Generator,
    ) -> Self {
        Self {
            repository,
            embedder,
            generator,
            ranker: Arc::new(BruteForceRanker),
            governor: Arc::new(FixedWindowGovernor::default()),
            admissions: Arc::new(AtomicU64::new(0)),
            purge_every: RATE_LIMIT_PURGE_EVERY,
            top_k: RETRIEVAL_TOP_K,
            context_char_budget: CONTEXT_CHAR_BUDGET,
        }
    }

    /// Wire a service from configuration and optional external backends.
    ///
    /// Without an embedding backend the hash embedder is used; without a
    /// generation backend AI features degrade to their fallbacks.
    pub fn from_config(
        config: &ServiceConfig,
        repository: Arc<dyn KnowledgeRepository>,
        embedding_backend: Option<Arc<dyn EmbeddingBackend>>,
        generation_backend: Option<Arc<dyn GenerationBackend>>,
    ) -> Result<Self> {
        let embedder = Embedder::from_optional(embedding_backend)
            .with_cache(EmbeddingCache::new(config.embedding_cache_size));
        let generator = Generator::new(generation_backend).with_timeout(config.generation_timeout);
        let governor = build_governor(&config.rate_limit)?;

        info!(
            subsystem = "service",
            embedding_model = embedder.model_name(),
            dimension = embedder.dimension(),
            generation_model = generator.model_name().unwrap_or("(none)"),
            top_k = config.top_k,
            rate_limit_enabled = config.rate_limit.enabled,
            rate_limit_strategy = %config.rate_limit.strategy,
            "Knowledge service configured"
        );

        Ok(Self::new(repository, embedder, generator)
            .with_governor(governor)
            .with_top_k(config.top_k)
            .with_context_char_budget(config.context_char_budget))
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn SimilarityRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_governor(mut self, governor: Arc<dyn RateGovernor>) -> Self {
        self.governor = governor;
        self
    }

    /// Sweep expired governor records every `every` admissions (min 1).
    pub fn with_purge_every(mut self, every: u64) -> Self {
        self.purge_every = every.max(1);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_context_char_budget(mut self, budget: usize) -> Self {
        self.context_char_budget = budget;
        self
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn repository(&self) -> &Arc<dyn KnowledgeRepository> {
        &self.repository
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Validate, enrich and persist a new item.
    ///
    /// The embedding, summary and tags are computed concurrently before the
    /// single write. Generation failures leave `summary = None` and empty
    /// tags; an embedding failure leaves the embedding empty.
    #[instrument(skip(self, input), fields(subsystem = "service", component = "knowledge", op = "ingest"))]
    pub async fn ingest(&self, input: NewKnowledgeItem) -> Result<KnowledgeItem> {
        input.validate()?;
        let start = Instant::now();

        let (embedding, enrichment) = tokio::join!(
            self.embedder.embed(&input.content),
            self.generator.enrich(&input.content)
        );

        let item = self
            .repository
            .create(ItemDraft {
                title: input.title,
                content: input.content,
                item_type: input.item_type,
                tags: enrichment.tags,
                summary: enrichment.summary,
                embedding,
            })
            .await?;

        info!(
            item_id = %item.id,
            item_type = %item.item_type,
            has_summary = item.summary.is_some(),
            tag_count = item.tags.len(),
            has_embedding = item.has_embedding(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Knowledge item created"
        );
        Ok(item)
    }

    /// [`ingest`](Self::ingest) gated by the rate governor, since creation
    /// triggers billed summary and tag calls.
    pub async fn ingest_for_client(
        &self,
        client_key: &str,
        input: NewKnowledgeItem,
    ) -> Result<KnowledgeItem> {
        self.admit(client_key)?;
        self.ingest(input).await
    }

    /// Recompute summary, tags and embedding from the current content and
    /// overwrite all three in one update.
    #[instrument(skip(self), fields(subsystem = "service", component = "knowledge", op = "regenerate"))]
    pub async fn regenerate(&self, id: Uuid) -> Result<KnowledgeItem> {
        let item = self
            .repository
            .get(id)
            .await?
            .ok_or(Error::ItemNotFound(id))?;
        let start = Instant::now();

        let (embedding, enrichment) = tokio::join!(
            self.embedder.embed(&item.content),
            self.generator.enrich(&item.content)
        );

        let updated = self
            .repository
            .update(
                id,
                ItemPatch::derived(enrichment.summary, enrichment.tags, embedding),
            )
            .await?;

        info!(
            item_id = %id,
            has_summary = updated.summary.is_some(),
            tag_count = updated.tags.len(),
            has_embedding = updated.has_embedding(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Knowledge item regenerated"
        );
        Ok(updated)
    }

    // =========================================================================
    // QUESTION ANSWERING
    // =========================================================================

    /// Answer `question` from the stored items under the generator's
    /// default deadline.
    pub async fn answer(&self, question: &str, client_key: &str) -> Result<Answer> {
        self.answer_with_timeout(question, client_key, self.generator.timeout())
            .await
    }

    /// Answer `question`, bounding the generation call by `timeout`.
    ///
    /// The governor is consulted first; a denied request does no further
    /// work. Empty stores and incomparable embeddings short-circuit before
    /// any generation call.
    #[instrument(
        skip(self, question, timeout),
        fields(subsystem = "service", component = "knowledge", op = "answer", question_len = question.len())
    )]
    pub async fn answer_with_timeout(
        &self,
        question: &str,
        client_key: &str,
        timeout: Duration,
    ) -> Result<Answer> {
        self.admit(client_key)?;
        validate_question(question)?;
        let start = Instant::now();

        let query = self.embedder.embed(question).await;
        let candidates = self.repository.embedded_items().await?;
        let candidate_count = candidates.len();

        if candidates.is_empty() {
            debug!("Knowledge base is empty, skipping generation");
            return Ok(fixed_answer(NO_ITEMS_ANSWER, AnswerOutcome::NoItems));
        }
        if query.is_empty() {
            warn!("Question embedding unavailable, skipping generation");
            return Ok(fixed_answer(
                NO_RELEVANT_ITEMS_ANSWER,
                AnswerOutcome::NoRelevantItems,
            ));
        }

        let ranked = self.ranker.rank(&query, candidates, self.top_k);
        if ranked.is_empty() {
            debug!(candidate_count, "No comparable items, skipping generation");
            return Ok(fixed_answer(
                NO_RELEVANT_ITEMS_ANSWER,
                AnswerOutcome::NoRelevantItems,
            ));
        }

        let sources: Vec<SourceRef> = ranked.iter().map(SourceRef::from).collect();
        let (answer, outcome) = self.generate_answer(question, &ranked, timeout).await;

        info!(
            candidate_count,
            result_count = sources.len(),
            outcome = ?outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );
        Ok(Answer {
            answer,
            sources,
            outcome,
        })
    }

    async fn generate_answer(
        &self,
        question: &str,
        ranked: &[ScoredItem],
        timeout: Duration,
    ) -> (String, AnswerOutcome) {
        if !self.generator.is_available() {
            warn!("No generation backend configured, returning fallback answer");
            return (AI_UNAVAILABLE_ANSWER.to_string(), AnswerOutcome::Unavailable);
        }

        let entries: Vec<ContextEntry<'_>> = ranked
            .iter()
            .map(|s| ContextEntry {
                title: &s.item.title,
                content: &s.item.content,
            })
            .collect();
        let context = build_context(&entries, self.context_char_budget);
        let prompt = answer_prompt(question, &context);

        match self.generator.complete_with_timeout(&prompt, timeout).await {
            Ok(text) => (text, AnswerOutcome::Generated),
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "Answer generation timed out");
                (GENERATION_FAILED_ANSWER.to_string(), AnswerOutcome::TimedOut)
            }
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                (GENERATION_FAILED_ANSWER.to_string(), AnswerOutcome::Failed)
            }
        }
    }

    // =========================================================================
    // PASS-THROUGH
    // =========================================================================

    pub async fn get(&self, id: Uuid) -> Result<KnowledgeItem> {
        self.repository
            .get(id)
            .await?
            .ok_or(Error::ItemNotFound(id))
    }

    pub async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
        self.repository.list(req).await
    }

    /// Apply a user edit. Summary, tags and embedding are left untouched;
    /// use [`regenerate`](Self::regenerate) to refresh them.
    #[instrument(skip(self, update), fields(subsystem = "service", component = "knowledge", op = "update"))]
    pub async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<KnowledgeItem> {
        update.validate()?;
        let item = self.repository.update(id, update.into()).await?;
        info!(item_id = %id, "Knowledge item updated");
        Ok(item)
    }

    #[instrument(skip(self), fields(subsystem = "service", component = "knowledge", op = "delete"))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete(id).await? {
            return Err(Error::ItemNotFound(id));
        }
        info!(item_id = %id, "Knowledge item deleted");
        Ok(())
    }

    fn admit(&self, client_key: &str) -> Result<()> {
        let client_key = effective_client_key(client_key);
        let seen = self.admissions.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % self.purge_every == 0 {
            let removed = self.governor.purge_expired();
            debug!(removed, "Swept expired rate records");
        }

        if self.governor.allow(client_key) {
            Ok(())
        } else {
            warn!(client_key, "Request rejected by rate governor");
            Err(Error::RateLimited {
                client_key: client_key.to_string(),
            })
        }
    }
}

/// Blank caller identities share one bucket.
pub fn effective_client_key(client_key: &str) -> &str {
    let trimmed = client_key.trim();
    if trimmed.is_empty() {
        UNKNOWN_CLIENT_KEY
    } else {
        trimmed
    }
}

fn fixed_answer(text: &str, outcome: AnswerOutcome) -> Answer {
    Answer {
        answer: text.to_string(),
        sources: Vec::new(),
        outcome,
    }
}
