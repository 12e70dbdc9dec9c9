use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use time::{Date, OffsetDateTime};

use crate::backend::{
    ApplyCounts, BackendError, JournalBackend, LoadedDocument, LoadedEntry, ValidationError,
};
use crate::config::EditorConfig;
use crate::drafts::DraftStore;
use crate::model::{DeletedEntry, EntryMapping};

/// A line that begins with a recognised entry symbol. Used only to gate
/// live validation; full parsing stays on the backend side.
static ENTRY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([.\-o?>^])\s*(.*)$").expect("valid entry-line pattern"));

/// Single source of truth for one calendar day's in-progress edit
/// session: current and baseline document text, pending deletions,
/// validation errors, draft presence, and the debounce timer that drives
/// validation and autosave.
#[derive(Debug)]
pub struct DocumentSession {
    date: Date,
    document: String,
    baseline: String,
    mappings: Vec<EntryMapping>,
    deleted: IndexMap<String, String>,
    validation_errors: Vec<ValidationError>,
    loading: bool,
    load_error: Option<String>,
    last_saved_at: Option<OffsetDateTime>,
    has_draft: bool,
    debounce: Duration,
    min_entry_len: usize,
    flush_deadline: Option<Instant>,
    load_generation: u64,
}

/// Handle for one in-flight load. Completions whose ticket generation is
/// no longer current are discarded, so a load superseded by a newer one
/// can never clobber its result.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    date: Date,
}

impl LoadTicket {
    pub fn date(&self) -> Date {
        self.date
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub validated: bool,
    pub draft_persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Applied { counts: ApplyCounts },
    Rejected { errors: Vec<ValidationError> },
}

impl DocumentSession {
    pub fn new(date: Date, config: &EditorConfig) -> Self {
        Self {
            date,
            document: String::new(),
            baseline: String::new(),
            mappings: Vec::new(),
            deleted: IndexMap::new(),
            validation_errors: Vec::new(),
            loading: false,
            load_error: None,
            last_saved_at: None,
            has_draft: false,
            debounce: config.debounce_duration(),
            min_entry_len: config.min_entry_len,
            flush_deadline: None,
            load_generation: 0,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn last_saved_at(&self) -> Option<OffsetDateTime> {
        self.last_saved_at
    }

    pub fn has_draft(&self) -> bool {
        self.has_draft
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    pub fn deleted_entries(&self) -> Vec<DeletedEntry> {
        self.deleted
            .iter()
            .map(|(entity_id, content)| DeletedEntry {
                entity_id: entity_id.clone(),
                content: content.clone(),
            })
            .collect()
    }

    /// Dirty is derived, never stored: unsaved text or pending deletions.
    pub fn is_dirty(&self) -> bool {
        self.document != self.baseline || !self.deleted.is_empty()
    }

    pub fn has_pending_flush(&self) -> bool {
        self.flush_deadline.is_some()
    }

    /// Starts a load for `date`, superseding any load still in flight.
    /// The returned ticket must be handed back to [`complete_load`]
    /// together with the backend's response.
    ///
    /// [`complete_load`]: DocumentSession::complete_load
    pub fn begin_load(&mut self, date: Date) -> LoadTicket {
        self.load_generation += 1;
        self.date = date;
        self.loading = true;
        self.load_error = None;
        self.flush_deadline = None;
        LoadTicket {
            generation: self.load_generation,
            date,
        }
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedDocument, BackendError>,
        store: &DraftStore,
    ) {
        if ticket.generation != self.load_generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.load_generation,
                "discarding superseded load result"
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(loaded) => {
                self.mappings = build_mappings(&loaded.document, &loaded.entries);
                self.document = loaded.document.clone();
                self.baseline = loaded.document;
                self.deleted.clear();
                self.validation_errors.clear();
                self.reconcile_draft(store);
            }
            Err(err) => {
                self.document.clear();
                self.baseline.clear();
                self.mappings.clear();
                self.deleted.clear();
                self.validation_errors.clear();
                self.has_draft = false;
                tracing::error!(error = %err, date = %crate::model::date_key(self.date), "document load failed");
                self.load_error = Some(err.message().to_string());
            }
        }
    }

    /// Synchronous convenience around [`begin_load`] / [`complete_load`]
    /// for hosts that block on the backend call.
    ///
    /// [`begin_load`]: DocumentSession::begin_load
    /// [`complete_load`]: DocumentSession::complete_load
    pub fn load<B: JournalBackend + ?Sized>(&mut self, date: Date, backend: &B, store: &DraftStore) {
        let ticket = self.begin_load(date);
        let result = backend.load_document(ticket.date());
        self.complete_load(ticket, result, store);
    }

    pub fn set_document(&mut self, text: impl Into<String>) {
        self.set_document_at(text, Instant::now());
    }

    /// Replaces the document text and restarts the debounce timer. When
    /// the edit strictly lowers the non-blank line count, mapped lines
    /// that were present before and are gone now are flagged as pending
    /// deletions. Same-count edits never flag anything; swapping a
    /// delete against an insert in one edit goes undetected.
    pub fn set_document_at(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        if non_blank_line_count(&text) < non_blank_line_count(&self.document) {
            let prev_lines: HashSet<&str> = self.document.lines().collect();
            let new_lines: HashSet<&str> = text.lines().collect();
            for mapping in &self.mappings {
                if prev_lines.contains(mapping.full_line.as_str())
                    && !new_lines.contains(mapping.full_line.as_str())
                {
                    self.deleted
                        .entry(mapping.entity_id.clone())
                        .or_insert_with(|| mapping.content.clone());
                }
            }
        }
        self.document = text;
        self.flush_deadline = Some(now + self.debounce);
    }

    pub fn poll<B: JournalBackend + ?Sized>(
        &mut self,
        backend: &B,
        store: &DraftStore,
    ) -> Result<Option<FlushReport>> {
        self.poll_at(backend, store, Instant::now())
    }

    /// Fires the debounced validate-and-autosave cycle once `now` has
    /// reached the deadline armed by the last edit. Validation only runs
    /// when every entry line carries enough content to be worth sending;
    /// the draft snapshot is persisted either way while the session is
    /// dirty. A validation transport failure is logged and otherwise
    /// ignored here.
    pub fn poll_at<B: JournalBackend + ?Sized>(
        &mut self,
        backend: &B,
        store: &DraftStore,
        now: Instant,
    ) -> Result<Option<FlushReport>> {
        let Some(deadline) = self.flush_deadline else {
            return Ok(None);
        };
        if now < deadline {
            return Ok(None);
        }
        self.flush_deadline = None;

        let mut report = FlushReport::default();
        if ready_for_validation(&self.document, self.min_entry_len) {
            match backend.validate_document(&self.document) {
                Ok(outcome) => {
                    self.validation_errors = outcome.errors;
                    report.validated = true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "live validation failed; keeping previous errors");
                }
            }
        }
        if self.is_dirty() {
            let deleted_ids: Vec<String> = self.deleted.keys().cloned().collect();
            store.save(self.date, &self.document, &deleted_ids)?;
            report.draft_persisted = true;
        }
        Ok(Some(report))
    }

    /// Validates and applies the document text as it stands at the
    /// moment of the call. Invalid documents replace the error list and
    /// come back as `Rejected` without touching the backend's apply. A
    /// transport failure on either round-trip leaves the session exactly
    /// as it was so the user can retry.
    pub fn save<B: JournalBackend + ?Sized>(
        &mut self,
        backend: &B,
        store: &DraftStore,
    ) -> Result<SaveOutcome, BackendError> {
        let snapshot = self.document.clone();
        let outcome = backend.validate_document(&snapshot)?;
        if !outcome.is_valid {
            self.validation_errors = outcome.errors.clone();
            return Ok(SaveOutcome::Rejected {
                errors: outcome.errors,
            });
        }

        let deleted_ids: Vec<String> = self.deleted.keys().cloned().collect();
        let counts = backend.apply_document(&snapshot, self.date, &deleted_ids)?;

        self.baseline = snapshot;
        self.deleted.clear();
        self.validation_errors.clear();
        self.last_saved_at = Some(OffsetDateTime::now_utc());
        self.flush_deadline = None;
        if let Err(err) = store.clear(self.date) {
            tracing::warn!(?err, "failed to purge draft after save");
        }
        self.has_draft = false;
        Ok(SaveOutcome::Applied { counts })
    }

    /// Resets the text to the baseline and drops pending deletions and
    /// validation errors. The persisted draft is left alone.
    pub fn discard_changes(&mut self) {
        self.document = self.baseline.clone();
        self.deleted.clear();
        self.validation_errors.clear();
        self.flush_deadline = None;
    }

    /// Replaces the current text with the persisted draft, if any.
    /// Returns whether a draft was applied. The record stays in the
    /// store until a save or an explicit discard removes it.
    pub fn restore_draft(&mut self, store: &DraftStore) -> bool {
        self.has_draft = false;
        match store.read(self.date) {
            Some(draft) => {
                self.document = draft.document;
                true
            }
            None => false,
        }
    }

    /// Purges the persisted draft without touching the current text.
    pub fn discard_draft(&mut self, store: &DraftStore) -> Result<()> {
        store.clear(self.date)?;
        self.has_draft = false;
        Ok(())
    }

    /// Removes one entry from the pending-deletion set.
    pub fn restore_deleted(&mut self, entity_id: &str) -> Option<DeletedEntry> {
        self.deleted
            .shift_remove(entity_id)
            .map(|content| DeletedEntry {
                entity_id: entity_id.to_string(),
                content,
            })
    }

    /// Host unmount: voids any in-flight load completion and cancels the
    /// pending debounce timer.
    pub fn detach(&mut self) {
        self.load_generation += 1;
        self.loading = false;
        self.flush_deadline = None;
    }

    fn reconcile_draft(&mut self, store: &DraftStore) {
        match store.read(self.date) {
            Some(draft) if draft.document == self.document && draft.deleted_ids.is_empty() => {
                // Identical to the server document: no unsaved work left.
                if let Err(err) = store.clear(self.date) {
                    tracing::warn!(?err, "failed to purge stale draft");
                }
                self.has_draft = false;
            }
            Some(_) => {
                self.has_draft = true;
            }
            None => {
                self.has_draft = false;
            }
        }
    }
}

fn build_mappings(document: &str, entries: &[LoadedEntry]) -> Vec<EntryMapping> {
    entries
        .iter()
        .filter_map(|entry| {
            match document
                .lines()
                .find(|line| line.contains(entry.content.as_str()))
            {
                Some(line) => Some(EntryMapping {
                    entity_id: entry.entity_id.clone(),
                    content: entry.content.clone(),
                    full_line: line.to_string(),
                }),
                None => {
                    tracing::debug!(
                        entity_id = %entry.entity_id,
                        "entry content not present in loaded document; skipping mapping"
                    );
                    None
                }
            }
        })
        .collect()
}

fn non_blank_line_count(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}

/// Every entry-symbol line must carry at least `min_len` characters of
/// content before the full document is worth a validation round-trip.
fn ready_for_validation(document: &str, min_len: usize) -> bool {
    document.lines().all(|line| {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return true;
        }
        match ENTRY_LINE.captures(trimmed) {
            Some(caps) => caps[2].trim().chars().count() >= min_len,
            None => true,
        }
    })
}
