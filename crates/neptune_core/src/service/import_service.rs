//! Import pipeline.
//!
//! # Responsibility
//! - Parse an export, attach tags, reconcile every record into the store.
//! - Run the search enrichment pass over the whole store afterwards.
//!
//! # Invariants
//! - Records are processed one at a time; the first error aborts the run.
//! - CSV-derived records get their address from a by-id lookup before their
//!   identity key is computed.
//! - Only `NotFound` from the store leads to creating a record.

use crate::ingest::{InputFormat, ParseError, PlaceReader};
use crate::lookup::{enrich_by_id, enrich_by_search, LookupError, PlacesApi};
use crate::model::identity::identity_key;
use crate::model::place::Place;
use crate::repo::place_repo::PlaceRepository;
use crate::repo::record_store::{RecordStore, StoreError};
use crate::service::reconcile::{reconcile, Reconciled};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug)]
pub enum ImportError {
    Parse(ParseError),
    Lookup(LookupError),
    Store(StoreError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Lookup(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Lookup(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ParseError> for ImportError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<LookupError> for ImportError {
    fn from(value: LookupError) -> Self {
        Self::Lookup(value)
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Counters reported after a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records produced by the reader.
    pub parsed: usize,
    /// Records written under a new identity key.
    pub created: usize,
    /// Records merged into an existing stored place.
    pub merged: usize,
    /// Stored places filled in by the search enrichment pass.
    pub enriched: usize,
}

/// Import use-case over a record store and a lookup provider.
pub struct ImportService<S: RecordStore, A: PlacesApi> {
    repo: PlaceRepository<S>,
    api: A,
}

impl<S: RecordStore, A: PlacesApi> ImportService<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            repo: PlaceRepository::new(store),
            api,
        }
    }

    /// Runs the full pipeline for one export file.
    ///
    /// # Contract
    /// - Every parsed record gets `tags` (replacing reader output).
    /// - CSV records are refreshed by id before reconciliation.
    /// - After reconciliation every stored place without a provider id is
    ///   searched, then every stored place is rewritten.
    pub fn import<R: PlaceReader>(
        &self,
        reader: &R,
        bytes: &[u8],
        tags: &[String],
    ) -> ImportResult<ImportSummary> {
        let started_at = Instant::now();
        let format = reader.format();
        info!("event=import module=import status=start format={format}");

        let result = self.run_import(reader, bytes, tags);
        match &result {
            Ok(summary) => info!(
                "event=import module=import status=ok format={format} parsed={} created={} merged={} enriched={} duration_ms={}",
                summary.parsed,
                summary.created,
                summary.merged,
                summary.enriched,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=import module=import status=error format={format} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn run_import<R: PlaceReader>(
        &self,
        reader: &R,
        bytes: &[u8],
        tags: &[String],
    ) -> ImportResult<ImportSummary> {
        let mut imported = reader.read_places(bytes)?;
        let mut summary = ImportSummary {
            parsed: imported.len(),
            ..ImportSummary::default()
        };

        if reader.format() == InputFormat::Csv {
            enrich_by_id(&self.api, &mut imported)?;
        }

        for mut place in imported {
            place.tags = tags.to_vec();
            if self.reconcile_into_store(place)?.is_merge() {
                summary.merged += 1;
            } else {
                summary.created += 1;
            }
        }

        summary.enriched = self.enrich_store()?;
        Ok(summary)
    }

    /// Reconciles one place with the store and persists the result.
    pub fn reconcile_into_store(&self, incoming: Place) -> ImportResult<Reconciled> {
        let key = identity_key(&incoming);
        let existing = self.repo.find(&key)?;
        let reconciled = reconcile(existing, incoming);
        self.repo.save(reconciled.place())?;
        info!(
            "event=import_place module=import status=ok outcome={} key={key}",
            if reconciled.is_merge() { "merged" } else { "created" }
        );
        Ok(reconciled)
    }

    /// Searches every stored place lacking a provider id and rewrites all.
    pub fn enrich_store(&self) -> ImportResult<usize> {
        let mut stored = self.repo.list()?;
        let enriched = enrich_by_search(&self.api, &mut stored)?;
        for place in &stored {
            self.repo.save(place)?;
        }
        Ok(enriched)
    }

    pub fn repository(&self) -> &PlaceRepository<S> {
        &self.repo
    }
}
