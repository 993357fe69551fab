//! Search-then-write upsert keyed on a field expected to be unique.
//!
//! The flow is search, then one of insert, update, skip, or fail:
//!
//! - no match: write the item with `id: "-1"` so the service creates it;
//! - one match: ask the comparator; `true` writes the item over the match's
//!   id, `false` writes nothing;
//! - several matches: `ApiError::NotUnique`, nothing written.
//!
//! The two round-trips are not transactional. A failure between search and
//! write leaves the service exactly as it was after the search; nothing is
//! compensated here. The planning step is exposed on its own so hosts that
//! drive I/O themselves can run the same logic.

use serde_json::Value;
use tracing::info;

use crate::client::KvsClient;
use crate::codec::encode_value;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::transport::Transport;
use crate::types::{Matcher, Record, RpcResponse, ID_FIELD, NEW_ID, PATTERN_CMP};

/// The write an upsert settled on, before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertPlan {
    Insert(Record),
    Update(Record),
    Skip,
}

/// Result of a completed upsert. `Unchanged` means no write was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted(RpcResponse),
    Updated(RpcResponse),
    Unchanged,
}

impl UpsertOutcome {
    /// The set response, if a write happened.
    pub fn response(&self) -> Option<&RpcResponse> {
        match self {
            UpsertOutcome::Inserted(r) | UpsertOutcome::Updated(r) => Some(r),
            UpsertOutcome::Unchanged => None,
        }
    }
}

/// Decide what to write given the records the search returned.
///
/// `compare(existing, candidate)` returning `false` turns an update into a
/// skip.
pub fn plan_upsert<F>(item: &Record, key: &str, matches: Vec<Record>, compare: F) -> Result<UpsertPlan, ApiError>
where
    F: Fn(&Record, &Record) -> bool,
{
    let mut matches = matches;
    if matches.len() > 1 {
        return Err(ApiError::NotUnique {
            key: key.to_string(),
            matches: matches.len(),
        });
    }
    let Some(existing) = matches.pop() else {
        return Ok(UpsertPlan::Insert(with_id(item, Value::String(NEW_ID.to_string()))));
    };

    if !compare(&existing, item) {
        return Ok(UpsertPlan::Skip);
    }
    let id = existing
        .get(ID_FIELD)
        .cloned()
        .ok_or_else(|| ApiError::MalformedResponse(format!("matched record has no `{ID_FIELD}`")))?;
    Ok(UpsertPlan::Update(with_id(item, id)))
}

fn with_id(item: &Record, id: Value) -> Record {
    let mut record = item.clone();
    record.insert(ID_FIELD.to_string(), id);
    record
}

impl KvsClient {
    /// The single-matcher search that starts an upsert.
    ///
    /// The key value goes through the same field encoding the write will
    /// apply, so an encoded key compares against what the service stored.
    pub fn build_upsert_search(&self, item: &Record, key: &str, pattern: &str) -> Result<HttpRequest, ApiError> {
        let value = item
            .get(key)
            .ok_or_else(|| ApiError::MissingField(key.to_string()))?;
        let value = encode_value(key, value, &self.config().encoding);
        self.build_search(&[Matcher::new(key, value, pattern)])
    }

    /// Upsert with exact matching, always overwriting an existing record.
    pub fn upsert<T: Transport + ?Sized>(
        &self,
        transport: &T,
        item: &Record,
        key: &str,
    ) -> Result<UpsertOutcome, ApiError> {
        self.upsert_with(transport, item, key, PATTERN_CMP, |_, _| true)
    }

    pub fn upsert_with<T, F>(
        &self,
        transport: &T,
        item: &Record,
        key: &str,
        pattern: &str,
        compare: F,
    ) -> Result<UpsertOutcome, ApiError>
    where
        T: Transport + ?Sized,
        F: Fn(&Record, &Record) -> bool,
    {
        let search = self.build_upsert_search(item, key, pattern)?;
        let matches = self.execute(transport, &search)?.into_records();

        match plan_upsert(item, key, matches, compare)? {
            UpsertPlan::Insert(record) => {
                info!(key, "upsert: inserting new record");
                self.set(transport, &[record]).map(UpsertOutcome::Inserted)
            }
            UpsertPlan::Update(record) => {
                info!(key, id = ?record.get(ID_FIELD), "upsert: updating record");
                self.set(transport, &[record]).map(UpsertOutcome::Updated)
            }
            UpsertPlan::Skip => {
                info!(key, "upsert: comparator declined, skipping write");
                Ok(UpsertOutcome::Unchanged)
            }
        }
    }
}
