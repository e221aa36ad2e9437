//! Archive fetchers and record normalization
//!
//! [`ArchiveSource`] is the seam between the crawl scheduler and the remote
//! archive. [`normalize`] flattens a raw monthly document into [`Record`]s.

use crate::{MonthUnit, Record};
use async_trait::async_trait;
use serde_json::Value;

pub mod archive;

/// JSON pointer to the article list inside an archive document
pub const DOCS_POINTER: &str = "/response/docs";

/// Fetcher errors
///
/// Every variant is a remote failure: the scheduler aborts the current
/// direction on any of them and never retries.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Request never produced a response
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("archive request for {unit} failed: HTTP {status}")]
    HttpStatus {
        /// Requested month
        unit: MonthUnit,
        /// Response status code
        status: u16,
    },

    /// Body was not valid JSON
    #[error("parse error: {0}")]
    ParseError(String),

    /// Document did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An article lacked a field the record needs
    #[error("article {index} is missing field '{field}'")]
    MissingField {
        /// Position of the article in the document
        index: usize,
        /// Field name
        field: &'static str,
    },

    /// HTTP client could not be built
    #[error("client error: {0}")]
    ClientError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Raw archive document for one month
#[derive(Debug, Clone)]
pub struct ArchiveResponse {
    unit: MonthUnit,
    body: Value,
}

impl ArchiveResponse {
    /// Wrap a decoded document
    pub fn new(unit: MonthUnit, body: Value) -> Self {
        Self { unit, body }
    }

    /// Month this document was requested for
    pub fn unit(&self) -> MonthUnit {
        self.unit
    }

    /// Decoded JSON body
    pub fn body(&self) -> &Value {
        &self.body
    }

    fn docs(&self) -> FetcherResult<&[Value]> {
        self.body
            .pointer(DOCS_POINTER)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                FetcherError::InvalidResponse(format!(
                    "{}: no article list at {DOCS_POINTER}",
                    self.unit
                ))
            })
    }
}

/// Source of monthly archive documents
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Issue one request for `unit`
    ///
    /// Non-success statuses are errors. Implementations must not retry.
    async fn fetch(&self, unit: MonthUnit) -> FetcherResult<ArchiveResponse>;

    /// Get the base URL for this source
    fn base_url(&self) -> &str;
}

/// Flatten an archive document into records, lazily and in document order
///
/// The iterator makes one pass over the article list. Errors surface when the
/// offending item is reached: a missing article list yields a single error,
/// and an article lacking `abstract`, `lead_paragraph` or `pub_date` yields
/// [`FetcherError::MissingField`] at its position.
pub fn normalize(response: &ArchiveResponse) -> impl Iterator<Item = FetcherResult<Record>> + '_ {
    let (docs, shape_error) = match response.docs() {
        Ok(docs) => (docs, None),
        Err(e) => (&[][..], Some(e)),
    };

    shape_error.map(Err).into_iter().chain(
        docs.iter()
            .enumerate()
            .map(|(index, article)| extract_record(index, article)),
    )
}

fn extract_record(index: usize, article: &Value) -> FetcherResult<Record> {
    Ok(Record {
        date: text_field(index, article, "pub_date")?,
        headline: text_field(index, article, "abstract")?,
        lead_paragraph: text_field(index, article, "lead_paragraph")?,
    })
}

/// Extract a field verbatim; `null` becomes an empty string, an absent key is an error
fn text_field(index: usize, article: &Value, field: &'static str) -> FetcherResult<String> {
    match article.get(field) {
        None => Err(FetcherError::MissingField { index, field }),
        Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(FetcherError::InvalidResponse(format!(
            "article {index} field '{field}' is not text: {other}"
        ))),
    }
}
