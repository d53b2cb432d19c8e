use serde::{Deserialize, Serialize};

use crate::types::{Turn, TurnRole};

/// A prior turn as the engine sees it: role and content only.
///
/// This is the wire projection of a [`Turn`]. Local metadata such as
/// `elapsed_seconds` never leaves the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The role of the turn.
    pub role: TurnRole,

    /// The text content of the turn.
    pub content: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// The outbound payload for one chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's query. Non-empty after trimming; the session controller
    /// rejects the submission before this type is ever constructed
    /// otherwise.
    pub query: String,

    /// Prior turns, oldest first, excluding the query itself.
    pub history: Vec<HistoryEntry>,
}

impl ChatRequest {
    /// Create a new chat request.
    pub fn new(query: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            query: query.into(),
            history,
        }
    }
}

/// The engine's reply to a chat request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// The assistant's formatted reply text.
    pub reply: String,

    /// Seconds the engine spent producing the reply.
    #[serde(default)]
    pub duration: f64,
}

/// Analysis metadata attached to a processed upload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Analysis {
    /// Document category the engine assigned (e.g. "Vendor Quote").
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Free-form summary of the document.
    #[serde(default)]
    pub summary: Option<String>,
}

/// The engine's response to a document upload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    /// Upload status string.
    #[serde(default)]
    pub status: Option<String>,

    /// Name of the uploaded file as the engine stored it.
    #[serde(default)]
    pub file: Option<String>,

    /// Analysis results, when the engine could parse the document.
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

/// Learned facts exposed by the engine's knowledge endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnowledgeResponse {
    /// Facts the engine has learned about the user's habits and files.
    #[serde(default)]
    pub facts: Vec<String>,
}

/// One structured record extracted from an uploaded document.
///
/// Field names follow the engine's `/quotes` rows; everything except the
/// id is optional because extraction is best-effort.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordSummary {
    /// Row identifier.
    #[serde(default)]
    pub id: Option<i64>,

    /// Vendor the record was extracted from.
    #[serde(default)]
    pub vendor_name: Option<String>,

    /// Material or item description.
    #[serde(default)]
    pub material: Option<String>,

    /// Total amount quoted.
    #[serde(default)]
    pub total: Option<String>,

    /// Currency of the total.
    #[serde(default)]
    pub currency: Option<String>,

    /// Quoted delivery lead time in weeks.
    #[serde(default)]
    pub delivery_weeks: Option<f64>,

    /// Payment terms.
    #[serde(default)]
    pub payment_terms: Option<String>,

    /// Quote date.
    #[serde(default)]
    pub date: Option<String>,
}
