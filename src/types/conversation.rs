use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::types::{HistoryEntry, Turn};

/// Append-only, ordered history of turns in one session.
///
/// Insertion order is significant: it defines both the render order and
/// the history sent to the engine on subsequent requests. Turns are never
/// removed or mutated in place; the only destructive operation is a full
/// [`clear`](Conversation::clear) when the user resets the session.
///
/// The conversation has exactly one mutator, the session controller. The
/// renderer and classifier only ever read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a turn to the end of the conversation.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns all turns, oldest first, for rendering.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the role/content projection used to build request
    /// envelopes. Local metadata (durations) is stripped.
    pub fn snapshot_for_history(&self) -> Vec<HistoryEntry> {
        self.turns.iter().map(HistoryEntry::from).collect()
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the conversation has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Removes every turn. Used only for a user-requested session reset.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Saves the conversation to a transcript file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.turns);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Loads a conversation from a transcript file, replacing the current
    /// turns.
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        self.turns = transcript.turns;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    turns: Vec<Turn>,
}

impl TranscriptFile {
    fn new(turns: &[Turn]) -> Self {
        Self {
            version: 1,
            turns: turns.to_vec(),
        }
    }
}
