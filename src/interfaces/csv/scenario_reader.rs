use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Register card `uid` holding balance `value`.
    Card,
    /// Put card `uid` in the reader's field.
    Tap,
    /// Take the card out of the field.
    Lift,
    /// Deliver a top-up for `uid` with amount `value`.
    Topup,
    /// Deliver `value` verbatim on the top-up topic.
    Payload,
    /// Sever the broker connection.
    Drop,
}

/// One row of a scenario script: something that happens before tick `tick`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct ScenarioEvent {
    pub tick: u64,
    pub event: EventKind,
    pub uid: Option<String>,
    pub value: Option<String>,
}

/// Reads scenario events from a CSV source with the header
/// `tick,event,uid,value`.
pub struct ScenarioReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScenarioReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows; a bad row yields an error and the rest
    /// continue.
    pub fn events(self) -> impl Iterator<Item = Result<ScenarioEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
