use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// A message the controller published during replay, tagged with its tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub tick: u64,
    pub topic: String,
    pub payload: String,
}

pub struct PublicationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PublicationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header and one row per publication.
    pub fn write_publications(&mut self, publications: &[Publication]) -> Result<()> {
        if publications.is_empty() {
            self.writer.write_record(["tick", "topic", "payload"])?;
        }
        for publication in publications {
            self.writer.serialize(publication)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
