//! CSV front-end of the scenario replay: scripts in, publications out.

pub mod publication_writer;
pub mod scenario_reader;
