//! In-memory collaborators: a card reader, a message broker and a wireless
//! link. They back the test suite and the scenario replay binary.

pub mod in_memory_broker;
pub mod in_memory_card;
pub mod in_memory_network;
