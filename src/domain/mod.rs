//! Domain layer: card data model, the balance codec, inbound/outbound message
//! shapes and the ports the engine is written against.

pub mod card;
pub mod codec;
pub mod command;
pub mod ports;
pub mod report;
