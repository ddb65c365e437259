extern crate self as forms_ticket;

pub mod endianness;
pub mod error;
pub mod result;

pub mod hash;
pub mod symmetric;
pub mod envelope;
pub mod ticket;
pub mod codec;
pub mod config;
pub mod common;

pub use codec::{TicketCodec, MAX_TICKET_LENGTH};
pub use config::MachineKeyConfig;
pub use error::{Error, Result};
pub use hash::{KeyedHash, ValidationMethod};
pub use symmetric::{EncryptionMethod, SymmetricCipher};
pub use ticket::{Ticket, TicketDateTime, WideString};
