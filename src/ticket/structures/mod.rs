use std::io;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error{
    #[error("Io Error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected value: {0}")]
    UnexpectedValue(u64),
    #[error("version mismatch: {0}")]
    VersionMismatch(u8),
    #[error("date ticks out of range: {0}")]
    TicksOutOfRange(i64),
    #[error("string with {0} code units is too long")]
    StringTooLong(usize),
    #[error("payload ended at {position} but {expected} bytes were declared")]
    LengthMismatch{
        position: u64,
        expected: u64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod primitives;
pub mod string;

pub trait TicketSerialize{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()>;
    fn deserialize(reader: &mut dyn Read) -> Result<Self> where Self: Sized;

    fn to_data(&self) -> Result<Vec<u8>>{
        let mut data = Vec::new();

        self.serialize(&mut data)?;

        Ok(data)
    }
}
