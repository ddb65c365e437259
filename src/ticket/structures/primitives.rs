use std::io::{Read, Write};
use crate::endianness::{ReadExtensions, WriteExtensions};
use crate::ticket::TicketDateTime;
use super::{Error, Result, TicketSerialize};

impl TicketSerialize for u8{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        Ok(writer.write_le_struct(*self)?)
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        Ok(reader.read_le_struct()?)
    }
}

impl TicketSerialize for i64{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        Ok(writer.write_le_struct(*self)?)
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        Ok(reader.read_le_struct()?)
    }
}

/// One byte, strictly `0` or `1`.
impl TicketSerialize for bool{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        match self{
            true => 1u8.serialize(writer),
            false => 0u8.serialize(writer),
        }
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        match u8::deserialize(reader)?{
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::UnexpectedValue(v as u64))
        }
    }
}

impl TicketSerialize for TicketDateTime{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        Ok(writer.write_le_struct(*self)?)
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        let ticks = i64::deserialize(reader)?;

        TicketDateTime::from_ticks(ticks).ok_or(Error::TicksOutOfRange(ticks))
    }
}
