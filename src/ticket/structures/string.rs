use std::io::{Read, Write};
use crate::endianness::{ReadExtensions, WriteExtensions};
use crate::ticket::WideString;
use super::{Error, Result, TicketSerialize};

/// Strings are a 7-bit encoded count of code units (not bytes) followed by the raw units, two
/// bytes each, low byte first. No text encoding is involved so unpaired surrogates round trip.
impl TicketSerialize for WideString{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        let units = self.as_units();

        let count: u32 = i32::try_from(units.len())
            .map_err(|_| Error::StringTooLong(units.len()))? as u32;

        writer.write_7bit_encoded_u32(count)?;

        let mut data = Vec::with_capacity(units.len() * 2);
        for unit in units{
            data.extend_from_slice(&unit.to_le_bytes());
        }

        writer.write_all(&data)?;

        Ok(())
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        let count = reader.read_7bit_encoded_u32()?;

        // legacy readers treat the count as a signed 32 bit value
        if count > i32::MAX as u32{
            return Err(Error::UnexpectedValue(count as u64));
        }

        let byte_len = count as u64 * 2;

        // read through `take` so a bogus count can't make us allocate more than is actually there
        let mut data = Vec::new();
        reader.take(byte_len).read_to_end(&mut data)?;

        if data.len() as u64 != byte_len{
            return Err(Error::LengthMismatch{
                position: data.len() as u64,
                expected: byte_len,
            });
        }

        let units = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(WideString::from_units(units))
    }
}
