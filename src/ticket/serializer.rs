use std::io::{Cursor, Read, Write};
use log::debug;
use crate::error;
use crate::ticket::structures::{Error, Result, TicketSerialize};
use crate::ticket::{Ticket, TicketDateTime, WideString};

pub const CURRENT_TICKET_SERIALIZED_VERSION: u8 = 0x01;
pub const SPACER: u8 = 0xFE;
pub const FOOTER: u8 = 0xFF;

/// Offset of the spacer byte, fixed because every field before it has a fixed size.
pub const SPACER_OFFSET: usize = 10;

fn expect_byte(reader: &mut dyn Read, expected: u8) -> Result<()>{
    let value = u8::deserialize(reader)?;

    if value != expected{
        return Err(Error::UnexpectedValue(value as u64));
    }

    Ok(())
}

/// Field order and sizes:
///
/// | size | field |
/// |---|---|
/// | 1 | format version, `0x01` |
/// | 1 | ticket version, low byte only |
/// | 8 | issue date, UTC ticks |
/// | 1 | spacer, `0xFE` |
/// | 8 | expiration, UTC ticks |
/// | 1 | persistence flag, `0` or `1` |
/// | 1+ | name |
/// | 1+ | user data |
/// | 1+ | cookie path |
/// | 1 | footer, `0xFF` |
impl TicketSerialize for Ticket{
    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        CURRENT_TICKET_SERIALIZED_VERSION.serialize(writer)?;
        (self.version() as u8).serialize(writer)?;
        self.issue_date_utc().serialize(writer)?;
        SPACER.serialize(writer)?;
        self.expiration_utc().serialize(writer)?;
        self.is_persistent().serialize(writer)?;
        self.name().serialize(writer)?;
        self.user_data().serialize(writer)?;
        self.cookie_path().serialize(writer)?;
        FOOTER.serialize(writer)?;

        Ok(())
    }

    fn deserialize(reader: &mut dyn Read) -> Result<Self> {
        let format_version = u8::deserialize(reader)?;
        if format_version != CURRENT_TICKET_SERIALIZED_VERSION{
            return Err(Error::VersionMismatch(format_version));
        }

        let version = u8::deserialize(reader)?;
        let issue_date_utc = TicketDateTime::deserialize(reader)?;

        expect_byte(reader, SPACER)?;

        let expiration_utc = TicketDateTime::deserialize(reader)?;
        let is_persistent = bool::deserialize(reader)?;
        let name = WideString::deserialize(reader)?;
        let user_data = WideString::deserialize(reader)?;
        let cookie_path = WideString::deserialize(reader)?;

        expect_byte(reader, FOOTER)?;

        Ok(Ticket::from_utc(
            version as i32,
            name,
            issue_date_utc,
            expiration_utc,
            is_persistent,
            user_data,
            cookie_path,
        ))
    }
}

/// Unsigned, unencrypted payload of `ticket`.
pub fn serialize(ticket: &Ticket) -> error::Result<Vec<u8>>{
    ticket.to_data()
        .map_err(|e| error::Error::Encode(e.to_string()))
}

/// Parses the first `payload_len` bytes of `data`. Anything after that (usually the tag the
/// payload was signed with) is ignored, but the ticket has to end exactly at `payload_len`.
///
/// Every structural problem comes out as the same [`error::Error::Parse`].
pub fn deserialize(data: &[u8], payload_len: usize) -> error::Result<Ticket>{
    parse(data, payload_len).map_err(|e| {
        debug!("malformed ticket payload: {}", e);
        error::Error::Parse
    })
}

fn parse(data: &[u8], payload_len: usize) -> Result<Ticket>{
    let payload = data.get(..payload_len).ok_or(Error::LengthMismatch{
        position: data.len() as u64,
        expected: payload_len as u64,
    })?;

    let mut cursor = Cursor::new(payload);
    let ticket = Ticket::deserialize(&mut cursor)?;

    if cursor.position() != payload_len as u64{
        return Err(Error::LengthMismatch{
            position: cursor.position(),
            expected: payload_len as u64,
        });
    }

    Ok(ticket)
}
