use std::fmt;
use std::fmt::Write as _;
use std::string::FromUtf16Error;
use bytemuck::{Pod, Zeroable};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use crate::endianness::SwapEndian;
use crate::error::{Error, Result};

pub mod serializer;
pub mod structures;

pub const TICKS_PER_SECOND: i64 = 10_000_000;
/// Ticks at 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
/// Ticks at 9999-12-31T23:59:59.9999999Z, the last representable instant.
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Point in time as 100ns ticks since 0001-01-01T00:00:00Z, always UTC.
#[derive(Pod, Zeroable, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TicketDateTime(i64);

impl TicketDateTime{
    pub const MAX: Self = Self(MAX_TICKS);

    pub fn from_ticks(ticks: i64) -> Option<Self>{
        (0..=MAX_TICKS).contains(&ticks).then_some(Self(ticks))
    }

    /// Converts any timezone aware time into ticks, dropping precision below 100ns.
    pub fn from_datetime<Tz: TimeZone>(time: &DateTime<Tz>) -> Option<Self>{
        i64::try_from(ticks_of(time))
            .ok()
            .and_then(Self::from_ticks)
    }

    pub fn now() -> Self{
        Self(ticks_of(&Utc::now()).clamp(0, MAX_TICKS as i128) as i64)
    }

    #[inline]
    pub fn ticks(&self) -> i64{
        self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc>{
        let since_epoch = self.0 - UNIX_EPOCH_TICKS;
        let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;

        // every in range tick count maps onto a valid chrono time
        DateTime::from_timestamp(seconds, nanos).unwrap_or_default()
    }

    pub fn to_local(&self) -> DateTime<Local>{
        self.to_utc().with_timezone(&Local)
    }

    pub fn checked_add(&self, delta: TimeDelta) -> Option<Self>{
        let delta_ticks = delta.num_seconds()
            .checked_mul(TICKS_PER_SECOND)?
            .checked_add((delta.subsec_nanos() / 100) as i64)?;

        self.0.checked_add(delta_ticks).and_then(Self::from_ticks)
    }

    fn saturating_add_ticks(&self, ticks: i64) -> Self{
        Self(self.0.saturating_add(ticks).clamp(0, MAX_TICKS))
    }
}

fn ticks_of<Tz: TimeZone>(time: &DateTime<Tz>) -> i128{
    UNIX_EPOCH_TICKS as i128
        + time.timestamp() as i128 * TICKS_PER_SECOND as i128
        + (time.timestamp_subsec_nanos() / 100) as i128
}

impl SwapEndian for TicketDateTime{
    #[inline]
    fn swap_endian(self) -> Self {
        Self(self.0.swap_endian())
    }
}

impl fmt::Display for TicketDateTime{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_utc().to_rfc3339())
    }
}

/// String stored as raw UTF-16 code units.
///
/// Unpaired surrogates are legal here and survive a round trip untouched, which a `String`
/// can't guarantee.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct WideString(Vec<u16>);

impl WideString{
    pub fn new() -> Self{
        Self::default()
    }

    pub fn from_units(units: Vec<u16>) -> Self{
        Self(units)
    }

    pub fn as_units(&self) -> &[u16]{
        &self.0
    }

    /// Length in code units.
    pub fn len(&self) -> usize{
        self.0.len()
    }

    pub fn is_empty(&self) -> bool{
        self.0.is_empty()
    }

    pub fn to_string_lossy(&self) -> String{
        char::decode_utf16(self.0.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    pub fn try_to_string(&self) -> std::result::Result<String, FromUtf16Error>{
        String::from_utf16(&self.0)
    }
}

impl From<&str> for WideString{
    fn from(value: &str) -> Self {
        Self(value.encode_utf16().collect())
    }
}

impl From<String> for WideString{
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<u16>> for WideString{
    fn from(value: Vec<u16>) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for WideString{
    fn eq(&self, other: &str) -> bool {
        self.0.iter().copied().eq(other.encode_utf16())
    }
}

impl PartialEq<&str> for WideString{
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl fmt::Display for WideString{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for WideString{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;

        for c in char::decode_utf16(self.0.iter().copied()){
            match c{
                Ok(c) => write!(f, "{}", c.escape_debug())?,
                Err(e) => write!(f, "\\u{{{:x}}}", e.unpaired_surrogate())?,
            }
        }

        f.write_char('"')
    }
}

/// Logical forms authentication ticket. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket{
    version: i32,
    name: WideString,
    issue_date_utc: TicketDateTime,
    expiration_utc: TicketDateTime,
    is_persistent: bool,
    user_data: WideString,
    cookie_path: WideString,
}

impl Ticket{
    /// Builds a ticket from timezone aware times, which get normalized to UTC.
    ///
    /// Only the low byte of `version` is ever stored.
    pub fn new<Tz: TimeZone>(
        version: i32,
        name: impl Into<WideString>,
        issue_date: &DateTime<Tz>,
        expiration: &DateTime<Tz>,
        is_persistent: bool,
        user_data: impl Into<WideString>,
        cookie_path: impl Into<WideString>,
    ) -> Result<Self>{
        let issue_date_utc = TicketDateTime::from_datetime(issue_date)
            .ok_or_else(|| Error::Encode("issue date is out of range".to_owned()))?;
        let expiration_utc = TicketDateTime::from_datetime(expiration)
            .ok_or_else(|| Error::Encode("expiration is out of range".to_owned()))?;

        Ok(Self::from_utc(version, name, issue_date_utc, expiration_utc, is_persistent, user_data, cookie_path))
    }

    pub fn from_utc(
        version: i32,
        name: impl Into<WideString>,
        issue_date_utc: TicketDateTime,
        expiration_utc: TicketDateTime,
        is_persistent: bool,
        user_data: impl Into<WideString>,
        cookie_path: impl Into<WideString>,
    ) -> Self{
        Self{
            version,
            name: name.into(),
            issue_date_utc,
            expiration_utc,
            is_persistent,
            user_data: user_data.into(),
            cookie_path: cookie_path.into(),
        }
    }

    pub fn version(&self) -> i32{
        self.version
    }

    pub fn name(&self) -> &WideString{
        &self.name
    }

    pub fn issue_date_utc(&self) -> TicketDateTime{
        self.issue_date_utc
    }

    pub fn expiration_utc(&self) -> TicketDateTime{
        self.expiration_utc
    }

    /// Issue date in the local timezone, derived from the UTC value.
    pub fn issue_date(&self) -> DateTime<Local>{
        self.issue_date_utc.to_local()
    }

    /// Expiration in the local timezone, derived from the UTC value.
    pub fn expiration(&self) -> DateTime<Local>{
        self.expiration_utc.to_local()
    }

    pub fn is_persistent(&self) -> bool{
        self.is_persistent
    }

    pub fn user_data(&self) -> &WideString{
        &self.user_data
    }

    pub fn cookie_path(&self) -> &WideString{
        &self.cookie_path
    }

    pub fn expired(&self) -> bool{
        self.expired_at(TicketDateTime::now())
    }

    pub fn expired_at(&self, now: TicketDateTime) -> bool{
        now > self.expiration_utc
    }

    /// Sliding expiration. Once less of the lifetime remains than has already passed, returns a
    /// copy issued at `now` that keeps the original lifetime. A ticket that has already expired
    /// is renewed too; callers that must refuse those check [`Self::expired_at`] first.
    pub fn renew_if_old(&self, now: TicketDateTime) -> Option<Ticket>{
        let age = now.ticks() - self.issue_date_utc.ticks();
        let remaining = self.expiration_utc.ticks() - now.ticks();

        if remaining > age{
            return None;
        }

        let lifetime = self.expiration_utc.ticks() - self.issue_date_utc.ticks();

        Some(Self{
            issue_date_utc: now,
            expiration_utc: now.saturating_add_ticks(lifetime),
            ..self.clone()
        })
    }
}
