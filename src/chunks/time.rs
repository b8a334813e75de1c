use ::time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use nom::{
    combinator::all_consuming,
    number::complete::{be_u16, u8},
    sequence::tuple,
    IResult,
};

use super::ParseableChunk;
use crate::error::{PngError, Result};

/// Last modification time, always UTC on the wire.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct tIMEChunk {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}
impl tIMEChunk {
    pub(crate) fn from_datetime(datetime: OffsetDateTime) -> Result<Self> {
        let utc = datetime.to_offset(UtcOffset::UTC);
        let year = u16::try_from(utc.year())
            .map_err(|_| PngError::OutOfRange(format!("year {} not storable", utc.year())))?;
        Ok(Self {
            year,
            month: utc.month().into(),
            day: utc.day(),
            hour: utc.hour(),
            minute: utc.minute(),
            second: utc.second(),
        })
    }

    pub(crate) fn now() -> Result<Self> {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// The stored instant. A leap second (60) is folded onto 59.
    pub(crate) fn to_datetime(&self) -> Result<OffsetDateTime> {
        let invalid = |e: &dyn std::fmt::Display| {
            PngError::CorruptData(format!("invalid tIME value {self:?}: {e}"))
        };
        let month = Month::try_from(self.month).map_err(|e| invalid(&e))?;
        let date =
            Date::from_calendar_date(self.year as i32, month, self.day).map_err(|e| invalid(&e))?;
        let second = if self.second == 60 { 59 } else { self.second };
        let time = Time::from_hms(self.hour, self.minute, second).map_err(|e| invalid(&e))?;
        Ok(PrimitiveDateTime::new(date, time).assume_utc())
    }

    /// The stored instant shifted to the host's UTC offset, or left in UTC
    /// when that offset cannot be determined.
    pub(crate) fn to_local(&self) -> Result<OffsetDateTime> {
        let utc = self.to_datetime()?;
        match UtcOffset::current_local_offset() {
            Ok(offset) => Ok(utc.to_offset(offset)),
            Err(e) => {
                log::debug!("local offset unavailable ({e}), keeping tIME in UTC");
                Ok(utc)
            }
        }
    }
}

fn time_fields(input: &[u8]) -> IResult<&[u8], (u16, u8, u8, u8, u8, u8)> {
    all_consuming(tuple((be_u16, u8, u8, u8, u8, u8)))(input)
}

impl<'a> ParseableChunk<'a> for tIMEChunk {
    const HEADER: &'static [u8; 4] = b"tIME";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (_, (year, month, day, hour, minute, second)) = time_fields(chunk_data)
            .map_err(|_| PngError::CorruptData("tIME must hold exactly 7 bytes".into()))?;
        let chunk = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        chunk.to_datetime()?;
        Ok(chunk)
    }

    fn data_bytes(&self) -> Vec<u8> {
        let mut bytes = self.year.to_be_bytes().to_vec();
        bytes.extend([self.month, self.day, self.hour, self.minute, self.second]);
        bytes
    }
}
