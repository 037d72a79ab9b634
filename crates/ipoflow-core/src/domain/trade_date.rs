use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const LONG_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day], [year]");
const MONTH_YEAR: &[BorrowedFormatItem<'static>] = format_description!("[month repr:short] [year]");

/// Calendar date of a trading session, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Parse an ISO calendar date (`2024-03-01`).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Current UTC calendar date.
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// Session date of a bar timestamp, shifted into exchange-local time.
    pub fn from_unix_timestamp(timestamp: i64, gmt_offset_secs: i64) -> Option<Self> {
        let local = timestamp.checked_add(gmt_offset_secs)?;
        OffsetDateTime::from_unix_timestamp(local)
            .ok()
            .map(|value| Self(value.date()))
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub const fn year(self) -> i32 {
        self.0.year()
    }

    /// Month number, 1 (January) through 12 (December).
    pub fn month(self) -> u8 {
        u8::from(self.0.month())
    }

    pub const fn day(self) -> u8 {
        self.0.day()
    }

    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0.saturating_add(Duration::days(days)))
    }

    pub fn minus_days(self, days: i64) -> Self {
        Self(self.0.saturating_sub(Duration::days(days)))
    }

    /// Whole days elapsed from `earlier` to `self` (negative when `earlier` is later).
    pub fn days_since(self, earlier: TradeDate) -> i64 {
        (self.0 - earlier.0).whole_days()
    }

    pub fn format_iso(self) -> String {
        self.format_with(ISO_DATE)
    }

    /// `Mar 01, 2024`
    pub fn format_long(self) -> String {
        self.format_with(LONG_DATE)
    }

    /// `Mar 2025`
    pub fn format_month_year(self) -> String {
        self.format_with(MONTH_YEAR)
    }

    fn format_with(self, format: &[BorrowedFormatItem<'_>]) -> String {
        // Calendar components of a valid Date always format; Display is ISO as well.
        self.0.format(format).unwrap_or_else(|_| self.0.to_string())
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
