//! Resolves semantic period tokens into concrete date intervals.
//!
//! The resolver performs its boundary math on the local wall-clock date
//! carried by the injected `now`, but the instants it returns are UTC and
//! read the same regardless of the reader's timezone.

use time::{
    Date, Duration, Month, OffsetDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::{format_description, time},
};

/// Wire format for resolved instants: millisecond precision, `Z` suffix.
const ISO_MILLIS_UTC: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// Date-only format accepted for custom bounds, e.g. `2026-01-31`.
const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The last representable millisecond of a day.
const END_OF_DAY: Time = time!(23:59:59.999);

/// A symbolic name for a relative or custom date window.
///
/// Not every page supports every token; each page declares its accepted
/// subset via its filter schema and unknown or out-of-subset tokens
/// normalize to that page's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodToken {
    /// No date filter at all, distinct from "not yet resolved".
    AllTime,
    /// The current local day.
    Today,
    /// The previous local day.
    Yesterday,
    /// Monday-aligned week to date.
    Week,
    /// The full previous Monday-to-Sunday week.
    LastWeek,
    /// Calendar month to date.
    Month,
    /// The full previous calendar month.
    LastMonth,
    /// Calendar quarter to date.
    Quarter,
    /// The full previous calendar quarter.
    LastQuarter,
    /// Calendar year to date.
    Year,
    /// Explicit `from`/`to` bounds supplied by the user.
    Custom,
}

impl PeriodToken {
    /// The value used for this token in query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::AllTime => "allTime",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::LastWeek => "lastWeek",
            Self::Month => "month",
            Self::LastMonth => "lastMonth",
            Self::Quarter => "quarter",
            Self::LastQuarter => "lastQuarter",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }

    /// Parse a raw query value. Matching is exact: wrong case or extra
    /// characters yield `None` so the caller can fall back to its default.
    pub fn from_query_value(raw: &str) -> Option<Self> {
        match raw {
            "allTime" => Some(Self::AllTime),
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "week" => Some(Self::Week),
            "lastWeek" => Some(Self::LastWeek),
            "month" => Some(Self::Month),
            "lastMonth" => Some(Self::LastMonth),
            "quarter" => Some(Self::Quarter),
            "lastQuarter" => Some(Self::LastQuarter),
            "year" => Some(Self::Year),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Every period token, in wire order. Pages that accept everything use this.
pub const ALL_TOKENS: &[PeriodToken] = &[
    PeriodToken::AllTime,
    PeriodToken::Today,
    PeriodToken::Yesterday,
    PeriodToken::Week,
    PeriodToken::LastWeek,
    PeriodToken::Month,
    PeriodToken::LastMonth,
    PeriodToken::Quarter,
    PeriodToken::LastQuarter,
    PeriodToken::Year,
    PeriodToken::Custom,
];

/// Normalize a raw period value against a page's accepted subset.
///
/// Unknown, malformed, or out-of-subset tokens fall back to `default`,
/// never to an error.
pub fn normalize_token(
    raw: Option<&str>,
    accepted: &[PeriodToken],
    default: PeriodToken,
) -> PeriodToken {
    let Some(raw) = raw else {
        return default;
    };

    match PeriodToken::from_query_value(raw) {
        Some(token) if accepted.contains(&token) => token,
        Some(token) => {
            tracing::warn!(
                "period token {:?} is not accepted here, falling back to {:?}",
                token,
                default
            );
            default
        }
        None => {
            tracing::warn!("unknown period token {raw:?}, falling back to {default:?}");
            default
        }
    }
}

/// A resolved date interval as UTC instant strings.
///
/// If both bounds are present then `date_from <= date_to`. A violated custom
/// range resolves to the unbounded range (treated as unfiltered), never to a
/// silently reordered one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedRange {
    /// Inclusive lower bound, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub date_to: Option<String>,
}

impl ResolvedRange {
    /// The explicit "no date filter" range.
    pub fn unbounded() -> Self {
        Self::default()
    }

    fn span(from: OffsetDateTime, to: OffsetDateTime) -> Self {
        Self {
            date_from: Some(format_instant(from)),
            date_to: Some(format_instant(to)),
        }
    }
}

/// Resolve a period token into concrete date bounds.
///
/// `custom_from`/`custom_to` are only consulted for [PeriodToken::Custom];
/// each may be a plain `YYYY-MM-DD` date (taken as local start/end of day)
/// or a full RFC 3339 instant. Missing, empty, or unparsable bounds, or
/// `from > to`, resolve to the unbounded range as a deliberate fail-safe.
pub fn resolve(
    token: PeriodToken,
    now: OffsetDateTime,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> ResolvedRange {
    let offset = now.offset();
    let today = now.date();

    match token {
        PeriodToken::AllTime => ResolvedRange::unbounded(),
        PeriodToken::Today => day_span(today, today, offset),
        PeriodToken::Yesterday => {
            let yesterday = today - Duration::days(1);
            day_span(yesterday, yesterday, offset)
        }
        PeriodToken::Week => day_span(monday_of(today), today, offset),
        PeriodToken::LastWeek => {
            let this_monday = monday_of(today);
            day_span(
                this_monday - Duration::days(7),
                this_monday - Duration::days(1),
                offset,
            )
        }
        PeriodToken::Month => day_span(first_of_month(today), today, offset),
        PeriodToken::LastMonth => {
            let (year, month) = previous_month(today.year(), today.month());
            day_span(
                month_start(year, month),
                month_end(year, month),
                offset,
            )
        }
        PeriodToken::Quarter => day_span(first_of_quarter(today), today, offset),
        PeriodToken::LastQuarter => {
            let anchor = first_of_quarter(today) - Duration::days(1);
            day_span(first_of_quarter(anchor), last_of_quarter(anchor), offset)
        }
        PeriodToken::Year => day_span(
            Date::from_calendar_date(today.year(), Month::January, 1)
                .expect("invalid year start date"),
            today,
            offset,
        ),
        PeriodToken::Custom => resolve_custom(custom_from, custom_to, offset),
    }
}

fn resolve_custom(
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    offset: UtcOffset,
) -> ResolvedRange {
    let from = custom_from.and_then(|raw| parse_custom_bound(raw, offset, Time::MIDNIGHT));
    let to = custom_to.and_then(|raw| parse_custom_bound(raw, offset, END_OF_DAY));

    match (from, to) {
        (Some(from), Some(to)) if from <= to => ResolvedRange::span(from, to),
        (Some(_), Some(_)) => {
            tracing::warn!("custom date bounds are swapped, treating the range as unbounded");
            ResolvedRange::unbounded()
        }
        // A single present bound is treated the same as none at all.
        _ => ResolvedRange::unbounded(),
    }
}

fn parse_custom_bound(raw: &str, offset: UtcOffset, day_boundary: Time) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = Date::parse(trimmed, DATE_ONLY) {
        return Some(date.with_time(day_boundary).assume_offset(offset));
    }

    match OffsetDateTime::parse(trimmed, &Rfc3339) {
        Ok(instant) => Some(instant),
        Err(_) => {
            tracing::warn!("unparsable custom date bound {trimmed:?}");
            None
        }
    }
}

/// A span from local start-of-day on `from` to local end-of-day on `to`.
fn day_span(from: Date, to: Date, offset: UtcOffset) -> ResolvedRange {
    ResolvedRange::span(
        from.with_time(Time::MIDNIGHT).assume_offset(offset),
        to.with_time(END_OF_DAY).assume_offset(offset),
    )
}

fn format_instant(instant: OffsetDateTime) -> String {
    instant
        .to_offset(UtcOffset::UTC)
        .format(ISO_MILLIS_UTC)
        .expect("invalid UTC timestamp format")
}

fn monday_of(date: Date) -> Date {
    let weekday_number = date.weekday().number_from_monday() as i64;
    date - Duration::days(weekday_number - 1)
}

fn first_of_month(date: Date) -> Date {
    month_start(date.year(), date.month())
}

fn month_start(year: i32, month: Month) -> Date {
    Date::from_calendar_date(year, month, 1).expect("invalid month start date")
}

fn month_end(year: i32, month: Month) -> Date {
    Date::from_calendar_date(year, month, last_day_of_month(year, month))
        .expect("invalid month end date")
}

fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        other => (year, other.previous()),
    }
}

fn first_of_quarter(date: Date) -> Date {
    let quarter_start = ((u8::from(date.month()) - 1) / 3) * 3 + 1;
    month_start(
        date.year(),
        Month::try_from(quarter_start).expect("invalid quarter start month"),
    )
}

fn last_of_quarter(date: Date) -> Date {
    let quarter_end = ((u8::from(date.month()) - 1) / 3) * 3 + 3;
    let month = Month::try_from(quarter_end).expect("invalid quarter end month");
    month_end(date.year(), month)
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
