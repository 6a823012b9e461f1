// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Capturing the local clock and rendering it into a clock-set request.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::error::ParseError;
use crate::message::{CONTENT_FORMAT_TEXT_PLAIN, Method, Request};
use crate::time_fields::TimeFields;

/// Which wall clock to capture.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ClockSource {
    /// The host's local time zone.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
}

/// Where the time travels in the request.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum WireFormat {
    /// Six Uri-Query options: `y`, `mo`, `d`, `h`, `mi`, `se`.
    #[default]
    Query,
    /// A `text/plain` body holding decimal seconds since the Unix epoch, the
    /// fields being read as UTC. This is what the date resource's PUT/POST
    /// handler in the node firmware parses.
    Epoch,
}

/// Turns a timestamp into [`TimeFields`] and [`TimeFields`] into a [`Request`].
///
/// Stateless; all functions are associated functions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimePayloadBuilder;

impl TimePayloadBuilder {
    /// Decompose `now` into wall-clock fields in its own time zone.
    ///
    /// Pure and deterministic. The year is the full calendar year.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use rtc_proto::TimePayloadBuilder;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 5, 9).unwrap();
    /// let fields = TimePayloadBuilder::build(&now);
    /// assert_eq!(fields.to_query(), "y=2024&mo=3&d=15&h=14&mi=5&se=9");
    /// ```
    pub fn build<Tz: TimeZone>(now: &DateTime<Tz>) -> TimeFields {
        TimeFields::from_naive(&now.naive_local())
    }

    /// Read the host clock and decompose it.
    pub fn capture(source: ClockSource) -> TimeFields {
        match source {
            ClockSource::Local => Self::build(&Local::now()),
            ClockSource::Utc => Self::build(&Utc::now()),
        }
    }

    /// Build the clock-set request for `fields`.
    ///
    /// Only [`WireFormat::Epoch`] can fail, for times outside the unsigned
    /// 32-bit epoch range.
    pub fn render(
        fields: &TimeFields,
        method: Method,
        path: &[String],
        format: WireFormat,
    ) -> Result<Request, ParseError> {
        let mut request = Request::new(method, path.to_vec());
        match format {
            WireFormat::Query => request.query = fields.query_pairs(),
            WireFormat::Epoch => {
                request.content_format = Some(CONTENT_FORMAT_TEXT_PLAIN);
                request.payload = fields.to_epoch_secs()?.to_string().into_bytes();
            }
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn path() -> Vec<String> {
        vec!["date".to_string()]
    }

    #[test]
    fn test_build_scenario() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 5, 9).unwrap();
        let fields = TimePayloadBuilder::build(&now);
        assert_eq!(fields, TimeFields::new(2024, 3, 15, 14, 5, 9).unwrap());
    }

    #[test]
    fn test_build_uses_timestamp_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        let fields = TimePayloadBuilder::build(&now);
        assert_eq!(fields.year(), 2024);
        assert_eq!(fields.hour(), 23);

        let utc = TimePayloadBuilder::build(&now.with_timezone(&Utc));
        assert_eq!(utc.hour(), 21);
    }

    #[test]
    fn test_build_full_year() {
        let now = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(TimePayloadBuilder::build(&now).year(), 2001);
    }

    #[test]
    fn test_capture_in_range() {
        let fields = TimePayloadBuilder::capture(ClockSource::Utc);
        assert!(fields.year() >= 2020);
        assert!((1..=12).contains(&fields.month()));
    }

    #[test]
    fn test_render_query() {
        let fields = TimeFields::new(2024, 3, 15, 14, 5, 9).unwrap();
        let request =
            TimePayloadBuilder::render(&fields, Method::Put, &path(), WireFormat::Query).unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.uri(), "/date?y=2024&mo=3&d=15&h=14&mi=5&se=9");
        assert!(request.payload.is_empty());
        assert_eq!(request.content_format, None);
    }

    #[test]
    fn test_render_epoch() {
        let fields = TimeFields::new(2024, 3, 15, 14, 5, 9).unwrap();
        let request =
            TimePayloadBuilder::render(&fields, Method::Post, &path(), WireFormat::Epoch).unwrap();
        assert_eq!(request.method, Method::Post);
        assert!(request.query.is_empty());
        assert_eq!(request.payload, b"1710511509".to_vec());
        assert_eq!(request.content_format, Some(CONTENT_FORMAT_TEXT_PLAIN));
    }

    #[test]
    fn test_render_epoch_before_1970_fails() {
        let fields = TimeFields::new(1969, 7, 20, 20, 17, 0).unwrap();
        assert_eq!(
            TimePayloadBuilder::render(&fields, Method::Put, &path(), WireFormat::Epoch),
            Err(ParseError::EpochOverflow)
        );
    }
}
