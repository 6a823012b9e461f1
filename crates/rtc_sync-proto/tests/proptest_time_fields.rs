use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use rtc_proto::message::{Frame, MessageKind, Method};
use rtc_proto::{TimeFields, TimePayloadBuilder, WireFormat};

/// Seconds from 1970-01-01 to 2106-02-07, the range of an unsigned 32-bit epoch.
fn arb_epoch() -> impl Strategy<Value = u32> {
    any::<u32>()
}

fn arb_fields() -> impl Strategy<Value = TimeFields> {
    (1970i32..=9999, 1u8..=12, 1u8..=28, 0u8..=23, 0u8..=59, 0u8..=59).prop_map(
        |(y, mo, d, h, mi, se)| TimeFields::new(y, mo, d, h, mi, se).unwrap(),
    )
}

proptest! {
    /// Every timestamp at or after the epoch decomposes into in-range fields.
    #[test]
    fn build_fields_in_range(secs in arb_epoch(), offset_min in -720i32..=840) {
        let tz = FixedOffset::east_opt(offset_min * 60).unwrap();
        let now: DateTime<FixedOffset> = tz.timestamp_opt(i64::from(secs) + 86_400, 0).unwrap();
        let f = TimePayloadBuilder::build(&now);
        prop_assert!(f.year() >= 1970);
        prop_assert!((1..=12).contains(&f.month()));
        prop_assert!((1..=31).contains(&f.day()));
        prop_assert!(f.hour() <= 23);
        prop_assert!(f.minute() <= 59);
        prop_assert!(f.second() <= 59);
        // Built fields are always acceptable to the validating constructor.
        prop_assert_eq!(
            TimeFields::new(f.year(), f.month(), f.day(), f.hour(), f.minute(), f.second()),
            Ok(f)
        );
    }

    /// Parsing the query form reproduces the fields exactly.
    #[test]
    fn query_roundtrip(f in arb_fields()) {
        prop_assert_eq!(TimeFields::from_query(&f.to_query()), Ok(f));
    }

    /// Distinct fields never serialize to the same query.
    #[test]
    fn query_injective(a in arb_fields(), b in arb_fields()) {
        prop_assume!(a != b);
        prop_assert_ne!(a.to_query(), b.to_query());
    }

    /// Epoch conversion agrees with chrono's own UTC decomposition.
    #[test]
    fn epoch_matches_utc_build(secs in arb_epoch()) {
        let f = TimeFields::from_epoch_secs(secs);
        let utc = Utc.timestamp_opt(i64::from(secs), 0).unwrap();
        prop_assert_eq!(f, TimePayloadBuilder::build(&utc));
        prop_assert_eq!(f.to_epoch_secs(), Ok(secs));
    }

    /// The query pairs survive a trip through a CoAP datagram.
    #[test]
    fn query_survives_datagram(f in arb_fields(), mid in any::<u16>()) {
        let path = vec!["date".to_string()];
        let request = TimePayloadBuilder::render(&f, Method::Put, &path, WireFormat::Query).unwrap();
        let frame = Frame::request(MessageKind::Confirmable, mid, vec![1, 2, 3, 4], &request);
        let decoded = Frame::decode(&frame.encode().unwrap()).unwrap();
        let pairs: Vec<&str> = decoded.uri_query.iter().map(String::as_str).collect();
        prop_assert_eq!(TimeFields::from_query_pairs(pairs), Ok(f));
    }

    /// Arbitrary bytes never panic the decoder.
    #[test]
    fn decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = Frame::decode(&bytes);
    }
}
