#![no_main]
use libfuzzer_sys::fuzz_target;
use rtc_proto::TimeFields;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(fields) = TimeFields::from_query(text) {
        // The canonical rendering must parse back to the same fields.
        let again = TimeFields::from_query(&fields.to_query())
            .expect("rendered query should parse");
        assert_eq!(fields, again);
        let _ = fields.to_epoch_secs();
    }
});
