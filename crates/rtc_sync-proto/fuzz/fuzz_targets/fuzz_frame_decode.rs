#![no_main]
use libfuzzer_sys::fuzz_target;
use rtc_proto::message::Frame;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        let _ = frame.encode();
        let _ = frame.to_response();
        let _ = frame.to_request();
    }
});
