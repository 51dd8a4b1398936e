#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use linewire::LineCodec;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size so boundaries vary between runs
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let chunk_size = usize::from(split).max(1);

    let mut codec = LineCodec::new();
    let mut buf = BytesMut::new();
    for chunk in rest.chunks(chunk_size) {
        buf.extend_from_slice(chunk);
        while let Ok(Some(frame)) = codec.decode(&mut buf) {
            assert!(!frame.as_bytes().is_empty());
            assert!(!frame.as_bytes().contains(&b'\r'));
            assert!(!frame.as_bytes().contains(&b'\n'));
        }
    }
    let _ = codec.decode_eof(&mut buf);
});
