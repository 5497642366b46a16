#![no_main]

use libfuzzer_sys::fuzz_target;
use dbiscope::dbi::{DbiStream, Diagnostics, ParseOptions};
use std::{io::Cursor, sync::Arc};

fuzz_target!(|data: &[u8]| {
    let _ = DbiStream::parse(data);
    let _ = DbiStream::parse_with(
        Cursor::new(data),
        ParseOptions::lenient(),
        Arc::new(Diagnostics::new()),
    );
});
