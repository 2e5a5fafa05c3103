#![no_main]

use jargon::glossary::markup;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = markup::parse(data);

    // Escaped text always reads back as a single literal run
    let spans = markup::parse(&markup::escape(data));
    if !data.is_empty() {
        assert_eq!(spans, vec![markup::Span::Text(data.to_string())]);
    }
});
