#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any document must either fail cleanly or survive a JSON round trip
    if let Ok(glossary) = jargon::glossary::parse(data) {
        let bytes = jargon::glossary::to_json(&glossary).expect("glossary encodes");
        let decoded = jargon::glossary::from_json(&bytes).expect("glossary decodes");
        assert_eq!(decoded, glossary);
    }
});
