//! DocBook glossary parser.
//!
//! Streams the document with `quick-xml` and turns every `<glossentry>` into
//! an [`Entry`]:
//!
//! ```xml
//! <glossentry id="endian">
//!   <glossterm>endian</glossterm>
//!   <abbrev><emphasis role="grammar">adj.</emphasis></abbrev>
//!   <glossdef>
//!     <para>See <glossterm linkend="big-endian">big-endian</glossterm>.</para>
//!     <glossseealso otherterm="byte-sex"/>
//!   </glossdef>
//! </glossentry>
//! ```
//!
//! Namespaces are ignored. Body text is stored with [`markup`] so emphasis and
//! cross-references survive serialization.

use super::markup;
use super::{Entry, Glossary, Sense};
use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading the source document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML at byte {position}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("no <glossentry> elements found")]
    NoEntries,
    #[error("glossentry at byte {position} has neither an id nor a term")]
    MissingIdentifier { position: u64 },
}

/// Parse a DocBook glossary document
pub fn parse(xml: &[u8]) -> Result<Glossary, ParseError> {
    GlossaryParser::new(xml).parse()
}

struct GlossaryParser<'a> {
    reader: Reader<&'a [u8]>,
    glossary: Glossary,
}

impl<'a> GlossaryParser<'a> {
    fn new(xml: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(xml),
            glossary: Glossary::new(),
        }
    }

    fn parse(mut self) -> Result<Glossary, ParseError> {
        let mut open: Vec<String> = Vec::new();

        loop {
            let position = self.reader.buffer_position() as u64;
            match self.next_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"glossentry" => {
                    let entry = self.read_entry(&e, position)?;
                    self.push(entry);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"glossentry" => {
                    let entry = EntryBuilder::new(&e).finish(position)?;
                    self.push(entry);
                }
                Event::Start(e) => open.push(local_name(&e)),
                Event::End(_) => {
                    open.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(name) = open.pop() {
            return Err(ParseError::Unclosed(name));
        }
        if self.glossary.is_empty() {
            return Err(ParseError::NoEntries);
        }

        debug!(entries = self.glossary.len(), "parsed glossary");
        Ok(self.glossary)
    }

    fn next_event(&mut self) -> Result<Event<'a>, ParseError> {
        self.reader.read_event().map_err(|source| ParseError::Xml {
            position: self.reader.error_position() as u64,
            source,
        })
    }

    /// Consume events up to and including the entry's end tag
    fn read_entry(&mut self, start: &BytesStart, position: u64) -> Result<Entry, ParseError> {
        let mut builder = EntryBuilder::new(start);

        loop {
            match self.next_event()? {
                Event::Start(e) => builder.open(&e),
                Event::Empty(e) => builder.empty(&e),
                Event::Text(t) => builder.text(&decode_entities(&String::from_utf8_lossy(&t))),
                Event::CData(t) => builder.text(&String::from_utf8_lossy(&t)),
                Event::End(_) => {
                    if !builder.close() {
                        break;
                    }
                }
                Event::Eof => return Err(ParseError::Unclosed("glossentry".to_string())),
                _ => {}
            }
        }

        builder.finish(position)
    }

    /// Add an entry, suffixing its id when it is already taken
    fn push(&mut self, mut entry: Entry) {
        let mut id = entry.id.clone();
        let mut n = 2;
        while self.glossary.contains(&id) {
            id = format!("{}-{}", entry.id, n);
            n += 1;
        }
        if id != entry.id {
            debug!(original = %entry.id, renamed = %id, "duplicate entry id");
            entry.id = id;
        }
        self.glossary.insert(entry);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Pronunciation,
    Grammar,
}

/// Open element inside a glossentry
#[derive(Debug)]
enum Frame {
    Term,
    Abbrev,
    Role(Role),
    Definition,
    Paragraph,
    Emphasis,
    Link {
        id: String,
        start: usize,
        closes_sense: bool,
    },
    SeeAlso,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Term,
    Role(Role),
    Body,
    Discard,
}

#[derive(Debug, Default)]
struct SenseBuilder {
    paragraphs: Vec<String>,
    current: String,
    refs: Vec<String>,
}

impl SenseBuilder {
    fn add_ref(&mut self, id: String) {
        if !self.refs.contains(&id) {
            self.refs.push(id);
        }
    }

    fn open_link(&mut self) -> usize {
        self.current.push('{');
        self.current.len()
    }

    fn close_link(&mut self, id: &str, start: usize) {
        if self.current.len() > start {
            self.current.push('|');
        }
        markup::escape_into(&mut self.current, id);
        self.current.push('}');
        self.add_ref(id.to_string());
    }

    fn flush_paragraph(&mut self) {
        let paragraph = collapse_whitespace(&self.current);
        self.current.clear();
        if !paragraph.is_empty() {
            self.paragraphs.push(paragraph);
        }
    }

    fn finish(mut self) -> Sense {
        self.flush_paragraph();
        Sense {
            body: self.paragraphs.join("\n"),
            refs: self.refs,
        }
    }
}

struct EntryBuilder {
    id: Option<String>,
    terms: Vec<String>,
    term: String,
    pronunciation: String,
    grammar: String,
    senses: Vec<Sense>,
    sense: Option<SenseBuilder>,
    frames: Vec<Frame>,
}

impl EntryBuilder {
    fn new(start: &BytesStart) -> Self {
        Self {
            id: attribute(start, b"id").filter(|id| !id.is_empty()),
            terms: Vec::new(),
            term: String::new(),
            pronunciation: String::new(),
            grammar: String::new(),
            senses: Vec::new(),
            sense: None,
            frames: Vec::new(),
        }
    }

    fn in_link(&self) -> bool {
        self.frames.iter().any(|f| matches!(f, Frame::Link { .. }))
    }

    fn in_body(&self) -> bool {
        self.sense.is_some() && self.sink() == Sink::Body
    }

    /// Where text at the current depth goes
    fn sink(&self) -> Sink {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::SeeAlso | Frame::Abbrev => return Sink::Discard,
                Frame::Role(role) => return Sink::Role(*role),
                Frame::Term => return Sink::Term,
                Frame::Definition | Frame::Paragraph | Frame::Emphasis | Frame::Link { .. } => {
                    return Sink::Body;
                }
                Frame::Other => continue,
            }
        }
        Sink::Discard
    }

    fn open(&mut self, e: &BytesStart) {
        let frame = self.frame_for(e);
        self.frames.push(frame);
    }

    fn frame_for(&mut self, e: &BytesStart) -> Frame {
        let at_entry_level = self.frames.is_empty();
        let in_abbrev = self.frames.iter().any(|f| matches!(f, Frame::Abbrev));
        let in_emphasis = self.frames.iter().any(|f| matches!(f, Frame::Emphasis));
        let in_body = self.in_body();

        match e.local_name().as_ref() {
            b"glossterm" if at_entry_level => {
                self.term.clear();
                Frame::Term
            }
            b"abbrev" if at_entry_level => Frame::Abbrev,
            b"emphasis" if in_abbrev => match attribute(e, b"role").as_deref() {
                Some("pronunciation") => Frame::Role(Role::Pronunciation),
                Some("grammar") => Frame::Role(Role::Grammar),
                _ => Frame::Other,
            },
            b"glossdef" if self.sense.is_none() => {
                self.sense = Some(SenseBuilder::default());
                Frame::Definition
            }
            b"glosssee" if self.sense.is_none() => match attribute(e, b"otherterm") {
                Some(id) if !id.is_empty() => {
                    let mut sense = SenseBuilder::default();
                    sense.current.push_str("See ");
                    let start = sense.open_link();
                    self.sense = Some(sense);
                    Frame::Link {
                        id,
                        start,
                        closes_sense: true,
                    }
                }
                _ => Frame::SeeAlso,
            },
            b"glossseealso" | b"glosssee" => {
                if let Some(id) = attribute(e, b"otherterm") {
                    self.add_ref(id);
                }
                Frame::SeeAlso
            }
            b"para" | b"simpara" if in_body => {
                if let Some(sense) = self.sense.as_mut() {
                    sense.flush_paragraph();
                }
                Frame::Paragraph
            }
            name if in_body && !self.in_link() => {
                match (attribute(e, b"linkend"), self.sense.as_mut()) {
                    (Some(id), Some(sense)) if !id.is_empty() => {
                        let start = sense.open_link();
                        Frame::Link {
                            id,
                            start,
                            closes_sense: false,
                        }
                    }
                    // `*` toggles, so nested emphasis stays one run
                    (_, Some(sense)) if is_emphasis(name) && !in_emphasis => {
                        sense.current.push('*');
                        Frame::Emphasis
                    }
                    _ => Frame::Other,
                }
            }
            _ => Frame::Other,
        }
    }

    fn empty(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"glosssee" if self.sense.is_none() => {
                if let Some(id) = attribute(e, b"otherterm").filter(|id| !id.is_empty()) {
                    let mut sense = SenseBuilder::default();
                    sense.current.push_str("See ");
                    markup::push_ref(&mut sense.current, &id, None);
                    sense.add_ref(id);
                    self.senses.push(sense.finish());
                }
            }
            b"glossseealso" | b"glosssee" => {
                if let Some(id) = attribute(e, b"otherterm") {
                    self.add_ref(id);
                }
            }
            _ if self.in_body() && !self.in_link() => {
                if let (Some(id), Some(sense)) = (attribute(e, b"linkend"), self.sense.as_mut()) {
                    if !id.is_empty() {
                        markup::push_ref(&mut sense.current, &id, None);
                        sense.add_ref(id);
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.sink() {
            Sink::Term => self.term.push_str(text),
            Sink::Role(Role::Pronunciation) => self.pronunciation.push_str(text),
            Sink::Role(Role::Grammar) => self.grammar.push_str(text),
            Sink::Body => {
                if let Some(sense) = self.sense.as_mut() {
                    markup::escape_into(&mut sense.current, text);
                }
            }
            Sink::Discard => {}
        }
    }

    /// Pop the innermost frame. Returns false when the end tag belongs to
    /// the glossentry itself.
    fn close(&mut self) -> bool {
        let Some(frame) = self.frames.pop() else {
            return false;
        };

        match frame {
            Frame::Term => {
                let term = collapse_whitespace(&self.term);
                if !term.is_empty() {
                    self.terms.push(term);
                }
            }
            Frame::Definition => self.finish_sense(),
            Frame::Paragraph => {
                if let Some(sense) = self.sense.as_mut() {
                    sense.flush_paragraph();
                }
            }
            Frame::Emphasis => {
                if let Some(sense) = self.sense.as_mut() {
                    sense.current.push('*');
                }
            }
            Frame::Link {
                id,
                start,
                closes_sense,
            } => {
                if let Some(sense) = self.sense.as_mut() {
                    sense.close_link(&id, start);
                }
                if closes_sense {
                    self.finish_sense();
                }
            }
            Frame::Abbrev | Frame::Role(_) | Frame::SeeAlso | Frame::Other => {}
        }

        true
    }

    fn finish_sense(&mut self) {
        if let Some(sense) = self.sense.take() {
            self.senses.push(sense.finish());
        }
    }

    /// Record a see-also target on the open sense, or the last finished one
    fn add_ref(&mut self, id: String) {
        let id = id.trim().to_string();
        if id.is_empty() {
            return;
        }
        if let Some(sense) = self.sense.as_mut() {
            sense.add_ref(id);
        } else if let Some(last) = self.senses.last_mut() {
            if !last.refs.contains(&id) {
                last.refs.push(id);
            }
        } else {
            debug!(target_id = %id, "see-also outside any definition dropped");
        }
    }

    fn finish(mut self, position: u64) -> Result<Entry, ParseError> {
        self.finish_sense();

        let term = self.terms.join(", ");
        let id = match self.id {
            Some(id) => id,
            None => slugify(&term),
        };
        if id.is_empty() {
            return Err(ParseError::MissingIdentifier { position });
        }
        let term = if term.is_empty() { id.clone() } else { term };

        Ok(Entry {
            id,
            term,
            pronunciation: non_empty(collapse_whitespace(&self.pronunciation)),
            grammar: non_empty(collapse_whitespace(&self.grammar)),
            senses: self.senses,
        })
    }
}

fn is_emphasis(name: &[u8]) -> bool {
    matches!(
        name,
        b"emphasis"
            | b"citetitle"
            | b"firstterm"
            | b"foreignphrase"
            | b"glossterm"
            | b"literal"
            | b"ulink"
    )
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Attribute value by local name, entity-decoded and trimmed
fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| {
            decode_entities(&String::from_utf8_lossy(&a.value))
                .trim()
                .to_string()
        })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Collapse ASCII whitespace runs to single spaces and trim the ends.
/// Non-breaking spaces are kept.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, non-alphanumeric runs become `-`
pub(crate) fn slugify(term: &str) -> String {
    let mut slug = String::with_capacity(term.len());
    let mut pending_dash = false;
    for c in term.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Replace character and entity references. Unknown entities are kept as
/// written.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let reference = tail
            .find(';')
            .map(|end| (&tail[1..end], end))
            .filter(|(name, _)| is_reference_name(name));

        match reference {
            Some((name, end)) => {
                match resolve_reference(name) {
                    Some(resolved) => out.push_str(&resolved),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    out
}

fn is_reference_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '.' | '-' | '_'))
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_predefined_entity(name)
        .or_else(|| resolve_html5_entity(name))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../tests/fixtures/jargon_sample.xml");

    fn sample() -> Glossary {
        parse(SAMPLE.as_bytes()).unwrap()
    }

    fn wrap(entries: &str) -> String {
        format!("<glossary>{entries}</glossary>")
    }

    #[test]
    fn test_sample_ids_in_document_order() {
        let glossary = sample();
        let ids: Vec<_> = glossary.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "big-endian",
                "bogus",
                "bogosity",
                "endian",
                "hacker",
                "hack-mode",
                "little-endian",
                "ob",
            ]
        );
    }

    #[test]
    fn test_whitespace_and_entities_normalized() {
        let glossary = sample();
        let entry = glossary.get("big-endian").unwrap();
        assert_eq!(entry.grammar.as_deref(), Some("adj."));
        assert_eq!(entry.senses.len(), 2);
        assert_eq!(
            entry.senses[0].body,
            "*1.* Describes a computer architecture in which, within a given \
             multi-byte numeric representation, the most significant byte has the \
             lowest address (the word is stored \u{2018}big-end-first\u{2019}). \
             Compare {little-endian|little-endian}."
        );
        assert_eq!(entry.senses[0].refs, vec!["little-endian"]);
        assert_eq!(
            entry.senses[1].body,
            "*2.* An {Internet address|internet} the wrong way round."
        );
    }

    #[test]
    fn test_pronunciation_and_grammar() {
        let glossary = sample();
        let entry = glossary.get("endian").unwrap();
        assert_eq!(entry.pronunciation.as_deref(), Some("/en'dee\u{b7}*n/"));
        assert_eq!(entry.grammar.as_deref(), Some("adj."));
    }

    #[test]
    fn test_xref_and_see_also() {
        let glossary = sample();
        let sense = &glossary.get("bogus").unwrap().senses[0];
        assert_eq!(sense.body, "Non-functional. Useless. See {bogosity}.");
        assert_eq!(sense.refs, vec!["bogosity", "hacker"]);
    }

    #[test]
    fn test_paragraphs_joined_with_newline() {
        let glossary = sample();
        let sense = &glossary.get("hacker").unwrap().senses[0];
        assert_eq!(
            sense.body,
            "[originally, someone who makes furniture with an axe]\n\
             A person who enjoys exploring the details of programmable systems."
        );
        assert!(sense.refs.is_empty());
    }

    #[test]
    fn test_glosssee_becomes_redirect_sense() {
        let glossary = sample();
        let entry = glossary.get("hack-mode").unwrap();
        assert_eq!(entry.term, "hack mode");
        assert_eq!(entry.senses, vec![Sense::new("See {hacker}", vec!["hacker".into()])]);
    }

    #[test]
    fn test_entry_without_senses_is_kept() {
        let glossary = sample();
        let entry = glossary.get("ob").unwrap();
        assert_eq!(entry.term, "OB");
        assert!(entry.senses.is_empty());
    }

    #[test]
    fn test_id_derived_from_term() {
        let xml = wrap("<glossentry><glossterm>Black  Hat!</glossterm></glossentry>");
        let glossary = parse(xml.as_bytes()).unwrap();
        assert_eq!(glossary.get("black-hat").unwrap().term, "Black Hat!");
    }

    #[test]
    fn test_term_defaults_to_id() {
        let xml = wrap(r#"<glossentry id="lonely"/>"#);
        let glossary = parse(xml.as_bytes()).unwrap();
        assert_eq!(glossary.get("lonely").unwrap().term, "lonely");
    }

    #[test]
    fn test_duplicate_ids_are_suffixed() {
        let xml = wrap(
            r#"<glossentry id="foo"><glossterm>foo</glossterm></glossentry>
               <glossentry id="foo"><glossterm>Foo</glossterm></glossentry>
               <glossentry id="foo"><glossterm>FOO</glossterm></glossentry>"#,
        );
        let glossary = parse(xml.as_bytes()).unwrap();
        let ids: Vec<_> = glossary.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["foo", "foo-2", "foo-3"]);
        assert_eq!(glossary.get("foo-3").unwrap().term, "FOO");
    }

    #[test]
    fn test_multiple_terms_joined() {
        let xml = wrap(
            r#"<glossentry id="x"><glossterm>one</glossterm><glossterm>two</glossterm></glossentry>"#,
        );
        let glossary = parse(xml.as_bytes()).unwrap();
        assert_eq!(glossary.get("x").unwrap().term, "one, two");
    }

    #[test]
    fn test_markup_characters_escaped() {
        let xml = wrap(
            r#"<glossentry id="glob"><glossdef><para>matches *.c and {a,b}</para></glossdef></glossentry>"#,
        );
        let glossary = parse(xml.as_bytes()).unwrap();
        let body = &glossary.get("glob").unwrap().senses[0].body;
        assert_eq!(body, "matches \\*.c and \\{a,b\\}");
    }

    #[test]
    fn test_nested_emphasis_is_one_run() {
        let xml = wrap(
            r#"<glossentry id="n"><glossdef><para><emphasis>outer <emphasis>inner</emphasis> tail</emphasis> after</para></glossdef></glossentry>"#,
        );
        let glossary = parse(xml.as_bytes()).unwrap();
        let body = &glossary.get("n").unwrap().senses[0].body;
        assert_eq!(body, "*outer inner tail* after");
        assert_eq!(
            markup::parse(body),
            vec![
                markup::Span::Emphasis("outer inner tail".to_string()),
                markup::Span::Text(" after".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_breaking_space_kept() {
        let xml = wrap(
            r#"<glossentry id="nb"><glossterm>n&nbsp;b</glossterm><glossdef><para>  10&nbsp;MB
               free </para></glossdef></glossentry>"#,
        );
        let glossary = parse(xml.as_bytes()).unwrap();
        let entry = glossary.get("nb").unwrap();
        assert_eq!(entry.term, "n\u{a0}b");
        assert_eq!(entry.senses[0].body, "10\u{a0}MB free");
        assert_eq!(collapse_whitespace(" a \u{a0} \t b\n"), "a \u{a0} b");
    }

    #[test]
    fn test_namespaced_document() {
        let xml = r#"<db:glossary xmlns:db="http://docbook.org/ns/docbook">
            <db:glossentry xml:id="ns"><db:glossterm>ns</db:glossterm>
            <db:glossdef><db:para>in a <db:emphasis>namespace</db:emphasis></db:para></db:glossdef>
            </db:glossentry></db:glossary>"#;
        let glossary = parse(xml.as_bytes()).unwrap();
        assert_eq!(glossary.get("ns").unwrap().senses[0].body, "in a *namespace*");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_entities("a &bogus; b &amp; c"), "a &bogus; b & c");
        assert_eq!(decode_entities("&#65;&#x42; & done"), "AB & done");
        assert_eq!(decode_entities("&mdash;"), "\u{2014}");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  --Hello, World--  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse(b"<glossary><glossentry id=\"a\"></glossary>").unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
    }

    #[test]
    fn test_unclosed_document() {
        let err = parse(b"<glossary><glossentry id=\"a\"></glossentry>").unwrap_err();
        assert!(matches!(err, ParseError::Unclosed(_) | ParseError::Xml { .. }));
    }

    #[test]
    fn test_no_entries() {
        let err = parse(b"<article><para>nothing here</para></article>").unwrap_err();
        assert!(matches!(err, ParseError::NoEntries));
    }

    #[test]
    fn test_missing_identifier() {
        let xml = wrap("<glossentry><glossdef><para>anonymous</para></glossdef></glossentry>");
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingIdentifier { .. }));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(sample(), sample());
    }
}
