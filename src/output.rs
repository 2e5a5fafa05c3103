//! Console rendering of glossary entries

use crate::glossary::markup::{self, Span};
use crate::glossary::{Entry, Glossary, Sense};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

const RULE: &str = "============================================================";
const INDENT: &str = "  ";

/// When to emit terminal colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve against whether stdout is a terminal
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            ColorMode::Auto | ColorMode::Never => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
        }
    }
}

fn heading_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Yellow)).set_bold(true);
    spec
}

fn emphasis_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Cyan)).set_bold(true);
    spec
}

fn ref_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Magenta)).set_underline(true);
    spec
}

/// Print several entries separated by blank lines
pub fn render_all<W: WriteColor + ?Sized>(
    entries: &[&Entry],
    glossary: &Glossary,
    out: &mut W,
) -> io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        render(entry, glossary, out)?;
    }
    Ok(())
}

/// Print one entry: heading, grammar/pronunciation, then every sense.
///
/// Cross-references are looked up in `glossary`; ids that do not resolve are
/// printed as-is.
pub fn render<W: WriteColor + ?Sized>(
    entry: &Entry,
    glossary: &Glossary,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    out.set_color(&heading_spec())?;
    write!(out, "{}", entry.term)?;
    out.reset()?;
    writeln!(out)?;
    writeln!(out, "{RULE}")?;

    if let Some(grammar) = &entry.grammar {
        writeln!(out, "{INDENT}[{grammar}]")?;
    }
    if let Some(pronunciation) = &entry.pronunciation {
        writeln!(out, "{INDENT}Pronunciation: {pronunciation}")?;
    }

    if entry.senses.is_empty() {
        writeln!(out, "{INDENT}(no definition)")?;
        return Ok(());
    }

    let numbered = entry.senses.len() > 1;
    for (i, sense) in entry.senses.iter().enumerate() {
        if numbered {
            writeln!(out)?;
            writeln!(out, "Sense {}:", i + 1)?;
        }
        render_sense(sense, glossary, out)?;
    }

    Ok(())
}

fn render_sense<W: WriteColor + ?Sized>(
    sense: &Sense,
    glossary: &Glossary,
    out: &mut W,
) -> io::Result<()> {
    let lines: Vec<Vec<Span>> = sense.body.lines().map(markup::parse).collect();

    let inline: HashSet<String> = markup::inline_refs(&sense.body).into_iter().collect();

    for spans in &lines {
        write!(out, "{INDENT}")?;
        for span in spans {
            render_span(span, glossary, out)?;
        }
        writeln!(out)?;
    }

    let see_also: Vec<&String> = sense
        .refs
        .iter()
        .filter(|id| !inline.contains(*id))
        .collect();
    if !see_also.is_empty() {
        write!(out, "{INDENT}See also: ")?;
        for (i, id) in see_also.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            render_ref(id, None, glossary, out)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn render_span<W: WriteColor + ?Sized>(
    span: &Span,
    glossary: &Glossary,
    out: &mut W,
) -> io::Result<()> {
    match span {
        Span::Text(text) => write!(out, "{text}"),
        Span::Emphasis(text) => {
            out.set_color(&emphasis_spec())?;
            write!(out, "{text}")?;
            out.reset()
        }
        Span::Ref { id, label } => render_ref(id, label.as_deref(), glossary, out),
    }
}

fn render_ref<W: WriteColor + ?Sized>(
    id: &str,
    label: Option<&str>,
    glossary: &Glossary,
    out: &mut W,
) -> io::Result<()> {
    match glossary.term_for(id) {
        Some(term) => {
            out.set_color(&ref_spec())?;
            write!(out, "{}", label.unwrap_or(term))?;
            out.reset()
        }
        None => write!(out, "{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::parse;
    use termcolor::Buffer;

    const SAMPLE: &str = include_str!("../tests/fixtures/jargon_sample.xml");

    fn plain(entry_id: &str) -> String {
        let glossary = parse(SAMPLE.as_bytes()).unwrap();
        let mut buf = Buffer::no_color();
        render(glossary.get(entry_id).unwrap(), &glossary, &mut buf).unwrap();
        String::from_utf8(buf.into_inner()).unwrap()
    }

    /// Drop ANSI escape sequences
    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_heading_and_single_sense() {
        assert_eq!(
            plain("endian"),
            format!(
                "{RULE}\nendian\n{RULE}\n  [adj.]\n  Pronunciation: /en'dee\u{b7}*n/\n  \
                 n. Byte order: see big-endian and middle-endian.\n"
            )
        );
    }

    #[test]
    fn test_numbered_senses_and_dangling_label() {
        let text = plain("big-endian");
        assert!(text.contains("\nSense 1:\n  1. Describes a computer architecture"));
        assert!(text.contains("Compare little-endian.\n"));
        // "internet" is not an entry, so the raw id replaces the label
        assert!(text.contains("\nSense 2:\n  2. An internet the wrong way round.\n"));
    }

    #[test]
    fn test_see_also_lists_refs_not_inline() {
        let text = plain("bogus");
        assert!(text.contains("  Non-functional. Useless. See bogosity.\n"));
        assert!(text.contains("  See also: hacker\n"));
    }

    #[test]
    fn test_see_also_skips_refs_inline_in_any_paragraph() {
        let entry = Entry::new(
            "multi",
            "multi",
            vec![Sense::new(
                "first paragraph\nthen {bogus} and {the label|hacker}",
                vec!["bogus".into(), "hacker".into(), "ob".into()],
            )],
        );
        let glossary = parse(SAMPLE.as_bytes()).unwrap();
        let mut buf = Buffer::no_color();
        render(&entry, &glossary, &mut buf).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("  then bogus and the label\n"));
        assert!(text.contains("  See also: OB\n"));
    }

    #[test]
    fn test_paragraphs_on_separate_lines() {
        let text = plain("hacker");
        assert!(text.contains(
            "  [originally, someone who makes furniture with an axe]\n  A person who enjoys"
        ));
    }

    #[test]
    fn test_empty_entry() {
        assert_eq!(plain("ob"), format!("{RULE}\nOB\n{RULE}\n  (no definition)\n"));
    }

    #[test]
    fn test_dangling_refs_never_fail() {
        let entry = Entry::new(
            "lonely",
            "lonely",
            vec![Sense::new("see {nowhere} and {A label|gone}", vec!["elsewhere".into()])],
        );
        let glossary: Glossary = [entry.clone()].into_iter().collect();
        let mut buf = Buffer::no_color();
        render(&entry, &glossary, &mut buf).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("  see nowhere and gone\n"));
        assert!(text.contains("  See also: elsewhere\n"));
    }

    #[test]
    fn test_styling_does_not_change_text() {
        let glossary = parse(SAMPLE.as_bytes()).unwrap();
        let entries: Vec<&Entry> = glossary.iter().collect();

        let mut colored = Buffer::ansi();
        render_all(&entries, &glossary, &mut colored).unwrap();
        let mut uncolored = Buffer::no_color();
        render_all(&entries, &glossary, &mut uncolored).unwrap();

        let colored = String::from_utf8(colored.into_inner()).unwrap();
        let uncolored = String::from_utf8(uncolored.into_inner()).unwrap();
        assert!(colored.contains('\x1b'));
        assert_eq!(strip_ansi(&colored), uncolored);
    }

    #[test]
    fn test_render_all_separates_entries() {
        let glossary = parse(SAMPLE.as_bytes()).unwrap();
        let entries = vec![glossary.get("ob").unwrap(), glossary.get("ob").unwrap()];
        let mut buf = Buffer::no_color();
        render_all(&entries, &glossary, &mut buf).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("(no definition)\n\n===="));
    }

    #[test]
    fn test_color_mode_never() {
        assert_eq!(ColorMode::Never.choice(), ColorChoice::Never);
        assert_eq!(ColorMode::Always.choice(), ColorChoice::Always);
    }
}
