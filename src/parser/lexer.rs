//! Line lexer for feature files.
//!
//! [`GherkinLexer`] classifies each line by its leading characters and the
//! language's keywords, and reports what it finds to a [`Listener`]:
//!
//! | line starts with | event |
//! |---|---|
//! | `#` | comment |
//! | `@` | one tag event per tag |
//! | `\|` | table row |
//! | `"""` | doc string, up to the closing fence |
//! | a step keyword | step |
//! | a section keyword and `:` | header, reported after its description |
//!
//! Any other non-blank line is description text for the most recent header,
//! and an error if no header is open.

use std::sync::Arc;

use tracing::{debug, trace};

use super::tokens::{split_row, split_tags};
use super::walker::SectionKind;
use super::{dedent, eof_line, present_keywords, present_step_keywords};
use crate::error::{Result, SyntaxError};
use crate::i18n::NaturalLanguage;
use crate::syntax::{AstBuilder, Feature, Filter, Header, Listener};

const DOC_STRING_FENCE: &str = "\"\"\"";

/// A header whose description lines are still being collected.
struct PendingHeader<'s> {
    kind: SectionKind,
    keyword: &'s str,
    name: &'s str,
    line: usize,
    description: Vec<&'s str>,
}

struct OpenDocString<'s> {
    indent: usize,
    line: usize,
    lines: Vec<&'s str>,
}

/// Streams listener events for one language.
pub struct GherkinLexer<'l, L: Listener> {
    listener: &'l mut L,
    step_keywords: Vec<String>,
    headers: Vec<(String, SectionKind)>,
}

impl<'l, L: Listener> GherkinLexer<'l, L> {
    pub fn new(language: &NaturalLanguage, listener: &'l mut L) -> Self {
        let mut step_keywords = present_step_keywords(language);
        step_keywords.retain(|kw| !kw.is_empty());
        step_keywords.sort_by_key(|kw| std::cmp::Reverse(kw.chars().count()));

        let mut headers: Vec<(String, SectionKind)> = SectionKind::ALL
            .into_iter()
            .flat_map(|kind| {
                present_keywords(language, kind.concept(), false)
                    .into_iter()
                    .filter(|kw| !kw.is_empty())
                    .map(move |kw| (kw, kind))
            })
            .collect();
        headers.sort_by_key(|(kw, _)| std::cmp::Reverse(kw.chars().count()));

        Self {
            listener,
            step_keywords,
            headers,
        }
    }

    /// Scan a whole document, ending with the end-of-input event.
    pub fn scan(&mut self, source: &str, path: &str) -> std::result::Result<(), SyntaxError> {
        let mut pending: Option<PendingHeader<'_>> = None;
        let mut doc_string: Option<OpenDocString<'_>> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;

            if let Some(open) = doc_string.as_mut() {
                if is_fence(raw) {
                    if raw.trim_matches([' ', '\t']) != DOC_STRING_FENCE {
                        return Err(SyntaxError::at_line(path, line, "unexpected text after doc string fence"));
                    }
                    let content = dedent(&open.lines, open.indent);
                    let opened_at = open.line;
                    doc_string = None;
                    self.listener.doc_string(&content, opened_at)?;
                } else {
                    open.lines.push(raw);
                }
                continue;
            }

            let text = raw.trim_start_matches([' ', '\t']);
            if text.trim_end_matches([' ', '\t']).is_empty() {
                if let Some(header) = pending.as_mut() {
                    header.description.push(raw);
                }
                continue;
            }

            if text.starts_with('#') {
                trace!(line, "comment");
                self.flush(pending.take())?;
                self.listener.comment(text, line)?;
            } else if text.starts_with('@') {
                trace!(line, "tags");
                self.flush(pending.take())?;
                let tags = split_tags(text)
                    .ok_or_else(|| SyntaxError::at_line(path, line, "malformed tag line"))?;
                for tag in tags {
                    self.listener.tag(tag, line)?;
                }
            } else if text.starts_with('|') {
                trace!(line, "table row");
                self.flush(pending.take())?;
                let cells = split_row(text)
                    .ok_or_else(|| SyntaxError::at_line(path, line, "table row must start and end with `|`"))?;
                self.listener.row(cells, line)?;
            } else if is_fence(text) {
                trace!(line, "doc string");
                self.flush(pending.take())?;
                if text.trim_end_matches([' ', '\t']) != DOC_STRING_FENCE {
                    return Err(SyntaxError::at_line(path, line, "unexpected text after doc string fence"));
                }
                doc_string = Some(OpenDocString {
                    indent: raw.len() - text.len(),
                    line,
                    lines: Vec::new(),
                });
            } else if let Some(len) = self.step_keyword(text) {
                let (keyword, name) = text.split_at(len);
                trace!(line, keyword, "step");
                self.flush(pending.take())?;
                self.listener.step(keyword, name, line)?;
            } else if let Some((len, kind)) = self.header_keyword(text) {
                let keyword = &text[..len];
                trace!(line, keyword, ?kind, "header");
                self.flush(pending.take())?;
                pending = Some(PendingHeader {
                    kind,
                    keyword,
                    name: &text[len + 1..],
                    line,
                    description: Vec::new(),
                });
            } else if let Some(header) = pending.as_mut() {
                header.description.push(raw);
            } else {
                return Err(SyntaxError::at_line(
                    path,
                    line,
                    format!("unexpected text {:?}", text.trim_end()),
                ));
            }
        }

        if let Some(open) = doc_string {
            return Err(SyntaxError::at_line(path, open.line, "unterminated doc string"));
        }
        self.flush(pending)?;
        debug!(path, lines = source.lines().count(), "scanned document");
        self.listener.eof(eof_line(source))
    }

    fn flush(&mut self, pending: Option<PendingHeader<'_>>) -> std::result::Result<(), SyntaxError> {
        let Some(header) = pending else {
            return Ok(());
        };
        let description = header.description.join("\n");
        header.kind.emit(
            &mut *self.listener,
            Header {
                keyword: header.keyword,
                name: header.name,
                description: &description,
                line: header.line,
            },
        )
    }

    /// Byte length of the longest step keyword `text` starts with.
    fn step_keyword(&self, text: &str) -> Option<usize> {
        self.step_keywords
            .iter()
            .find(|kw| text.starts_with(kw.as_str()))
            .map(String::len)
    }

    /// Byte length and kind of the longest section keyword followed by `:`.
    fn header_keyword(&self, text: &str) -> Option<(usize, SectionKind)> {
        self.headers
            .iter()
            .find(|(kw, _)| {
                text.strip_prefix(kw.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
            })
            .map(|(kw, kind)| (kw.len(), *kind))
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with(DOC_STRING_FENCE)
}

/// Parse `source` with the line lexer into a tree.
pub fn parse(
    language: &Arc<NaturalLanguage>,
    source: &str,
    path: &str,
    filter: &Filter,
) -> Result<Option<Feature>> {
    let mut builder = AstBuilder::new(path, filter.clone());
    GherkinLexer::new(language, &mut builder).scan(source, path)?;
    Ok(builder.ast())
}
