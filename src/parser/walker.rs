//! Pest pairs → listener events.
//!
//! Pairs are visited in document order. Section headers are reported once
//! their description has been collected, so comments and tags that follow a
//! header are reported after it.

use pest::iterators::{Pair, Pairs};

use super::dedent;
use crate::error::SyntaxError;
use crate::i18n::Concept;
use crate::syntax::{Header, Listener};

type Rule<'a> = &'a str;

/// The kinds of header a document can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Feature,
    Background,
    Scenario,
    ScenarioOutline,
    Examples,
}

impl SectionKind {
    pub(crate) const ALL: [SectionKind; 5] = [
        SectionKind::Feature,
        SectionKind::Background,
        SectionKind::Scenario,
        SectionKind::ScenarioOutline,
        SectionKind::Examples,
    ];

    pub(crate) fn concept(self) -> Concept {
        match self {
            SectionKind::Feature => Concept::Feature,
            SectionKind::Background => Concept::Background,
            SectionKind::Scenario => Concept::Scenario,
            SectionKind::ScenarioOutline => Concept::ScenarioOutline,
            SectionKind::Examples => Concept::Examples,
        }
    }

    fn from_rule(rule: &str) -> Option<Self> {
        match rule {
            "feature" => Some(SectionKind::Feature),
            "background" => Some(SectionKind::Background),
            "scenario" => Some(SectionKind::Scenario),
            "scenario_outline" => Some(SectionKind::ScenarioOutline),
            "examples" => Some(SectionKind::Examples),
            _ => None,
        }
    }

    pub(crate) fn emit<L: Listener>(self, listener: &mut L, header: Header<'_>) -> Result<(), SyntaxError> {
        match self {
            SectionKind::Feature => listener.feature(header),
            SectionKind::Background => listener.background(header),
            SectionKind::Scenario => listener.scenario(header),
            SectionKind::ScenarioOutline => listener.scenario_outline(header),
            SectionKind::Examples => listener.examples(header),
        }
    }
}

/// Walk the pairs of a successful parse, reporting every node to `listener`.
pub fn walk<L: Listener>(pairs: Pairs<'_, Rule<'_>>, listener: &mut L) -> Result<(), SyntaxError> {
    for pair in pairs {
        walk_pair(pair, listener)?;
    }
    Ok(())
}

fn line_of(pair: &Pair<'_, Rule<'_>>) -> usize {
    pair.line_col().0
}

fn walk_pair<L: Listener>(pair: Pair<'_, Rule<'_>>, listener: &mut L) -> Result<(), SyntaxError> {
    let rule = pair.as_rule();
    if let Some(kind) = SectionKind::from_rule(rule) {
        return walk_section(kind, pair, listener);
    }
    match rule {
        "comment" => listener.comment(pair.as_str(), line_of(&pair)),
        "tag" => listener.tag(pair.as_str(), line_of(&pair)),
        "step" => walk_step(pair, listener),
        "table_row" => {
            let line = line_of(&pair);
            let cells = pair
                .into_inner()
                .filter(|p| p.as_rule() == "cell")
                .map(|p| p.as_str().trim().to_string())
                .collect();
            listener.row(cells, line)
        }
        "doc_string" => walk_doc_string(pair, listener),
        "EOI" => Ok(()),
        _ => walk(pair.into_inner(), listener),
    }
}

fn walk_section<L: Listener>(
    kind: SectionKind,
    pair: Pair<'_, Rule<'_>>,
    listener: &mut L,
) -> Result<(), SyntaxError> {
    let mut keyword = ("", 0);
    let mut name = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            rule if rule.ends_with("_keyword") => keyword = (inner.as_str(), line_of(&inner)),
            "text" => name = inner.as_str(),
            "description" => {
                let header = Header {
                    keyword: keyword.0,
                    name,
                    description: inner.as_str(),
                    line: keyword.1,
                };
                kind.emit(listener, header)?;
            }
            _ => walk_pair(inner, listener)?,
        }
    }
    Ok(())
}

fn walk_step<L: Listener>(pair: Pair<'_, Rule<'_>>, listener: &mut L) -> Result<(), SyntaxError> {
    let line = line_of(&pair);
    let mut keyword = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            "step_keyword" => keyword = inner.as_str(),
            "text" => listener.step(keyword, inner.as_str(), line)?,
            _ => walk_pair(inner, listener)?,
        }
    }
    Ok(())
}

fn walk_doc_string<L: Listener>(pair: Pair<'_, Rule<'_>>, listener: &mut L) -> Result<(), SyntaxError> {
    let line = line_of(&pair);
    let indent = pair
        .as_str()
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();
    let body = pair
        .into_inner()
        .find(|p| p.as_rule() == "doc_string_body")
        .map(|p| p.as_str())
        .unwrap_or_default();
    let lines: Vec<&str> = body.lines().collect();
    listener.doc_string(&dedent(&lines, indent), line)
}
