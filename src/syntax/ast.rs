//! Syntax tree for a parsed feature file.
//!
//! Both backends produce these nodes through [`AstBuilder`](super::AstBuilder).
//! Lines are 1-indexed. Keywords are stored exactly as written, including
//! any trailing space of step keywords.

use std::fmt;
use std::sync::Arc;

use crate::i18n::NaturalLanguage;

/// A `@tag` attached to a feature, scenario or examples section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Tag name including the leading `@`.
    pub name: String,
    pub line: usize,
}

/// A `#` comment line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Comment text including the leading `#`.
    pub text: String,
    pub line: usize,
}

/// A data table row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
    pub line: usize,
}

/// A data table attached to a step or an examples section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    /// The first row, used as column names by examples tables.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Lines of every row.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|row| row.line)
    }
}

/// A `"""`-delimited block of text attached to a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocString {
    /// Content with the fence indentation removed, without trailing newline.
    pub content: String,
    /// Line of the opening fence.
    pub line: usize,
}

/// The multiline argument a step may carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepArgument {
    Table(Table),
    DocString(DocString),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub keyword: String,
    pub name: String,
    pub line: usize,
    pub argument: Option<StepArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Background {
    pub comments: Vec<Comment>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub line: usize,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub line: usize,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Examples {
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub line: usize,
    pub table: Table,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioOutline {
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub line: usize,
    pub steps: Vec<Step>,
    pub examples: Vec<Examples>,
}

/// A scenario or a scenario outline, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureElement {
    Scenario(Scenario),
    ScenarioOutline(ScenarioOutline),
}

impl FeatureElement {
    pub fn name(&self) -> &str {
        match self {
            FeatureElement::Scenario(s) => &s.name,
            FeatureElement::ScenarioOutline(o) => &o.name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            FeatureElement::Scenario(s) => s.line,
            FeatureElement::ScenarioOutline(o) => o.line,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        match self {
            FeatureElement::Scenario(s) => &s.tags,
            FeatureElement::ScenarioOutline(o) => &o.tags,
        }
    }

    pub fn steps(&self) -> &[Step] {
        match self {
            FeatureElement::Scenario(s) => &s.steps,
            FeatureElement::ScenarioOutline(o) => &o.steps,
        }
    }
}

/// Root of the tree.
#[derive(Clone)]
pub struct Feature {
    /// The language the document was parsed with. Set by the dispatcher,
    /// never by a backend.
    pub language: Option<Arc<NaturalLanguage>>,
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub line: usize,
    pub background: Option<Background>,
    pub elements: Vec<FeatureElement>,
}

impl Feature {
    /// Identifier of the stamped language, if any.
    pub fn language_identifier(&self) -> Option<&str> {
        self.language.as_deref().map(NaturalLanguage::identifier)
    }

    /// Compare everything except the language back-reference.
    pub fn same_content(&self, other: &Feature) -> bool {
        self.comments == other.comments
            && self.tags == other.tags
            && self.keyword == other.keyword
            && self.name == other.name
            && self.description == other.description
            && self.line == other.line
            && self.background == other.background
            && self.elements == other.elements
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("language", &self.language_identifier())
            .field("comments", &self.comments)
            .field("tags", &self.tags)
            .field("keyword", &self.keyword)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("line", &self.line)
            .field("background", &self.background)
            .field("elements", &self.elements)
            .finish()
    }
}
