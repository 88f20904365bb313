//! Scenario filters applied while building the tree.
//!
//! A [`Filter`] combines three kinds of criteria; an element is retained when
//! it satisfies every kind that is set:
//!
//! - **tag expressions**: each expression is a comma-separated OR of tags,
//!   where `~@tag` negates; several expressions are ANDed together
//!   (`@fast,@smoke` and `~@wip` keeps fast-or-smoke scenarios that are not wip)
//! - **names**: the element name contains any of the given patterns
//! - **lines**: the element header, one of its tag or step lines, or a line of
//!   one of its examples, is listed
//!
//! Tags of the feature are inherited by all of its elements, and the tags of an
//! examples section apply to that section only.

use super::ast::{Examples, Feature, FeatureElement, Tag};

#[derive(Clone, Debug, PartialEq, Eq)]
struct TagTerm {
    name: String,
    negated: bool,
}

impl TagTerm {
    fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        let (negated, name) = match term.strip_prefix('~') {
            Some(rest) => (true, rest.trim()),
            None => (false, term),
        };
        if name.is_empty() {
            return None;
        }
        let name = if name.starts_with('@') {
            name.to_string()
        } else {
            format!("@{name}")
        };
        Some(Self { name, negated })
    }

    fn matches(&self, tags: &[&str]) -> bool {
        tags.contains(&self.name.as_str()) != self.negated
    }
}

/// Criteria narrowing which scenarios end up in the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    tag_groups: Vec<Vec<TagTerm>>,
    names: Vec<String>,
    lines: Vec<usize>,
}

impl Filter {
    /// A filter that retains everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag expression such as `"@fast,~@wip"`.
    pub fn with_tags(mut self, expression: &str) -> Self {
        let group: Vec<_> = expression.split(',').filter_map(TagTerm::parse).collect();
        if !group.is_empty() {
            self.tag_groups.push(group);
        }
        self
    }

    /// Retain elements whose name contains `pattern`.
    pub fn with_name(mut self, pattern: impl Into<String>) -> Self {
        self.names.push(pattern.into());
        self
    }

    /// Retain the element declared on, or owning, the given 1-indexed line.
    pub fn with_line(mut self, line: usize) -> Self {
        self.lines.push(line);
        self
    }

    /// True when the filter retains everything.
    pub fn is_empty(&self) -> bool {
        self.tag_groups.is_empty() && self.names.is_empty() && self.lines.is_empty()
    }

    /// Drop the elements of `feature` the filter rejects.
    ///
    /// For scenario outlines the tag criteria also prune examples sections.
    pub fn apply(&self, feature: &mut Feature) {
        if self.is_empty() {
            return;
        }
        let feature_tags = feature.tags.clone();
        feature
            .elements
            .retain_mut(|element| self.retain(&feature_tags, element));
    }

    fn retain(&self, feature_tags: &[Tag], element: &mut FeatureElement) -> bool {
        if !self.names.is_empty() && !self.names.iter().any(|n| element.name().contains(n.as_str())) {
            return false;
        }
        if !self.lines.is_empty() && !self.matches_line(element) {
            return false;
        }
        match element {
            FeatureElement::Scenario(scenario) => {
                self.matches_tags(&[feature_tags, scenario.tags.as_slice()])
            }
            FeatureElement::ScenarioOutline(outline) => {
                if self.tag_groups.is_empty() {
                    return true;
                }
                let outline_tags = outline.tags.clone();
                outline.examples.retain(|examples| {
                    self.matches_tags(&[feature_tags, outline_tags.as_slice(), examples.tags.as_slice()])
                });
                !outline.examples.is_empty()
            }
        }
    }

    fn matches_tags(&self, sources: &[&[Tag]]) -> bool {
        let tags: Vec<&str> = sources
            .iter()
            .flat_map(|tags| tags.iter().map(|t| t.name.as_str()))
            .collect();
        self.tag_groups
            .iter()
            .all(|group| group.iter().any(|term| term.matches(&tags)))
    }

    fn matches_line(&self, element: &FeatureElement) -> bool {
        let mut lines = vec![element.line()];
        lines.extend(element.tags().iter().map(|tag| tag.line));
        lines.extend(element.steps().iter().map(|step| step.line));
        if let FeatureElement::ScenarioOutline(outline) = element {
            lines.extend(outline.examples.iter().flat_map(examples_lines));
        }
        lines.iter().any(|line| self.lines.contains(line))
    }
}

fn examples_lines(examples: &Examples) -> Vec<usize> {
    std::iter::once(examples.line)
        .chain(examples.tags.iter().map(|tag| tag.line))
        .chain(examples.table.lines())
        .collect()
}
