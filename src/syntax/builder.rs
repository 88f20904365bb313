//! Event-driven tree construction shared by both backends.
//!
//! Backends report what they recognise through the [`Listener`] callbacks, in
//! document order. [`AstBuilder`] checks that the events arrive in an order a
//! feature file allows and assembles the [`Feature`] tree.
//!
//! Comments and tags are held until the next header that can own them.
//! Comments left over at the end of the document belong to the feature.

use tracing::trace;

use super::ast::*;
use super::filter::Filter;
use crate::error::SyntaxError;

/// Header of a feature, background, scenario, outline or examples section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header<'a> {
    pub keyword: &'a str,
    pub name: &'a str,
    /// Raw description lines, newline-separated, indentation included.
    pub description: &'a str,
    pub line: usize,
}

/// Callbacks a backend drives while it walks a document.
pub trait Listener {
    fn comment(&mut self, text: &str, line: usize) -> Result<(), SyntaxError>;
    fn tag(&mut self, name: &str, line: usize) -> Result<(), SyntaxError>;
    fn feature(&mut self, header: Header<'_>) -> Result<(), SyntaxError>;
    fn background(&mut self, header: Header<'_>) -> Result<(), SyntaxError>;
    fn scenario(&mut self, header: Header<'_>) -> Result<(), SyntaxError>;
    fn scenario_outline(&mut self, header: Header<'_>) -> Result<(), SyntaxError>;
    fn examples(&mut self, header: Header<'_>) -> Result<(), SyntaxError>;
    fn step(&mut self, keyword: &str, name: &str, line: usize) -> Result<(), SyntaxError>;
    fn row(&mut self, cells: Vec<String>, line: usize) -> Result<(), SyntaxError>;
    fn doc_string(&mut self, content: &str, line: usize) -> Result<(), SyntaxError>;
    fn eof(&mut self, line: usize) -> Result<(), SyntaxError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Start,
    Feature,
    Background,
    Scenario,
    ScenarioOutline,
    Examples,
}

/// Builds a [`Feature`] from listener events.
#[derive(Debug)]
pub struct AstBuilder {
    path: String,
    filter: Filter,
    feature: Option<Feature>,
    section: Section,
    section_line: usize,
    pending_tags: Vec<Tag>,
    pending_comments: Vec<Comment>,
}

impl AstBuilder {
    pub fn new(path: impl Into<String>, filter: Filter) -> Self {
        Self {
            path: path.into(),
            filter,
            feature: None,
            section: Section::Start,
            section_line: 0,
            pending_tags: Vec::new(),
            pending_comments: Vec::new(),
        }
    }

    /// The accumulated tree with the filter applied, or `None` for a document
    /// without a feature.
    pub fn ast(self) -> Option<Feature> {
        let filter = self.filter;
        self.feature.map(|mut feature| {
            filter.apply(&mut feature);
            feature
        })
    }

    fn error(&self, line: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::at_line(self.path.clone(), line, message)
    }

    fn feature_mut(&mut self, line: usize, what: &str) -> Result<&mut Feature, SyntaxError> {
        let path = &self.path;
        self.feature.as_mut().ok_or_else(|| {
            SyntaxError::at_line(
                path.clone(),
                line,
                format!("expected a feature header before {what}"),
            )
        })
    }

    /// Leave the current section; fails if it is missing mandatory content.
    fn close_section(&mut self, next: Section) -> Result<(), SyntaxError> {
        let line = self.section_line;
        match (self.section, &self.feature) {
            (Section::Examples, Some(feature)) => {
                if let Some(FeatureElement::ScenarioOutline(outline)) = feature.elements.last() {
                    if outline.examples.last().is_some_and(|e| e.table.rows.is_empty()) {
                        return Err(self.error(line, "examples section has no table"));
                    }
                }
            }
            (Section::ScenarioOutline, _) if next != Section::Examples => {
                return Err(self.error(line, "scenario outline has no examples"));
            }
            _ => {}
        }
        Ok(())
    }

    fn open_section(&mut self, section: Section, line: usize) -> Result<(), SyntaxError> {
        self.close_section(section)?;
        trace!(?section, line, "open section");
        self.section = section;
        self.section_line = line;
        Ok(())
    }

    fn take_tags(&mut self) -> Vec<Tag> {
        std::mem::take(&mut self.pending_tags)
    }

    fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.pending_comments)
    }

    fn current_steps(&mut self) -> Option<&mut Vec<Step>> {
        let section = self.section;
        let feature = self.feature.as_mut()?;
        match section {
            Section::Background => feature.background.as_mut().map(|b| &mut b.steps),
            Section::Scenario => match feature.elements.last_mut() {
                Some(FeatureElement::Scenario(s)) => Some(&mut s.steps),
                _ => None,
            },
            Section::ScenarioOutline => match feature.elements.last_mut() {
                Some(FeatureElement::ScenarioOutline(o)) => Some(&mut o.steps),
                _ => None,
            },
            _ => None,
        }
    }

    fn current_examples(&mut self) -> Option<&mut Examples> {
        if self.section != Section::Examples {
            return None;
        }
        match self.feature.as_mut()?.elements.last_mut() {
            Some(FeatureElement::ScenarioOutline(o)) => o.examples.last_mut(),
            _ => None,
        }
    }
}

/// Trim each line and drop the blank lines around the block.
pub fn normalize_description(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

impl Listener for AstBuilder {
    fn comment(&mut self, text: &str, line: usize) -> Result<(), SyntaxError> {
        self.pending_comments.push(Comment {
            text: text.trim().to_string(),
            line,
        });
        Ok(())
    }

    fn tag(&mut self, name: &str, line: usize) -> Result<(), SyntaxError> {
        self.pending_tags.push(Tag {
            name: name.to_string(),
            line,
        });
        Ok(())
    }

    fn feature(&mut self, header: Header<'_>) -> Result<(), SyntaxError> {
        if self.feature.is_some() {
            return Err(self.error(header.line, "a document holds a single feature"));
        }
        self.open_section(Section::Feature, header.line)?;
        self.feature = Some(Feature {
            language: None,
            comments: self.take_comments(),
            tags: self.take_tags(),
            keyword: header.keyword.to_string(),
            name: header.name.trim().to_string(),
            description: normalize_description(header.description),
            line: header.line,
            background: None,
            elements: Vec::new(),
        });
        Ok(())
    }

    fn background(&mut self, header: Header<'_>) -> Result<(), SyntaxError> {
        if !self.pending_tags.is_empty() {
            return Err(self.error(header.line, "tags are not allowed on a background"));
        }
        let feature = self.feature_mut(header.line, "a background")?;
        let misplaced = feature.background.is_some() || !feature.elements.is_empty();
        if misplaced {
            return Err(self.error(
                header.line,
                "background must come once, before the first scenario",
            ));
        }
        self.open_section(Section::Background, header.line)?;
        let background = Background {
            comments: self.take_comments(),
            keyword: header.keyword.to_string(),
            name: header.name.trim().to_string(),
            description: normalize_description(header.description),
            line: header.line,
            steps: Vec::new(),
        };
        self.feature_mut(header.line, "a background")?.background = Some(background);
        Ok(())
    }

    fn scenario(&mut self, header: Header<'_>) -> Result<(), SyntaxError> {
        self.feature_mut(header.line, "a scenario")?;
        self.open_section(Section::Scenario, header.line)?;
        let scenario = Scenario {
            comments: self.take_comments(),
            tags: self.take_tags(),
            keyword: header.keyword.to_string(),
            name: header.name.trim().to_string(),
            description: normalize_description(header.description),
            line: header.line,
            steps: Vec::new(),
        };
        self.feature_mut(header.line, "a scenario")?
            .elements
            .push(FeatureElement::Scenario(scenario));
        Ok(())
    }

    fn scenario_outline(&mut self, header: Header<'_>) -> Result<(), SyntaxError> {
        self.feature_mut(header.line, "a scenario outline")?;
        self.open_section(Section::ScenarioOutline, header.line)?;
        let outline = ScenarioOutline {
            comments: self.take_comments(),
            tags: self.take_tags(),
            keyword: header.keyword.to_string(),
            name: header.name.trim().to_string(),
            description: normalize_description(header.description),
            line: header.line,
            steps: Vec::new(),
            examples: Vec::new(),
        };
        self.feature_mut(header.line, "a scenario outline")?
            .elements
            .push(FeatureElement::ScenarioOutline(outline));
        Ok(())
    }

    fn examples(&mut self, header: Header<'_>) -> Result<(), SyntaxError> {
        if !matches!(self.section, Section::ScenarioOutline | Section::Examples) {
            return Err(self.error(header.line, "examples must follow a scenario outline"));
        }
        self.open_section(Section::Examples, header.line)?;
        let examples = Examples {
            comments: self.take_comments(),
            tags: self.take_tags(),
            keyword: header.keyword.to_string(),
            name: header.name.trim().to_string(),
            description: normalize_description(header.description),
            line: header.line,
            table: Table::default(),
        };
        let path = self.path.clone();
        match self.feature_mut(header.line, "examples")?.elements.last_mut() {
            Some(FeatureElement::ScenarioOutline(outline)) => {
                outline.examples.push(examples);
                Ok(())
            }
            _ => Err(SyntaxError::at_line(
                path,
                header.line,
                "examples must follow a scenario outline",
            )),
        }
    }

    fn step(&mut self, keyword: &str, name: &str, line: usize) -> Result<(), SyntaxError> {
        if !self.pending_tags.is_empty() {
            return Err(self.error(
                line,
                "tags must precede a scenario, outline or examples header",
            ));
        }
        let step = Step {
            keyword: keyword.to_string(),
            name: name.trim().to_string(),
            line,
            argument: None,
        };
        let path = self.path.clone();
        match self.current_steps() {
            Some(steps) => {
                steps.push(step);
                Ok(())
            }
            None => Err(SyntaxError::at_line(
                path,
                line,
                "step outside of a background, scenario or outline",
            )),
        }
    }

    fn row(&mut self, cells: Vec<String>, line: usize) -> Result<(), SyntaxError> {
        let row = Row { cells, line };
        if let Some(examples) = self.current_examples() {
            examples.table.rows.push(row);
            return Ok(());
        }
        let path = self.path.clone();
        let Some(step) = self.current_steps().and_then(|steps| steps.last_mut()) else {
            return Err(SyntaxError::at_line(
                path,
                line,
                "table row without a step or examples section",
            ));
        };
        match step.argument.as_mut() {
            Some(StepArgument::Table(table)) => table.rows.push(row),
            Some(StepArgument::DocString(_)) => {
                return Err(SyntaxError::at_line(path, line, "step already has a doc string"));
            }
            None => step.argument = Some(StepArgument::Table(Table { rows: vec![row] })),
        }
        Ok(())
    }

    fn doc_string(&mut self, content: &str, line: usize) -> Result<(), SyntaxError> {
        let path = self.path.clone();
        match self.current_steps().and_then(|steps| steps.last_mut()) {
            Some(step) if step.argument.is_none() => {
                step.argument = Some(StepArgument::DocString(DocString {
                    content: content.to_string(),
                    line,
                }));
                Ok(())
            }
            _ => Err(SyntaxError::at_line(path, line, "doc string without a step")),
        }
    }

    fn eof(&mut self, line: usize) -> Result<(), SyntaxError> {
        if !self.pending_tags.is_empty() {
            return Err(self.error(line, "tags at end of document"));
        }
        if self.feature.is_some() {
            self.close_section(Section::Start)?;
            let comments = self.take_comments();
            if let Some(feature) = self.feature.as_mut() {
                feature.comments.extend(comments);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(keyword: &'a str, name: &'a str, line: usize) -> Header<'a> {
        Header {
            keyword,
            name,
            description: "",
            line,
        }
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(
            normalize_description("\n   In order to test\n     I write docs  \n\n"),
            "In order to test\nI write docs"
        );
        assert_eq!(normalize_description(""), "");
        assert_eq!(normalize_description("  \n  "), "");
    }

    #[test]
    fn test_builds_scenario_with_table_step() {
        let mut b = AstBuilder::new("a.feature", Filter::new());
        b.tag("@smoke", 1).unwrap();
        b.feature(header("Feature", " Login ", 2)).unwrap();
        b.scenario(header("Scenario", "ok", 4)).unwrap();
        b.step("Given ", "users:", 5).unwrap();
        b.row(vec!["name".into()], 6).unwrap();
        b.row(vec!["alice".into()], 7).unwrap();
        b.eof(8).unwrap();

        let feature = b.ast().unwrap();
        assert_eq!(feature.name, "Login");
        assert_eq!(feature.tags[0].name, "@smoke");
        let steps = feature.elements[0].steps();
        let Some(StepArgument::Table(table)) = &steps[0].argument else {
            panic!("expected table argument");
        };
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_step_before_feature_is_rejected() {
        let mut b = AstBuilder::new("a.feature", Filter::new());
        let err = b.step("Given ", "x", 1).unwrap_err();
        assert_eq!(err.path, "a.feature");
    }

    #[test]
    fn test_scenario_before_feature_is_rejected() {
        let mut b = AstBuilder::new("b.feature", Filter::new());
        let err = b.scenario(header("Scenario", "x", 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "b.feature:1:1: expected a feature header before a scenario"
        );
    }

    #[test]
    fn test_outline_without_examples_is_rejected() {
        let mut b = AstBuilder::new("c.feature", Filter::new());
        b.feature(header("Feature", "f", 1)).unwrap();
        b.scenario_outline(header("Scenario Outline", "o", 2)).unwrap();
        b.step("Given ", "<x>", 3).unwrap();
        assert!(b.eof(4).is_err());
    }

    #[test]
    fn test_doc_string_after_table_is_rejected() {
        let mut b = AstBuilder::new("c.feature", Filter::new());
        b.feature(header("Feature", "f", 1)).unwrap();
        b.scenario(header("Scenario", "s", 2)).unwrap();
        b.step("Given ", "x", 3).unwrap();
        b.row(vec!["a".into()], 4).unwrap();
        assert!(b.doc_string("text", 5).is_err());
    }

    #[test]
    fn test_trailing_comments_belong_to_feature() {
        let mut b = AstBuilder::new("d.feature", Filter::new());
        b.comment("# top", 1).unwrap();
        b.feature(header("Feature", "f", 2)).unwrap();
        b.comment("# bottom", 3).unwrap();
        b.eof(4).unwrap();

        let feature = b.ast().unwrap();
        let texts: Vec<_> = feature.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["# top", "# bottom"]);
    }

    #[test]
    fn test_empty_document_has_no_tree() {
        let mut b = AstBuilder::new("e.feature", Filter::new());
        b.comment("# nothing here", 1).unwrap();
        b.eof(2).unwrap();
        assert!(b.ast().is_none());
    }
}
