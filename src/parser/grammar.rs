//! Runtime grammar compilation.
//!
//! A [`GrammarCompiler`] renders the grammar template with one language's
//! keywords and compiles the resulting pest grammar with `pest_meta`. The
//! [`CompiledParser`] it returns runs the grammar on a `pest_vm::Vm` and walks
//! the pairs into the shared tree builder.

use std::fmt;
use std::time::Instant;

use indexmap::IndexSet;
use minijinja::{Environment, Value, context};
use pest::error::{ErrorVariant, LineColLocation};
use pest_meta::optimizer::OptimizedRule;
use pest_vm::Vm;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, info};

use super::{eof_line, present_keywords, present_step_keywords, walker};
use crate::base::LineCol;
use crate::error::{Error, Result, SyntaxError};
use crate::i18n::{Concept, NaturalLanguage};
use crate::syntax::{AstBuilder, Feature, Filter, Listener};

/// Suffix appended to the grammar identifier to name the entry rule.
pub const ENTRY_RULE_SUFFIX: &str = "Parser";

/// Renders and compiles per-language grammars from one template.
pub struct GrammarCompiler {
    env: Environment<'static>,
    template: String,
}

impl GrammarCompiler {
    pub fn new(template: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.add_filter("alternation", alternation);
        Self {
            env,
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the grammar text for `language`.
    pub fn render(&self, language: &NaturalLanguage) -> Result<String> {
        let ctx = context! {
            grammar_identifier => language.grammar_identifier(),
            name => language.name(),
            feature_keywords => present_keywords(language, Concept::Feature, false),
            background_keywords => present_keywords(language, Concept::Background, false),
            scenario_keywords => present_keywords(language, Concept::Scenario, false),
            scenario_outline_keywords => present_keywords(language, Concept::ScenarioOutline, false),
            examples_keywords => present_keywords(language, Concept::Examples, false),
            step_keywords => present_step_keywords(language),
        };
        self.env
            .render_str(&self.template, ctx)
            .map_err(|e| Error::GrammarCompilation {
                language: language.identifier().to_string(),
                message: e.to_string(),
            })
    }

    /// Render and compile the grammar for `language`.
    pub fn compile(&self, language: &NaturalLanguage) -> Result<CompiledParser> {
        let start = Instant::now();
        let grammar = self.render(language)?;

        let (_, rules) = pest_meta::parse_and_optimize(&grammar).map_err(|errors| {
            Error::GrammarCompilation {
                language: language.identifier().to_string(),
                message: errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            }
        })?;

        let entry_rule = format!("{}{ENTRY_RULE_SUFFIX}", language.grammar_identifier());
        if !rules.iter().any(|rule| rule.name == entry_rule) {
            return Err(Error::GeneratedParserNotFound {
                language: language.identifier().to_string(),
                expected: entry_rule,
            });
        }

        info!(
            language = language.identifier(),
            rules = rules.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "compiled grammar"
        );

        Ok(CompiledParser {
            language: SmolStr::new(language.identifier()),
            descriptions: rule_descriptions(language),
            entry_rule,
            rules,
        })
    }
}

impl fmt::Debug for GrammarCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarCompiler")
            .field("template_len", &self.template.len())
            .finish()
    }
}

/// A compiled grammar, ready to parse documents of one language.
#[derive(Clone)]
pub struct CompiledParser {
    language: SmolStr,
    entry_rule: String,
    rules: Vec<OptimizedRule>,
    descriptions: FxHashMap<&'static str, String>,
}

impl CompiledParser {
    /// Name of the rule a whole document must match.
    pub fn entry_rule(&self) -> &str {
        &self.entry_rule
    }

    /// Names of all compiled rules.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    /// Parse `source` completely; a mismatch becomes a [`SyntaxError`]
    /// naming `path`.
    pub fn parse_or_fail(&self, source: &str, path: &str, filter: &Filter) -> Result<Option<Feature>> {
        let vm = Vm::new(self.rules.clone());
        let pairs = vm
            .parse(&self.entry_rule, source)
            .map_err(|err| self.syntax_error(path, err))?;
        debug!(language = %self.language, path, "grammar matched");

        let mut builder = AstBuilder::new(path, filter.clone());
        walker::walk(pairs, &mut builder)?;
        builder.eof(eof_line(source))?;
        Ok(builder.ast())
    }

    fn syntax_error(&self, path: &str, err: pest::error::Error<&str>) -> SyntaxError {
        let position = match err.line_col {
            LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => LineCol::from(pos),
        };
        let message = match &err.variant {
            ErrorVariant::ParsingError {
                positives,
                negatives,
            } => self.expectation(positives, negatives),
            ErrorVariant::CustomError { message } => message.clone(),
        };
        SyntaxError::new(path, Some(position), message)
    }

    fn expectation(&self, positives: &[&str], negatives: &[&str]) -> String {
        let describe = |rules: &[&str]| {
            let mut seen = IndexSet::new();
            for rule in rules {
                seen.insert(self.describe(rule));
            }
            seen.into_iter().collect::<Vec<_>>().join(" or ")
        };
        match (positives.is_empty(), negatives.is_empty()) {
            (false, true) => format!("expected {}", describe(positives)),
            (true, false) => format!("unexpected {}", describe(negatives)),
            (false, false) => format!(
                "unexpected {}; expected {}",
                describe(negatives),
                describe(positives)
            ),
            (true, true) => "unexpected input".to_string(),
        }
    }

    fn describe(&self, rule: &str) -> String {
        match self.descriptions.get(rule) {
            Some(description) => description.clone(),
            None if rule == self.entry_rule => "a feature".to_string(),
            None => rule.replace('_', " "),
        }
    }
}

impl fmt::Debug for CompiledParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledParser")
            .field("language", &self.language)
            .field("entry_rule", &self.entry_rule)
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn rule_descriptions(language: &NaturalLanguage) -> FxHashMap<&'static str, String> {
    let headers = |concept: Concept| {
        present_keywords(language, concept, false)
            .iter()
            .map(|kw| format!("`{kw}:`"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let steps = present_step_keywords(language)
        .iter()
        .map(|kw| format!("`{kw}`"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut map = FxHashMap::default();
    for (rules, text) in [
        (["feature", "feature_keyword"], format!("feature header ({})", headers(Concept::Feature))),
        (["background", "background_keyword"], format!("background header ({})", headers(Concept::Background))),
        (["scenario", "scenario_keyword"], format!("scenario header ({})", headers(Concept::Scenario))),
        (
            ["scenario_outline", "scenario_outline_keyword"],
            format!("scenario outline header ({})", headers(Concept::ScenarioOutline)),
        ),
        (["examples", "examples_keyword"], format!("examples header ({})", headers(Concept::Examples))),
        (["step", "step_keyword"], format!("step ({steps})")),
    ] {
        for rule in rules {
            map.insert(rule, text.clone());
        }
    }
    map.insert("table", "table".to_string());
    map.insert("table_row", "table row".to_string());
    map.insert("cell", "table cell".to_string());
    map.insert("doc_string", "doc string".to_string());
    map.insert("doc_string_body", "doc string content".to_string());
    map.insert("tag", "tag".to_string());
    map.insert("comment", "comment".to_string());
    map.insert("EOI", "end of input".to_string());
    map
}

/// Template filter: a keyword list as a pest ordered choice, longest first.
fn alternation(value: Value) -> std::result::Result<String, minijinja::Error> {
    let mut keywords: Vec<String> = Vec::new();
    for item in value.try_iter()? {
        if let Some(keyword) = item.as_str().filter(|kw| !kw.is_empty()) {
            if !keywords.iter().any(|known| known == keyword) {
                keywords.push(keyword.to_string());
            }
        }
    }
    if keywords.is_empty() {
        // Matches nothing.
        return Ok("!ANY ~ ANY".to_string());
    }
    keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    Ok(keywords
        .iter()
        .map(|kw| pest_literal(kw))
        .collect::<Vec<_>>()
        .join(" | "))
}

fn pest_literal(keyword: &str) -> String {
    let mut literal = String::with_capacity(keyword.len() + 2);
    literal.push('"');
    for c in keyword.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\t' => literal.push_str("\\t"),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{KeywordRegistry, KeywordTable, LanguageCache};
    use crate::parser::ParserConfig;
    use std::sync::Arc;

    fn cache_with(table: KeywordTable, config: ParserConfig) -> LanguageCache {
        LanguageCache::new(KeywordRegistry::new().with("xx", table), config)
    }

    fn minimal() -> KeywordTable {
        KeywordTable::new()
            .with(Concept::Name, "Mini")
            .with(Concept::Feature, "Feature")
            .with(Concept::Scenario, "Scenario")
            .with(Concept::Given, "Given")
    }

    #[test]
    fn test_alternation_orders_longest_first() {
        let value = Value::from_serialize(vec!["Given ", "* ", "Given that "]);
        assert_eq!(
            alternation(value).unwrap(),
            r#""Given that " | "Given " | "* ""#
        );
    }

    #[test]
    fn test_alternation_of_nothing_never_matches() {
        let value = Value::from_serialize(Vec::<String>::new());
        assert_eq!(alternation(value).unwrap(), "!ANY ~ ANY");
    }

    #[test]
    fn test_pest_literal_escapes() {
        assert_eq!(pest_literal(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_render_substitutes_identifier() {
        let cache = cache_with(minimal(), ParserConfig::default());
        let language = cache.get("xx").unwrap();
        let grammar = GrammarCompiler::new("{{ grammar_identifier }}Parser = { {{ step_keywords | alternation }} }")
            .render(&language)
            .unwrap();
        assert_eq!(grammar, r#"MiniParser = { "Given " }"#);
    }

    #[test]
    fn test_incomplete_language_still_compiles() {
        let cache = cache_with(minimal(), ParserConfig::default());
        let language = cache.get("xx").unwrap();
        let parser = language.parser().unwrap();
        assert_eq!(parser.entry_rule(), "MiniParser");
        let rules: Vec<&str> = parser.rule_names().collect();
        assert!(rules.contains(&"MiniParser"));
        assert!(rules.contains(&"step_keyword"));
        assert!(language.is_compiled());
    }

    #[test]
    fn test_parser_is_compiled_once() {
        let cache = cache_with(minimal(), ParserConfig::default());
        let language = cache.get("xx").unwrap();
        let first: *const CompiledParser = language.parser().unwrap();
        let second: *const CompiledParser = language.parser().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_grammar_text() {
        let config = ParserConfig::default().with_grammar_template("{{ grammar_identifier }}Parser = { ");
        let cache = cache_with(minimal(), config);
        let language = cache.get("xx").unwrap();
        assert!(matches!(
            language.parser(),
            Err(Error::GrammarCompilation { language, .. }) if language == "xx"
        ));
        assert!(!language.is_compiled());
    }

    #[test]
    fn test_template_render_error() {
        let config = ParserConfig::default().with_grammar_template("{{ name | no_such_filter }}");
        let cache = cache_with(minimal(), config);
        let language = cache.get("xx").unwrap();
        assert!(matches!(language.parser(), Err(Error::GrammarCompilation { .. })));
    }

    #[test]
    fn test_missing_entry_rule() {
        let config = ParserConfig::default().with_grammar_template("other = { \"x\" }");
        let cache = cache_with(minimal(), config);
        let language = cache.get("xx").unwrap();
        assert!(matches!(
            language.parser(),
            Err(Error::GeneratedParserNotFound { expected, .. }) if expected == "MiniParser"
        ));
    }

    #[test]
    fn test_syntax_error_names_path_and_position() {
        let cache = cache_with(minimal(), ParserConfig::default());
        let language: Arc<NaturalLanguage> = cache.get("xx").unwrap();
        let parser = language.parser().unwrap();
        let err = parser
            .parse_or_fail("Feature: f\n  Scenario: s\n    Given x\n  bogus line\n", "doc.feature", &Filter::new())
            .unwrap_err();
        let Error::Syntax(err) = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert_eq!(err.path, "doc.feature");
        assert!(err.position.is_some());
    }
}
