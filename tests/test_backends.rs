//! Tests that both parsing backends accept the same documents and build the
//! same trees.
//!
//! Every document is parsed with `Backend::Treetop` (runtime pest grammar)
//! and `Backend::Gherkin` (line lexer); trees are compared with
//! `Feature::same_content`, which ignores only the language back-reference.

use std::sync::Arc;

use polyglot::keywords::{Concept, KeywordRegistry, KeywordTable};
use polyglot::syntax::{Feature, FeatureElement, Filter, StepArgument};
use polyglot::{Backend, Error, LanguageCache, NaturalLanguage, ParserConfig};
use rstest::rstest;

const CHECKOUT: &str = r#"# language: en
@billing @smoke
Feature: Checkout
  In order to pay
  As a customer

  Background:
    Given a cart

  # first scenario
  @fast
  Scenario: Pay by card
    Given a card:
      | number | expiry |
      | 4111   | 12/30  |
    When I pay
    Then I see a receipt:
      """
      Thanks!
        Come again
      """

  Scenario Outline: Pay <amount>
    Given I owe <amount>
    * I pay <amount>

    @eu
    Examples: Europe
      | amount |
      | 10 EUR |

    @us
    Scenarios:
      | amount |
      | 10 USD |
"#;

fn cache() -> LanguageCache {
    LanguageCache::builtin().unwrap()
}

fn parse(
    language: &Arc<NaturalLanguage>,
    backend: Backend,
    source: &str,
    filter: &Filter,
) -> Result<Option<Feature>, Error> {
    language.parse_with(backend, source, "test.feature", filter)
}

fn parse_both(language: &Arc<NaturalLanguage>, source: &str, filter: &Filter) -> (Feature, Feature) {
    let treetop = parse(language, Backend::Treetop, source, filter)
        .unwrap()
        .expect("treetop produced no tree");
    let gherkin = parse(language, Backend::Gherkin, source, filter)
        .unwrap()
        .expect("gherkin produced no tree");
    (treetop, gherkin)
}

// ============================================================================
// TREE SHAPE
// ============================================================================

#[rstest]
#[case(Backend::Treetop)]
#[case(Backend::Gherkin)]
fn test_checkout_tree(#[case] backend: Backend) {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let feature = parse(&en, backend, CHECKOUT, &Filter::new()).unwrap().unwrap();

    assert_eq!(feature.language_identifier(), Some("en"));
    assert_eq!(feature.keyword, "Feature");
    assert_eq!(feature.name, "Checkout");
    assert_eq!(feature.line, 3);
    assert_eq!(feature.description, "In order to pay\nAs a customer");
    let tags: Vec<_> = feature.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["@billing", "@smoke"]);
    assert_eq!(feature.comments[0].text, "# language: en");

    let background = feature.background.as_ref().unwrap();
    assert_eq!(background.line, 7);
    assert_eq!(background.steps[0].keyword, "Given ");
    assert_eq!(background.steps[0].name, "a cart");

    assert_eq!(feature.elements.len(), 2);
    let FeatureElement::Scenario(scenario) = &feature.elements[0] else {
        panic!("expected scenario");
    };
    assert_eq!(scenario.name, "Pay by card");
    assert_eq!(scenario.line, 12);
    assert_eq!(scenario.comments[0].text, "# first scenario");
    assert_eq!(scenario.tags[0].name, "@fast");
    assert_eq!(scenario.steps.len(), 3);

    let Some(StepArgument::Table(table)) = &scenario.steps[0].argument else {
        panic!("expected table");
    };
    assert_eq!(table.rows[1].cells, vec!["4111", "12/30"]);
    assert_eq!(table.rows[1].line, 15);

    let Some(StepArgument::DocString(doc)) = &scenario.steps[2].argument else {
        panic!("expected doc string");
    };
    assert_eq!(doc.content, "Thanks!\n  Come again");
    assert_eq!(doc.line, 18);

    let FeatureElement::ScenarioOutline(outline) = &feature.elements[1] else {
        panic!("expected scenario outline");
    };
    assert_eq!(outline.name, "Pay <amount>");
    assert_eq!(outline.steps[1].keyword, "* ");
    assert_eq!(outline.examples.len(), 2);
    assert_eq!(outline.examples[0].name, "Europe");
    assert_eq!(outline.examples[1].keyword, "Scenarios");
    assert_eq!(outline.examples[1].tags[0].name, "@us");
    assert_eq!(outline.examples[1].table.rows[1].cells, vec!["10 USD"]);
    assert_eq!(outline.examples[0].table.header().unwrap().cells, vec!["amount"]);
}

#[test]
fn test_backends_build_equal_trees() {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let (treetop, gherkin) = parse_both(&en, CHECKOUT, &Filter::new());
    assert!(treetop.same_content(&gherkin), "{treetop:#?}\n!=\n{gherkin:#?}");
}

#[rstest]
#[case(Backend::Treetop)]
#[case(Backend::Gherkin)]
fn test_end_to_end_minimal_english(#[case] backend: Backend) {
    let table = KeywordTable::new()
        .with(Concept::Name, "English")
        .with(Concept::Native, "English")
        .with(Concept::Feature, "Feature")
        .with(Concept::Background, "Background")
        .with(Concept::Scenario, "Scenario")
        .with(Concept::ScenarioOutline, "Scenario Outline")
        .with(Concept::Examples, "Examples")
        .with(Concept::Given, "Given")
        .with(Concept::When, "When")
        .with(Concept::Then, "Then")
        .with(Concept::And, "And")
        .with(Concept::But, "But");
    let cache = LanguageCache::new(
        KeywordRegistry::new().with("en", table),
        ParserConfig::default().with_backend(backend),
    );
    let en = cache.get("en").unwrap();
    assert_eq!(en.is_incomplete(), None);

    let feature = en
        .parse("Feature: X\n", "x.feature", &Filter::new())
        .unwrap()
        .unwrap();
    assert_eq!(feature.name, "X");
    assert!(feature.elements.is_empty());
    assert!(Arc::ptr_eq(feature.language.as_ref().unwrap(), &en));
}

#[test]
fn test_global_english_end_to_end() {
    let en = polyglot::get("en").unwrap();
    let feature = en
        .parse("Feature: X\n", "x.feature", &Filter::new())
        .unwrap()
        .unwrap();
    assert_eq!(feature.name, "X");
    assert!(Arc::ptr_eq(feature.language.as_ref().unwrap(), &en));
}

#[rstest]
#[case(Backend::Treetop)]
#[case(Backend::Gherkin)]
fn test_missing_feature_header_names_path(#[case] backend: Backend) {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let err = en
        .parse_with(backend, "Scenario: missing feature header\n", "missing.feature", &Filter::new())
        .unwrap_err();
    let Error::Syntax(err) = err else {
        panic!("expected syntax error, got {err:?}");
    };
    assert_eq!(err.path, "missing.feature");
    assert!(err.to_string().starts_with("missing.feature:1:"));
}

#[rstest]
#[case(Backend::Treetop)]
#[case(Backend::Gherkin)]
fn test_empty_document_has_no_tree(#[case] backend: Backend) {
    let cache = cache();
    let en = cache.get("en").unwrap();
    assert!(parse(&en, backend, "", &Filter::new()).unwrap().is_none());
    assert!(
        parse(&en, backend, "# only a comment\n\n", &Filter::new())
            .unwrap()
            .is_none()
    );
}

#[rstest]
#[case(Backend::Treetop)]
#[case(Backend::Gherkin)]
fn test_outline_without_examples_fails(#[case] backend: Backend) {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let source = "Feature: f\n  Scenario Outline: o\n    Given <x>\n";
    assert!(matches!(
        parse(&en, backend, source, &Filter::new()),
        Err(Error::Syntax(_))
    ));
}

#[test]
fn test_line_endings_are_shared_by_both_backends() {
    let cache = cache();
    let en = cache.get("en").unwrap();

    let (lf, _) = parse_both(&en, CHECKOUT, &Filter::new());
    let (treetop, gherkin) = parse_both(&en, &CHECKOUT.replace('\n', "\r\n"), &Filter::new());
    assert!(treetop.same_content(&gherkin));
    assert!(treetop.same_content(&lf));

    // A lone carriage return does not end a line.
    let (treetop, gherkin) = parse_both(&en, "Feature: f\rScenario: s\r  Given x\r", &Filter::new());
    assert!(treetop.same_content(&gherkin), "{treetop:#?}\n!=\n{gherkin:#?}");
    assert_eq!(treetop.name, "f\rScenario: s\r  Given x");
    assert!(treetop.elements.is_empty());
}

// ============================================================================
// FILTERS
// ============================================================================

#[test]
fn test_tag_filter_prunes_examples_under_both_backends() {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let filter = Filter::new().with_tags("@us");
    let (treetop, gherkin) = parse_both(&en, CHECKOUT, &filter);
    assert!(treetop.same_content(&gherkin));

    assert_eq!(treetop.elements.len(), 1);
    let FeatureElement::ScenarioOutline(outline) = &treetop.elements[0] else {
        panic!("expected scenario outline");
    };
    assert_eq!(outline.examples.len(), 1);
    assert_eq!(outline.examples[0].line, 33);
}

#[rstest]
#[case(Filter::new().with_name("card"), vec!["Pay by card"])]
#[case(Filter::new().with_line(12), vec!["Pay by card"])]
#[case(Filter::new().with_line(30), vec!["Pay <amount>"])]
#[case(Filter::new().with_line(16), vec!["Pay by card"])]
#[case(Filter::new().with_line(11), vec!["Pay by card"])]
#[case(Filter::new().with_line(24), vec!["Pay <amount>"])]
#[case(Filter::new().with_tags("~@fast"), vec!["Pay <amount>"])]
#[case(Filter::new().with_tags("@smoke"), vec!["Pay by card", "Pay <amount>"])]
fn test_filters_agree(#[case] filter: Filter, #[case] expected: Vec<&str>) {
    let cache = cache();
    let en = cache.get("en").unwrap();
    let (treetop, gherkin) = parse_both(&en, CHECKOUT, &filter);
    let names: Vec<_> = treetop.elements.iter().map(FeatureElement::name).collect();
    assert_eq!(names, expected);
    assert!(treetop.same_content(&gherkin));
}

// ============================================================================
// OTHER LANGUAGES
// ============================================================================

#[test]
fn test_japanese_glue_keywords() {
    let cache = cache();
    let ja = cache.get("ja").unwrap();
    let source = "機能: ログイン\n  シナリオ: 成功\n    前提ユーザがいる\n    もしログインする\n    ならば成功する\n";
    let (treetop, gherkin) = parse_both(&ja, source, &Filter::new());
    assert!(treetop.same_content(&gherkin));

    let steps = treetop.elements[0].steps();
    assert_eq!(steps[0].keyword, "前提");
    assert_eq!(steps[0].name, "ユーザがいる");
    assert_eq!(steps[2].keyword, "ならば");
}

#[test]
fn test_french_elided_keyword() {
    let cache = cache();
    let fr = cache.get("fr").unwrap();
    let source = "Fonctionnalité: Paiement\n  Scénario: carte\n    Soit un panier\n    Lorsqu'il paie\n    Alors il reçoit un reçu\n";
    let (treetop, gherkin) = parse_both(&fr, source, &Filter::new());
    assert!(treetop.same_content(&gherkin));

    let steps = treetop.elements[0].steps();
    assert_eq!(steps[1].keyword, "Lorsqu'");
    assert_eq!(steps[1].name, "il paie");
}

#[test]
fn test_every_builtin_language_parses_with_both_backends() {
    let cache = cache();
    for language in cache.all().unwrap() {
        let given = language
            .keywords_for(Concept::Given, true)
            .unwrap();
        let source = format!(
            "{}: Demo\n  {}: s\n    {}x\n",
            language.feature_keywords().unwrap()[0],
            language.scenario_keywords().unwrap()[0],
            given.last().unwrap(),
        );
        let (treetop, gherkin) = parse_both(&language, &source, &Filter::new());
        assert!(
            treetop.same_content(&gherkin),
            "backends disagree for {}",
            language.identifier()
        );
        assert_eq!(treetop.elements[0].steps()[0].name, "x");
    }
}
