// Syntax tree for feature files, and the builder both backends feed
pub mod ast;
pub mod builder;
pub mod filter;

pub use ast::{
    Background, Comment, DocString, Examples, Feature, FeatureElement, Row, Scenario,
    ScenarioOutline, Step, StepArgument, Table, Tag,
};
pub use builder::{AstBuilder, Header, Listener, normalize_description};
pub use filter::Filter;
