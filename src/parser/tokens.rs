//! Token definitions for the line lexer.
//!
//! Lines that carry several items on one line (tag lines and table rows) are
//! split with these `logos` token enums; everything else is classified by
//! keyword prefix in [`lexer`](super::lexer).

use logos::Logos;

/// Tokens of a `@tag @other` line.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t]+")]
pub enum TagToken {
    #[regex(r"@[^ \t@\n]+")]
    Tag,
}

/// Tokens of a `| a | b |` table row.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
pub enum RowToken {
    #[token("|")]
    Pipe,

    // Cell content, surrounding whitespace included
    #[regex(r"[^|\n]+")]
    Cell,
}

/// Split a tag line into tag names; `None` if it holds anything else.
pub fn split_tags(line: &str) -> Option<Vec<&str>> {
    let mut lexer = TagToken::lexer(line);
    let mut tags = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(TagToken::Tag) => tags.push(lexer.slice()),
            Err(()) => return None,
        }
    }
    Some(tags)
}

/// Split a table row into trimmed cells; `None` unless the row starts and
/// ends with a pipe.
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let mut lexer = RowToken::lexer(line.trim_matches([' ', '\t']));
    if lexer.next() != Some(Ok(RowToken::Pipe)) {
        return None;
    }
    let mut cells = Vec::new();
    let mut current: Option<&str> = None;
    while let Some(token) = lexer.next() {
        match token {
            Ok(RowToken::Pipe) => cells.push(current.take().unwrap_or_default().trim().to_string()),
            Ok(RowToken::Cell) => current = Some(lexer.slice()),
            Err(()) => return None,
        }
    }
    if current.is_some() || cells.is_empty() {
        return None;
    }
    Some(cells)
}
