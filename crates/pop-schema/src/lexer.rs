//! Copybook source preprocessing and tokenization.
//!
//! Comment and sequence areas are stripped per [`SourceFormat`], then the
//! remaining text is split into words, quoted literals, and entry-ending
//! periods. A period terminates an entry only when followed by whitespace
//! or end of line, so picture strings such as `ZZ9.99` stay intact.

use crate::error::SchemaError;
use crate::options::SourceFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// A word, upper-cased.
    Word(String),
    /// A quoted literal, contents only.
    Literal(String),
    /// Entry separator.
    Period,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Tokenize copybook text.
pub(crate) fn tokenize(text: &str, format: SourceFormat) -> Result<Vec<Token>, SchemaError> {
    let mut tokens = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let Some(content) = program_text(raw_line, format) else {
            continue;
        };
        scan_line(&content, line, &mut tokens)?;
    }
    Ok(tokens)
}

/// The program-text portion of a line, or `None` for comment lines.
fn program_text(raw: &str, format: SourceFormat) -> Option<String> {
    match format {
        SourceFormat::Free => {
            let trimmed = raw.trim_start();
            if trimmed.starts_with('*') {
                return None;
            }
            Some(strip_inline_comment(raw).to_string())
        }
        SourceFormat::Fixed => {
            let chars: Vec<char> = raw.chars().collect();
            if chars.len() < 7 {
                return Some(String::new());
            }
            match chars[6] {
                '*' | '/' | 'D' | 'd' => None,
                _ => {
                    let end = chars.len().min(72);
                    let area: String = chars[7.min(end)..end].iter().collect();
                    Some(strip_inline_comment(&area).to_string())
                }
            }
        }
    }
}

/// Cut a line at the first `*>` outside a quoted literal.
fn strip_inline_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_star = false;
    for (pos, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                } else if c == '>' && prev_star {
                    return &line[..pos - 1];
                }
            }
        }
        prev_star = quote.is_none() && c == '*';
    }
    line
}

fn scan_line(content: &str, line: usize, tokens: &mut Vec<Token>) -> Result<(), SchemaError> {
    let chars: Vec<char> = content.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            let (literal, next) = scan_literal(&chars, i, line)?;
            tokens.push(Token {
                kind: TokenKind::Literal(literal),
                line,
            });
            i = next;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '\'' && chars[i] != '"' {
            i += 1;
        }
        let mut word: String = chars[start..i].iter().collect();
        let mut period = false;
        if word.ends_with('.') && (i == chars.len() || chars[i].is_whitespace()) {
            word.pop();
            period = true;
        }
        while word.ends_with(',') || word.ends_with(';') {
            word.pop();
        }
        if !word.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Word(word.to_ascii_uppercase()),
                line,
            });
        }
        if period {
            tokens.push(Token {
                kind: TokenKind::Period,
                line,
            });
        }
    }
    Ok(())
}

/// Scan a literal starting at the opening quote. A doubled quote inside
/// the literal stands for one quote character.
fn scan_literal(chars: &[char], open: usize, line: usize) -> Result<(String, usize), SchemaError> {
    let quote = chars[open];
    let mut out = String::new();
    let mut i = open + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                out.push(quote);
                i += 2;
                continue;
            }
            return Ok((out, i + 1));
        }
        out.push(chars[i]);
        i += 1;
    }
    Err(SchemaError::Syntax {
        line,
        message: "unterminated literal".to_string(),
    })
}
