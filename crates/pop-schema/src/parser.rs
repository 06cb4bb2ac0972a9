//! Data description entry parser.
//!
//! Turns the token stream into flat [`Entry`] records, one per level-number
//! entry. Level 88 condition names are dropped here; hierarchy and layout
//! are resolved by the compiler.

use crate::error::SchemaError;
use crate::layout::Usage;
use crate::lexer::{Token, TokenKind};

/// One data description entry as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub line: usize,
    pub level: u8,
    /// `None` for FILLER or an omitted name.
    pub name: Option<String>,
    pub picture: Option<String>,
    pub usage: Option<Usage>,
    pub occurs: Option<OccursClause>,
    pub redefines: Option<String>,
    pub sign: Option<SignClause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OccursClause {
    pub min: u32,
    pub max: u32,
    pub depending_on: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignClause {
    pub leading: bool,
    pub separate: bool,
}

const CLAUSE_WORDS: &[&str] = &[
    "PIC",
    "PICTURE",
    "USAGE",
    "OCCURS",
    "REDEFINES",
    "SIGN",
    "LEADING",
    "TRAILING",
    "VALUE",
    "VALUES",
    "SYNC",
    "SYNCHRONIZED",
    "JUST",
    "JUSTIFIED",
    "BLANK",
    "INDEXED",
    "ASCENDING",
    "DESCENDING",
    "EXTERNAL",
    "GLOBAL",
    "RENAMES",
];

fn is_clause_start(word: &str) -> bool {
    CLAUSE_WORDS.contains(&word) || usage_word(word).is_some()
}

/// Map a usage word. `Some(Err(..))` marks a recognized but unsupported usage.
fn usage_word(word: &str) -> Option<Result<Usage, ()>> {
    let usage = match word {
        "DISPLAY" => Ok(Usage::Display),
        "COMP" | "COMPUTATIONAL" | "COMP-4" | "COMPUTATIONAL-4" | "BINARY" => Ok(Usage::Binary),
        "COMP-5" | "COMPUTATIONAL-5" => Ok(Usage::NativeBinary),
        "COMP-3" | "COMPUTATIONAL-3" | "PACKED-DECIMAL" => Ok(Usage::Packed),
        "COMP-1" | "COMPUTATIONAL-1" | "COMP-2" | "COMPUTATIONAL-2" | "INDEX" | "POINTER"
        | "NATIONAL" | "FLOAT-SHORT" | "FLOAT-LONG" => Err(()),
        _ => return None,
    };
    Some(usage)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_word(&self) -> Option<&'a str> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Some(w.as_str()),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_word(&mut self, word: &str) -> bool {
        if self.peek_word() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, line: usize, what: &str) -> Result<&'a str, SchemaError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Ok(w.as_str()),
            _ => Err(SchemaError::Syntax {
                line,
                message: format!("expected {what}"),
            }),
        }
    }

    fn expect_integer(&mut self, line: usize, what: &str) -> Result<u32, SchemaError> {
        let word = self.expect_word(line, what)?;
        word.parse().map_err(|_| SchemaError::Syntax {
            line,
            message: format!("expected {what}, found \"{word}\""),
        })
    }

    /// Consume operand words up to the next clause keyword or period.
    fn skip_operands(&mut self) {
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Period => break,
                TokenKind::Word(w) if is_clause_start(w) => break,
                _ => self.pos += 1,
            }
        }
    }
}

/// Parse every data description entry in the token stream.
pub(crate) fn parse_entries(tokens: &[Token]) -> Result<Vec<Entry>, SchemaError> {
    let mut cursor = Cursor { tokens, pos: 0 };
    let mut entries = Vec::new();
    while let Some(token) = cursor.peek() {
        if token.kind == TokenKind::Period {
            cursor.pos += 1;
            continue;
        }
        if let Some(entry) = parse_entry(&mut cursor)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn parse_entry(cursor: &mut Cursor<'_>) -> Result<Option<Entry>, SchemaError> {
    let Some(first) = cursor.next() else {
        return Ok(None);
    };
    let line = first.line;
    let level_word = match &first.kind {
        TokenKind::Word(w) => w.as_str(),
        TokenKind::Literal(_) | TokenKind::Period => {
            return Err(SchemaError::Syntax {
                line,
                message: "expected a level number".to_string(),
            })
        }
    };
    if level_word == "COPY" || level_word == "REPLACE" {
        return Err(SchemaError::UnsupportedClause {
            line,
            clause: level_word.to_string(),
        });
    }
    let level: u8 = level_word.parse().map_err(|_| SchemaError::Syntax {
        line,
        message: format!("expected a level number, found \"{level_word}\""),
    })?;
    match level {
        1..=49 | 77 => {}
        88 => {
            // Condition names carry no storage.
            while let Some(token) = cursor.next() {
                if token.kind == TokenKind::Period {
                    break;
                }
            }
            return Ok(None);
        }
        66 => {
            return Err(SchemaError::UnsupportedClause {
                line,
                clause: "level 66 RENAMES".to_string(),
            })
        }
        other => {
            return Err(SchemaError::InvalidLevel {
                line,
                message: format!("level number {other} is not valid"),
            })
        }
    }

    let mut entry = Entry {
        line,
        level,
        name: None,
        picture: None,
        usage: None,
        occurs: None,
        redefines: None,
        sign: None,
    };

    if let Some(word) = cursor.peek_word() {
        if !is_clause_start(word) {
            cursor.pos += 1;
            if word != "FILLER" {
                entry.name = Some(word.to_string());
            }
        }
    }

    loop {
        let Some(token) = cursor.next() else {
            break;
        };
        let word = match &token.kind {
            TokenKind::Period => break,
            TokenKind::Word(w) => w.as_str(),
            TokenKind::Literal(l) => {
                return Err(SchemaError::Syntax {
                    line: token.line,
                    message: format!("unexpected literal '{l}'"),
                })
            }
        };
        let line = token.line;
        match word {
            "PIC" | "PICTURE" => {
                cursor.skip_word("IS");
                let picture = cursor.expect_word(line, "a picture string")?;
                set_once(&mut entry.picture, picture.to_string(), line, "PICTURE")?;
            }
            "USAGE" => {
                cursor.skip_word("IS");
                let usage = cursor.expect_word(line, "a usage")?;
                let parsed = parse_usage(usage, line)?;
                set_once(&mut entry.usage, parsed, line, "USAGE")?;
            }
            "OCCURS" => {
                let occurs = parse_occurs(cursor, line)?;
                set_once(&mut entry.occurs, occurs, line, "OCCURS")?;
            }
            "REDEFINES" => {
                let target = cursor.expect_word(line, "a REDEFINES target")?;
                set_once(&mut entry.redefines, target.to_string(), line, "REDEFINES")?;
            }
            "SIGN" | "LEADING" | "TRAILING" => {
                if word == "SIGN" {
                    cursor.skip_word("IS");
                }
                let position = if word == "SIGN" {
                    cursor.expect_word(line, "LEADING or TRAILING")?
                } else {
                    word
                };
                let leading = match position {
                    "LEADING" => true,
                    "TRAILING" => false,
                    other => {
                        return Err(SchemaError::Syntax {
                            line,
                            message: format!("expected LEADING or TRAILING, found \"{other}\""),
                        })
                    }
                };
                let separate = cursor.skip_word("SEPARATE");
                if separate {
                    cursor.skip_word("CHARACTER");
                }
                set_once(&mut entry.sign, SignClause { leading, separate }, line, "SIGN")?;
            }
            "VALUE" | "VALUES" => {
                cursor.skip_word("IS");
                cursor.skip_word("ARE");
                cursor.skip_operands();
            }
            "SYNC" | "SYNCHRONIZED" => {
                let _ = cursor.skip_word("LEFT") || cursor.skip_word("RIGHT");
                tracing::debug!(line, clause = word, "clause accepted without layout effect");
            }
            "JUST" | "JUSTIFIED" => {
                cursor.skip_word("RIGHT");
                tracing::debug!(line, clause = word, "clause accepted without layout effect");
            }
            "BLANK" => {
                cursor.skip_word("WHEN");
                let zero = cursor.expect_word(line, "ZERO")?;
                if !matches!(zero, "ZERO" | "ZEROS" | "ZEROES") {
                    return Err(SchemaError::Syntax {
                        line,
                        message: format!("expected BLANK WHEN ZERO, found \"{zero}\""),
                    });
                }
                tracing::debug!(line, clause = "BLANK WHEN ZERO", "clause accepted without layout effect");
            }
            other => {
                if usage_word(other).is_some() {
                    let parsed = parse_usage(other, line)?;
                    set_once(&mut entry.usage, parsed, line, "USAGE")?;
                } else if is_clause_start(other) {
                    return Err(SchemaError::UnsupportedClause {
                        line,
                        clause: other.to_string(),
                    });
                } else {
                    return Err(SchemaError::Syntax {
                        line,
                        message: format!("unexpected word \"{other}\" (missing period?)"),
                    });
                }
            }
        }
    }
    Ok(Some(entry))
}

fn parse_usage(word: &str, line: usize) -> Result<Usage, SchemaError> {
    match usage_word(word) {
        Some(Ok(usage)) => Ok(usage),
        Some(Err(())) => Err(SchemaError::UnsupportedClause {
            line,
            clause: format!("USAGE {word}"),
        }),
        None => Err(SchemaError::Syntax {
            line,
            message: format!("unknown usage \"{word}\""),
        }),
    }
}

fn parse_occurs(cursor: &mut Cursor<'_>, line: usize) -> Result<OccursClause, SchemaError> {
    let first = cursor.expect_integer(line, "an occurrence count")?;
    let (min, max) = if cursor.skip_word("TO") {
        (first, cursor.expect_integer(line, "a maximum occurrence count")?)
    } else {
        (first, first)
    };
    cursor.skip_word("TIMES");
    let depending_on = if cursor.skip_word("DEPENDING") {
        cursor.skip_word("ON");
        Some(cursor.expect_word(line, "a DEPENDING ON field")?.to_string())
    } else {
        None
    };
    // Key and index names have no layout effect.
    loop {
        if cursor.skip_word("ASCENDING") || cursor.skip_word("DESCENDING") {
            cursor.skip_word("KEY");
            cursor.skip_word("IS");
            cursor.skip_operands();
        } else if cursor.skip_word("INDEXED") {
            cursor.skip_word("BY");
            cursor.skip_operands();
        } else {
            break;
        }
    }
    Ok(OccursClause {
        min,
        max,
        depending_on,
    })
}

fn set_once<T>(slot: &mut Option<T>, value: T, line: usize, clause: &str) -> Result<(), SchemaError> {
    if slot.is_some() {
        return Err(SchemaError::Syntax {
            line,
            message: format!("duplicate {clause} clause"),
        });
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::options::SourceFormat;

    fn parse(text: &str) -> Result<Vec<Entry>, SchemaError> {
        parse_entries(&tokenize(text, SourceFormat::Free)?)
    }

    #[test]
    fn parses_elementary_clauses() {
        let entries = parse("05 AMT PIC IS S9(5)V99 USAGE IS COMP-3 SIGN TRAILING.").unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.level, 5);
        assert_eq!(e.name.as_deref(), Some("AMT"));
        assert_eq!(e.picture.as_deref(), Some("S9(5)V99"));
        assert_eq!(e.usage, Some(Usage::Packed));
        assert_eq!(
            e.sign,
            Some(SignClause {
                leading: false,
                separate: false
            })
        );
    }

    #[test]
    fn filler_and_omitted_names() {
        let entries = parse("05 FILLER PIC X(2). 05 PIC X(3).").unwrap();
        assert!(entries.iter().all(|e| e.name.is_none()));
        assert_eq!(entries[1].picture.as_deref(), Some("X(3)"));
    }

    #[test]
    fn occurs_depending_on_with_keys() {
        let entries = parse(
            "05 ITEMS OCCURS 0 TO 10 TIMES DEPENDING ON ITEM-COUNT ASCENDING KEY IS ITEM-ID INDEXED BY IX.",
        )
        .unwrap();
        assert_eq!(
            entries[0].occurs,
            Some(OccursClause {
                min: 0,
                max: 10,
                depending_on: Some("ITEM-COUNT".to_string())
            })
        );
    }

    #[test]
    fn value_clauses_are_skipped() {
        let entries = parse("05 FLAG PIC X VALUE 'Y'. 88 IS-SET VALUE 'Y'. 05 N PIC 9 VALUE ZERO COMP.").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].usage, Some(Usage::Binary));
    }

    #[test]
    fn ignored_clauses_accepted() {
        let entries = parse("05 N PIC 9(4) COMP SYNC. 05 T PIC X(4) JUST RIGHT. 05 Z PIC 9(3) BLANK WHEN ZERO.").unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn unsupported_constructs() {
        assert!(matches!(
            parse("05 F PIC 9 COMP-1."),
            Err(SchemaError::UnsupportedClause { .. })
        ));
        assert!(matches!(
            parse("66 ALIAS RENAMES A THRU B."),
            Err(SchemaError::UnsupportedClause { .. })
        ));
        assert!(matches!(
            parse("COPY OTHERBOOK."),
            Err(SchemaError::UnsupportedClause { .. })
        ));
        assert!(matches!(
            parse("05 X PIC X EXTERNAL."),
            Err(SchemaError::UnsupportedClause { .. })
        ));
    }

    #[test]
    fn missing_period_is_reported() {
        let err = parse("05 A PIC X 05 B PIC X.").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax { line: 1, .. }));
    }

    #[test]
    fn invalid_level_number() {
        assert!(matches!(parse("50 A PIC X."), Err(SchemaError::InvalidLevel { .. })));
    }

    #[test]
    fn duplicate_clause() {
        assert!(matches!(parse("05 A PIC X PIC 9."), Err(SchemaError::Syntax { .. })));
    }
}
