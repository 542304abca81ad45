//! Lexer for the strategy DSL.
//!
//! Produces a flat token stream with 1-based line/column spans. Newlines are
//! kept as tokens because they terminate statements; `#` comments run to end
//! of line.

use crate::domain::ast::Span;
use crate::domain::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    Ne,
    LParen,
    RParen,
    Comma,
    When,
    Else,
    And,
    Or,
    Not,
    Newline,
}

impl TokenKind {
    /// Human-readable form for expected/found diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(v) => format!("number '{v}'"),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Assign => "'='".into(),
            TokenKind::Plus => "'+'".into(),
            TokenKind::Minus => "'-'".into(),
            TokenKind::Star => "'*'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Gt => "'>'".into(),
            TokenKind::Lt => "'<'".into(),
            TokenKind::Ge => "'>='".into(),
            TokenKind::Le => "'<='".into(),
            TokenKind::EqEq => "'=='".into(),
            TokenKind::Ne => "'!='".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::Comma => "','".into(),
            TokenKind::When => "'when'".into(),
            TokenKind::Else => "'else'".into(),
            TokenKind::And => "'and'".into(),
            TokenKind::Or => "'or'".into(),
            TokenKind::Not => "'not'".into(),
            TokenKind::Newline => "end of line".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn err(&self, message: String, found: Option<String>) -> SyntaxError {
        SyntaxError {
            line: self.line,
            col: self.col,
            message,
            expected: None,
            found,
        }
    }

    fn lex_number(&mut self, span: Span) -> Result<Token, SyntaxError> {
        let mut text = String::new();
        let mut has_dot = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| self.err(format!("invalid number '{text}'"), Some(text.clone())))?;
        Ok(Token {
            kind: TokenKind::Number(value),
            span,
        })
    }

    fn lex_word(&mut self, span: Span) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match word.as_str() {
            "when" => TokenKind::When,
            "else" => TokenKind::Else,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident(word),
        };
        Token { kind, span }
    }

    fn lex(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let span = self.span();
            match ch {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    // Collapse runs of blank lines into one separator.
                    if !matches!(tokens.last(), Some(Token { kind: TokenKind::Newline, .. }) | None)
                    {
                        tokens.push(Token {
                            kind: TokenKind::Newline,
                            span,
                        });
                    }
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '0'..='9' => tokens.push(self.lex_number(span)?),
                c if c.is_ascii_alphabetic() || c == '_' => tokens.push(self.lex_word(span)),
                '(' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::LParen,
                        span,
                    });
                }
                ')' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::RParen,
                        span,
                    });
                }
                ',' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::Comma,
                        span,
                    });
                }
                '+' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::Plus,
                        span,
                    });
                }
                '-' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::Minus,
                        span,
                    });
                }
                '*' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::Star,
                        span,
                    });
                }
                '/' => {
                    self.bump();
                    tokens.push(Token {
                        kind: TokenKind::Slash,
                        span,
                    });
                }
                '>' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token {
                            kind: TokenKind::Ge,
                            span,
                        });
                    } else {
                        tokens.push(Token {
                            kind: TokenKind::Gt,
                            span,
                        });
                    }
                }
                '<' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token {
                            kind: TokenKind::Le,
                            span,
                        });
                    } else {
                        tokens.push(Token {
                            kind: TokenKind::Lt,
                            span,
                        });
                    }
                }
                '=' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token {
                            kind: TokenKind::EqEq,
                            span,
                        });
                    } else {
                        tokens.push(Token {
                            kind: TokenKind::Assign,
                            span,
                        });
                    }
                }
                '!' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token {
                            kind: TokenKind::Ne,
                            span,
                        });
                    } else {
                        return Err(self.err("unexpected character '!'".into(), Some("!".into())));
                    }
                }
                other => {
                    return Err(self.err(
                        format!("unexpected character '{other}'"),
                        Some(other.to_string()),
                    ));
                }
            }
        }

        // Trailing separator simplifies the statement loop in the parser.
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Newline, .. }) | None) {
            tokens.push(Token {
                kind: TokenKind::Newline,
                span: self.span(),
            });
        }

        Ok(tokens)
    }
}

/// Tokenize DSL source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).lex()
}
