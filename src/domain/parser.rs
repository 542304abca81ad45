//! Recursive descent parser for the strategy DSL.
//!
//! Grammar (statements separated by newlines, `#` comments):
//!
//! ```text
//! program   := { ident "=" expr }
//! expr      := or_expr [ "when" or_expr "else" expr ]
//! or_expr   := and_expr { "or" and_expr }
//! and_expr  := not_expr { "and" not_expr }
//! not_expr  := "not" not_expr | cmp_expr
//! cmp_expr  := add_expr [ (">"|"<"|">="|"<="|"=="|"!=") add_expr ]
//! add_expr  := mul_expr { ("+"|"-") mul_expr }
//! mul_expr  := unary { ("*"|"/") unary }
//! unary     := "-" unary | primary
//! primary   := number | ident [ "(" [expr {"," expr}] ")" ] | "(" expr ")"
//! ```
//!
//! Errors carry line/column plus expected/found token descriptions.

use crate::domain::ast::{BinaryOp, Expr, Program, Span, Stmt, UnaryOp};
use crate::domain::error::SyntaxError;
use crate::domain::token::{Token, TokenKind, tokenize};

/// Descent recursion ceiling. Sits well above the validator's nesting cap,
/// so any program a human could legitimately write still parses; past it the
/// parser errors instead of recursing further.
const MAX_PARSE_DEPTH: usize = 64;

/// Parse a complete DSL program from source text.
pub fn parse_program(source: &str) -> Result<Program, SyntaxError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map(|t| t.span)
            .unwrap_or(Span::new(1, 1))
    }

    fn err_expected(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            Some(tok) => SyntaxError {
                line: tok.span.line,
                col: tok.span.col,
                message: format!("expected {expected}, found {}", tok.kind.describe()),
                expected: Some(expected.to_string()),
                found: Some(tok.kind.describe()),
            },
            None => {
                let span = self.eof_span();
                SyntaxError {
                    line: span.line,
                    col: span.col,
                    message: format!("expected {expected}, found end of input"),
                    expected: Some(expected.to_string()),
                    found: Some("end of input".into()),
                }
            }
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => Ok(self.bump().unwrap()),
            _ => Err(self.err_expected(expected)),
        }
    }

    // Errors abort the whole parse, so the counter only needs rebalancing on
    // success paths.
    fn descend(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            let span = self
                .peek()
                .map(|t| t.span)
                .unwrap_or_else(|| self.eof_span());
            return Err(SyntaxError {
                line: span.line,
                col: span.col,
                message: format!("expression nesting exceeds {MAX_PARSE_DEPTH} levels"),
                expected: None,
                found: None,
            });
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(t) if t.kind == TokenKind::Newline) {
            self.bump();
        }
    }

    fn parse(mut self) -> Result<Program, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().is_none() {
                break;
            }
            statements.push(self.statement()?);
        }
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        let (name, span) = match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(_),
                ..
            }) => {
                let tok = self.bump().unwrap();
                let TokenKind::Ident(name) = tok.kind else {
                    unreachable!()
                };
                (name, tok.span)
            }
            _ => return Err(self.err_expected("identifier at start of statement")),
        };
        self.expect(TokenKind::Assign, "'='")?;
        let expr = self.expr()?;
        // The lexer guarantees a trailing newline token.
        self.expect(TokenKind::Newline, "end of statement")?;
        Ok(Stmt { name, expr, span })
    }

    fn expr(&mut self) -> Result<Expr, SyntaxError> {
        self.descend()?;
        let value = self.or_expr()?;
        let expr = if matches!(self.peek(), Some(t) if t.kind == TokenKind::When) {
            let span = value.span();
            self.bump();
            let cond = self.or_expr()?;
            self.expect(TokenKind::Else, "'else'")?;
            let fallback = self.expr()?;
            Expr::When {
                value: Box::new(value),
                cond: Box::new(cond),
                fallback: Box::new(fallback),
                span,
            }
        } else {
            value
        };
        self.ascend();
        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and_expr()?;
        while matches!(self.peek(), Some(t) if t.kind == TokenKind::Or) {
            let span = left.span();
            self.bump();
            let right = self.and_expr()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.not_expr()?;
        while matches!(self.peek(), Some(t) if t.kind == TokenKind::And) {
            let span = left.span();
            self.bump();
            let right = self.not_expr()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, SyntaxError> {
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::Not) {
            let span = self.bump().unwrap().span;
            self.descend()?;
            let operand = self.not_expr()?;
            self.ascend();
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.cmp_expr()
    }

    fn cmp_expr(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.add_expr()?;
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Gt) => Some(BinaryOp::Gt),
            Some(TokenKind::Lt) => Some(BinaryOp::Lt),
            Some(TokenKind::Ge) => Some(BinaryOp::Ge),
            Some(TokenKind::Le) => Some(BinaryOp::Le),
            Some(TokenKind::EqEq) => Some(BinaryOp::Eq),
            Some(TokenKind::Ne) => Some(BinaryOp::Ne),
            _ => None,
        };
        if let Some(op) = op {
            let span = left.span();
            self.bump();
            let right = self.add_expr()?;
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn add_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.mul_expr()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            let span = left.span();
            self.bump();
            let right = self.mul_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn mul_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            let span = left.span();
            self.bump();
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::Minus) {
            let span = self.bump().unwrap().span;
            self.descend()?;
            let operand = self.unary()?;
            self.ascend();
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                span,
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Number(value)) => {
                let span = self.bump().unwrap().span;
                Ok(Expr::Number { value, span })
            }
            Some(TokenKind::Ident(name)) => {
                let span = self.bump().unwrap().span;
                if matches!(self.peek(), Some(t) if t.kind == TokenKind::LParen) {
                    self.bump();
                    let args = self.call_args()?;
                    return Ok(Expr::Call { name, args, span });
                }
                Ok(Expr::Ident { name, span })
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.err_expected("expression")),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::RParen) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::Comma) => {
                    self.bump();
                }
                Some(TokenKind::RParen) => {
                    self.bump();
                    return Ok(args);
                }
                _ => return Err(self.err_expected("',' or ')'")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_assignment() {
        let program = parse_program("output = close").unwrap();
        assert_eq!(program.statements.len(), 1);
        let stmt = &program.statements[0];
        assert_eq!(stmt.name, "output");
        assert!(matches!(&stmt.expr, Expr::Ident { name, .. } if name == "close"));
    }

    #[test]
    fn parse_call_with_args() {
        let program = parse_program("fast = sma(close, 10)").unwrap();
        match &program.statements[0].expr {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "sma");
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[1], Expr::Number { value, .. } if *value == 10.0));
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parse_when_else() {
        let program =
            parse_program("output = close when close > sma(close, 2) else 0").unwrap();
        match &program.statements[0].expr {
            Expr::When { cond, fallback, .. } => {
                assert!(matches!(**cond, Expr::Binary { op: BinaryOp::Gt, .. }));
                assert!(matches!(**fallback, Expr::Number { value, .. } if value == 0.0));
            }
            other => panic!("expected When, got {other:?}"),
        }
    }

    #[test]
    fn parse_nested_when_right_associative() {
        let program = parse_program("x = 1 when a > 0 else 2 when b > 0 else 3").unwrap();
        match &program.statements[0].expr {
            Expr::When { fallback, .. } => {
                assert!(matches!(**fallback, Expr::When { .. }));
            }
            other => panic!("expected When, got {other:?}"),
        }
    }

    #[test]
    fn parse_precedence_mul_over_add() {
        let program = parse_program("x = a + b * c").unwrap();
        match &program.statements[0].expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => {
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected Add at root, got {other:?}"),
        }
    }

    #[test]
    fn parse_precedence_cmp_over_and() {
        let program = parse_program("x = a > 1 and b < 2").unwrap();
        match &program.statements[0].expr {
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
                ..
            } => {
                assert!(matches!(**left, Expr::Binary { op: BinaryOp::Gt, .. }));
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Lt, .. }));
            }
            other => panic!("expected And at root, got {other:?}"),
        }
    }

    #[test]
    fn parse_parenthesized() {
        let program = parse_program("x = (a + b) * c").unwrap();
        match &program.statements[0].expr {
            Expr::Binary {
                op: BinaryOp::Mul,
                left,
                ..
            } => {
                assert!(matches!(**left, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected Mul at root, got {other:?}"),
        }
    }

    #[test]
    fn parse_unary_negation() {
        let program = parse_program("x = -close").unwrap();
        assert!(matches!(
            &program.statements[0].expr,
            Expr::Unary { op: UnaryOp::Neg, .. }
        ));
    }

    #[test]
    fn parse_not() {
        let program = parse_program("x = not a > 1").unwrap();
        assert!(matches!(
            &program.statements[0].expr,
            Expr::Unary { op: UnaryOp::Not, .. }
        ));
    }

    #[test]
    fn parse_multiple_statements_with_comments() {
        let source = "# moving average crossover\nfast = sma(close, 10)\nslow = sma(close, 30)\nsignal = 1 when fast > slow else 0\n";
        let program = parse_program(source).unwrap();
        assert_eq!(program.statements.len(), 3);
        assert_eq!(program.statements[2].name, "signal");
    }

    #[test]
    fn parse_empty_program() {
        let program = parse_program("").unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn parse_empty_call() {
        let program = parse_program("x = f()").unwrap();
        match &program.statements[0].expr {
            Expr::Call { args, .. } => assert!(args.is_empty()),
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn statement_spans() {
        let program = parse_program("a = 1\nbb = 2").unwrap();
        assert_eq!(program.statements[0].span.line, 1);
        assert_eq!(program.statements[1].span.line, 2);
    }

    #[test]
    fn error_missing_assign() {
        let err = parse_program("output close").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("'='"));
        assert!(err.found.as_deref().unwrap().contains("close"));
    }

    #[test]
    fn error_missing_else() {
        let err = parse_program("x = 1 when a > 0").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("'else'"));
        assert!(err.message.contains("end of"));
    }

    #[test]
    fn error_unclosed_paren() {
        let err = parse_program("x = (1 + 2").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("')'"));
    }

    #[test]
    fn error_unclosed_call() {
        let err = parse_program("x = sma(close, 10").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("',' or ')'"));
    }

    #[test]
    fn error_missing_expression() {
        let err = parse_program("x = ").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("expression"));
    }

    #[test]
    fn error_statement_not_assignment() {
        let err = parse_program("1 + 2").unwrap_err();
        assert!(err.message.contains("identifier at start of statement"));
    }

    #[test]
    fn error_trailing_garbage() {
        let err = parse_program("x = 1 2").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("end of statement"));
    }

    #[test]
    fn error_position_is_line_precise() {
        let err = parse_program("a = 1\nb = (2\nc = 3").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn deep_paren_nesting_is_an_error_not_a_crash() {
        let source = format!("x = {}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = parse_program(&source).unwrap_err();
        assert!(err.message.contains("nesting"));
    }

    #[test]
    fn chained_not_depth_is_bounded() {
        let source = format!("x = {}close > 1", "not ".repeat(20_000));
        let err = parse_program(&source).unwrap_err();
        assert!(err.message.contains("nesting"));
    }

    #[test]
    fn chained_negation_depth_is_bounded() {
        let source = format!("x = {}close", "-".repeat(20_000));
        let err = parse_program(&source).unwrap_err();
        assert!(err.message.contains("nesting"));
    }

    #[test]
    fn nesting_within_the_ceiling_parses() {
        // Deeper than the validator accepts, well under the parse ceiling.
        let source = format!("x = {}1{}", "(".repeat(40), ")".repeat(40));
        assert!(parse_program(&source).is_ok());
    }

    #[test]
    fn import_is_not_grammar() {
        // `import os` parses as two identifiers with no '=': syntax error.
        let err = parse_program("import os").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("'='"));
    }
}
