use crate::error::PathError;
use crate::lexer::{Lexer, Token, TokenWithPos};
use crate::path::{Path, Segment};

// ── Parser ────────────────────────────────────────────────────────────────

/// Recursive-descent parser for
/// `ident ('[' digits ']')* ('.' ident ('[' digits ']')*)*`.
pub struct Parser<'s> {
    src: &'s str,
    tokens: Vec<TokenWithPos>,
    pos: usize,
}

impl<'s> Parser<'s> {
    pub fn new(src: &'s str, tokens: Vec<TokenWithPos>) -> Self {
        Self { src, tokens, pos: 0 }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.src.len())
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> PathError {
        PathError::syntax(self.src, self.current_offset(), msg)
    }

    fn expect_ident(&mut self) -> Result<String, PathError> {
        let offset = self.current_offset();
        match self.advance() {
            Token::Ident(s) => Ok(s),
            Token::Eof => Err(PathError::syntax(self.src, offset, "expected identifier, got end of path")),
            tok => Err(PathError::syntax(self.src, offset, format!("expected identifier, got {}", describe(&tok)))),
        }
    }

    // ── Path ──────────────────────────────────────────────────────────────

    pub fn parse_path(&mut self) -> Result<Vec<Segment>, PathError> {
        if self.peek() == &Token::Eof {
            return Err(self.err("empty path"));
        }

        let mut segments = Vec::new();
        loop {
            segments.push(Segment::Field(self.expect_ident()?));
            self.parse_indices(&mut segments)?;

            match self.peek() {
                Token::Eof => break,
                Token::Dot => { self.advance(); }
                tok => {
                    return Err(self.err(format!("expected '.' or '[', got {}", describe(tok))));
                }
            }
        }

        Ok(segments)
    }

    // ── Indices ───────────────────────────────────────────────────────────

    fn parse_indices(&mut self, segments: &mut Vec<Segment>) -> Result<(), PathError> {
        while self.peek() == &Token::LBracket {
            self.advance(); // consume `[`
            let index = match self.peek() {
                Token::Number(n) => *n,
                tok => return Err(self.err(format!("expected index digits, got {}", describe(tok)))),
            };
            self.advance();
            if self.peek() != &Token::RBracket {
                return Err(self.err(format!("expected ']', got {}", describe(self.peek()))));
            }
            self.advance(); // consume `]`
            segments.push(Segment::Index(index));
        }
        Ok(())
    }
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier {s:?}"),
        Token::Number(n) => format!("number {n}"),
        Token::Dot => "'.'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Eof => "end of path".to_string(),
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parses path text such as `u_Lights[0].color` into a [`Path`].
pub fn parse_path(src: &str) -> Result<Path, PathError> {
    let tokens = Lexer::new(src).tokenize()?;
    let segments = Parser::new(src, tokens).parse_path()?;
    Ok(Path::from_parts(src.to_string(), segments))
}
