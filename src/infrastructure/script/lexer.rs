//! Snippet tokenizer.

use std::iter::Peekable;
use std::str::Chars;

use crate::domain::errors::ScriptError;

/// 1-based position within the snippet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn error(self, message: impl Into<String>) -> ScriptError {
        ScriptError::new(self.line, self.column, message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),

    // Keywords
    If,
    Else,
    For,
    Var,
    Return,
    True,
    False,
    Null,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Question,

    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{}`", name),
            Token::Int(v) => format!("`{}`", v),
            Token::Float(v) => format!("`{}`", v),
            Token::Str(_) => "string literal".to_string(),
            Token::Char(_) => "character literal".to_string(),
            Token::Eof => "end of script".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::Var => "var",
            Token::Return => "return",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Question => "?",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            _ => "?",
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    pos: Pos,
}

impl Lexer<'_> {
    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.next() {
                        Some('/') => {
                            while !matches!(self.chars.peek(), None | Some('\n')) {
                                self.bump();
                            }
                        }
                        Some('*') => {
                            let start = self.pos;
                            self.bump();
                            self.bump();
                            loop {
                                match self.bump() {
                                    Some('*') if self.eat('/') => break,
                                    Some(_) => {}
                                    None => return Err(start.error("unterminated comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn escape(&mut self, start: Pos) -> Result<char, ScriptError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some(c) => Err(self.pos.error(format!("unknown escape `\\{}`", c))),
            None => Err(start.error("unterminated literal")),
        }
    }

    fn string(&mut self, start: Pos) -> Result<Token, ScriptError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(value)),
                Some('\\') => value.push(self.escape(start)?),
                Some('\n') | None => return Err(start.error("unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
    }

    fn character(&mut self, start: Pos) -> Result<Token, ScriptError> {
        let value = match self.bump() {
            Some('\\') => self.escape(start)?,
            Some('\'') | Some('\n') | None => return Err(start.error("empty character literal")),
            Some(c) => c,
        };
        if !self.eat('\'') {
            return Err(start.error("unterminated character literal"));
        }
        Ok(Token::Char(value))
    }

    fn number(&mut self, first: char, start: Pos) -> Result<Token, ScriptError> {
        if first == '0' && matches!(self.chars.peek(), Some('x') | Some('X')) {
            self.bump();
            let mut digits = String::new();
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_hexdigit() || c == '_' {
                    self.bump();
                    if c != '_' {
                        digits.push(c);
                    }
                } else {
                    break;
                }
            }
            self.eat('L');
            return i64::from_str_radix(&digits, 16)
                .map(Token::Int)
                .map_err(|_| start.error(format!("invalid hexadecimal literal `0x{}`", digits)));
        }

        let mut text = String::from(first);
        let mut is_float = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.bump();
                if c != '_' {
                    text.push(c);
                }
            } else if c == '.' && !is_float {
                // `1.foo` is not a float; only take the dot before a digit.
                let mut ahead = self.chars.clone();
                ahead.next();
                if !matches!(ahead.next(), Some(d) if d.is_ascii_digit()) {
                    break;
                }
                self.bump();
                is_float = true;
                text.push('.');
            } else if matches!(c, 'e' | 'E') {
                self.bump();
                is_float = true;
                text.push('e');
                if let Some(&sign) = self.chars.peek() {
                    if sign == '+' || sign == '-' {
                        self.bump();
                        text.push(sign);
                    }
                }
            } else {
                break;
            }
        }
        if self.eat('L') || self.eat('l') {
            is_float = false;
        } else if self.eat('d') || self.eat('D') || self.eat('f') || self.eat('F') {
            is_float = true;
        }

        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| start.error(format!("invalid number `{}`", text)))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| start.error(format!("integer literal `{}` out of range", text)))
        }
    }

    fn next_token(&mut self) -> Result<(Token, Pos), ScriptError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(ch) = self.bump() else {
            return Ok((Token::Eof, start));
        };

        let token = match ch {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '?' => Token::Question,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' if self.eat('=') => Token::Eq,
            '=' => Token::Assign,
            '!' if self.eat('=') => Token::Ne,
            '!' => Token::Bang,
            '<' if self.eat('=') => Token::Le,
            '<' => Token::Lt,
            '>' if self.eat('=') => Token::Ge,
            '>' => Token::Gt,
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            '"' => self.string(start)?,
            '\'' => self.character(start)?,
            c if c.is_ascii_digit() => self.number(c, start)?,
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::from(c);
                while let Some(&c) = self.chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        ident.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                match ident.as_str() {
                    "if" => Token::If,
                    "else" => Token::Else,
                    "for" => Token::For,
                    "var" | "let" => Token::Var,
                    "return" => Token::Return,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(ident),
                }
            }
            other => return Err(start.error(format!("unexpected character `{}`", other))),
        };
        Ok((token, start))
    }
}

/// Splits a snippet into tokens, each with its start position. The last
/// token is always [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<(Token, Pos)>, ScriptError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        pos: Pos { line: 1, column: 1 },
    };
    let mut tokens = Vec::new();
    loop {
        let (token, pos) = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push((token, pos));
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_operators_and_keywords() {
        assert_eq!(
            kinds("if (a <= 1 && !b) return; else let x = y != z"),
            vec![
                Token::If,
                Token::LeftParen,
                Token::Ident("a".into()),
                Token::Le,
                Token::Int(1),
                Token::AndAnd,
                Token::Bang,
                Token::Ident("b".into()),
                Token::RightParen,
                Token::Return,
                Token::Semicolon,
                Token::Else,
                Token::Var,
                Token::Ident("x".into()),
                Token::Assign,
                Token::Ident("y".into()),
                Token::Ne,
                Token::Ident("z".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"42 0x1F 1.5 2e3 "a\"b\n" 'c' '\t' 7L"#),
            vec![
                Token::Int(42),
                Token::Int(31),
                Token::Float(1.5),
                Token::Float(2000.0),
                Token::Str("a\"b\n".into()),
                Token::Char('c'),
                Token::Char('\t'),
                Token::Int(7),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_on_integer_is_not_a_float() {
        assert_eq!(
            kinds("1.toString()"),
            vec![
                Token::Int(1),
                Token::Dot,
                Token::Ident("toString".into()),
                Token::LeftParen,
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_and_comments() {
        let tokens = tokenize("// note\n  x /* y */ z").unwrap();
        assert_eq!(tokens[0].1, Pos { line: 2, column: 3 });
        assert_eq!(tokens[1].1, Pos { line: 2, column: 13 });
    }

    #[test]
    fn test_errors_carry_position() {
        let err = tokenize("a\n  \"open").unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));
        assert!(err.message.contains("unterminated"));

        let err = tokenize("a # b").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
    }
}
