use std::{iter::Peekable, str::Chars, str::Lines};

use ast::{
    ast::Bracket,
    trivia::{new, Position, Trivia},
};
use errors::ParsingError;
use smol_str::SmolStr;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Open(Bracket),
    Close(Bracket),
    Space,
    Tab,
    Symbol(String),
    Str(String),
    Comment(String),
}

#[derive(Clone, Copy)]
enum Escape {
    None,
    Start,
    Octal { digits: u8, acc: u32 },
    Hex { digits: u8, acc: u32 },
}

/// Line-buffered character scanner. Positions are 1-based; the column counts
/// source characters, not decoded ones.
pub struct Scanner<'a> {
    source: SmolStr,
    lines: Lines<'a>,
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new<S: Into<SmolStr>>(source: S, text: &'a str) -> Self {
        Self {
            source: source.into(),
            lines: text.lines(),
            chars: "".chars().peekable(),
            line: 0,
            column: 1,
        }
    }

    pub fn here(&self) -> Position {
        Position::new(self.source.clone(), self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.column += 1;
        Some(c)
    }

    fn take_while<P: Fn(char) -> bool>(&mut self, pred: P) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// `Ok(None)` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Trivia<Token>>, ParsingError> {
        let c = loop {
            if let Some(&c) = self.chars.peek() {
                break c;
            }
            match self.lines.next() {
                Some(line) => {
                    self.line += 1;
                    self.column = 1;
                    self.chars = line.chars().peekable();
                }
                None => return Ok(None),
            }
        };

        let span = self.here();
        let token = match c {
            ' ' => {
                self.bump();
                Token::Space
            }
            '\t' => {
                self.bump();
                Token::Tab
            }
            ';' => {
                self.bump();
                Token::Comment(self.take_while(|_| true))
            }
            '"' => Token::Str(self.string(&span)?),
            c => {
                if let Some(bracket) = Bracket::from_open(c) {
                    self.bump();
                    Token::Open(bracket)
                } else if let Some(bracket) = Bracket::from_close(c) {
                    self.bump();
                    Token::Close(bracket)
                } else {
                    Token::Symbol(self.take_while(|c| {
                        !matches!(c, ' ' | '\t' | ';')
                            && Bracket::from_open(c).is_none()
                            && Bracket::from_close(c).is_none()
                    }))
                }
            }
        };

        Ok(Some(new(token, span)))
    }

    fn string(&mut self, start: &Position) -> Result<String, ParsingError> {
        self.bump();

        let mut out = String::new();
        let mut state = Escape::None;

        loop {
            let position = self.here();
            let Some(c) = self.bump() else {
                return Err(ParsingError::StringLiteralMustBeASingleLine {
                    position: start.clone(),
                });
            };
            let illegal = || ParsingError::IllegalEscapeSequence {
                position: position.clone(),
                found: c,
            };

            state = match state {
                Escape::None => match c {
                    '"' => return Ok(out),
                    '\\' => Escape::Start,
                    c => {
                        out.push(c);
                        Escape::None
                    }
                },
                Escape::Start => {
                    let short = match c {
                        'a' => '\x07',
                        'b' => '\x08',
                        'f' => '\x0c',
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'v' => '\x0b',
                        '\\' | '\'' | '"' | '?' => c,
                        'x' => {
                            state = Escape::Hex { digits: 0, acc: 0 };
                            continue;
                        }
                        c => {
                            let digit = c.to_digit(8).ok_or_else(illegal)?;
                            state = Escape::Octal {
                                digits: 1,
                                acc: digit,
                            };
                            continue;
                        }
                    };
                    out.push(short);
                    Escape::None
                }
                Escape::Octal { digits, acc } => {
                    let acc = acc * 8 + c.to_digit(8).ok_or_else(illegal)?;
                    if digits == 2 {
                        out.push(char::from_u32(acc).ok_or_else(illegal)?);
                        Escape::None
                    } else {
                        Escape::Octal {
                            digits: digits + 1,
                            acc,
                        }
                    }
                }
                Escape::Hex { digits, acc } => {
                    let acc = acc * 16 + c.to_digit(16).ok_or_else(illegal)?;
                    if digits == 1 {
                        out.push(char::from_u32(acc).ok_or_else(illegal)?);
                        Escape::None
                    } else {
                        Escape::Hex {
                            digits: digits + 1,
                            acc,
                        }
                    }
                }
            };
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Trivia<Token>, ParsingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod test {
    use ast::ast::escape_string;
    use expect_test::{expect, Expect};
    use indoc::indoc;

    use super::*;

    fn lex(src: &str, expect: Expect) {
        let mut lines = Vec::new();
        for token in Scanner::new("t", src) {
            match token {
                Ok(token) => lines.push(format!(
                    "{}:{} {:?}",
                    token.span.line, token.span.column, token.inner
                )),
                Err(e) => {
                    lines.push(e.to_string());
                    break;
                }
            }
        }
        expect.assert_eq(&format!("{}\n", lines.join("\n")));
    }

    fn decode(literal: &str) -> Result<String, ParsingError> {
        match Scanner::new("t", literal).next_token()? {
            Some(Trivia {
                inner: Token::Str(text),
                ..
            }) => Ok(text),
            other => panic!("expected a string literal, got {other:?}"),
        }
    }

    #[test]
    fn test_tokens() {
        lex(
            r#"(+ 1 "a\tb") ; hi"#,
            expect![[r#"
                1:1 Open(Paren)
                1:2 Symbol("+")
                1:3 Space
                1:4 Symbol("1")
                1:5 Space
                1:6 Str("a\tb")
                1:12 Close(Paren)
                1:13 Space
                1:14 Comment(" hi")
            "#]],
        );
        lex(
            indoc! {"
                (set x 10)
                [y\t{z}]
            "},
            expect![[r#"
                1:1 Open(Paren)
                1:2 Symbol("set")
                1:5 Space
                1:6 Symbol("x")
                1:7 Space
                1:8 Symbol("10")
                1:10 Close(Paren)
                2:1 Open(Square)
                2:2 Symbol("y")
                2:3 Tab
                2:4 Open(Curly)
                2:5 Symbol("z")
                2:6 Close(Curly)
                2:7 Close(Square)
            "#]],
        );
    }

    #[test]
    fn test_symbol_boundaries() {
        lex(
            r#"a"b;c"#,
            expect![[r#"
                1:1 Symbol("a\"b")
                1:4 Comment("c")
            "#]],
        );
    }

    #[test]
    fn test_here() {
        let mut scanner = Scanner::new("t", "(ab \"c\")");
        assert_eq!(scanner.here().to_string(), "t:0:1");

        let tokens: Vec<_> = scanner.by_ref().take(3).collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(scanner.here().to_string(), "t:1:5");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(decode(r#""\n\073\x30""#).as_deref(), Ok("\n;0"));
        assert_eq!(decode(r#""\a\b\f\r\v""#).as_deref(), Ok("\x07\x08\x0c\r\x0b"));
        assert_eq!(decode(r#""\\\'\"\?""#).as_deref(), Ok("\\'\"?"));
        assert_eq!(decode(r#""\x4A\101""#).as_deref(), Ok("JA"));

        for text in ["tab\there", "quote\"back\\slash", "bell\x07\x01\x7f", "ünï"] {
            let literal = format!("\"{}\"", escape_string(text));
            assert_eq!(decode(&literal).as_deref(), Ok(text));
        }
    }

    #[test]
    fn test_string_errors() {
        lex(
            r#"("a\qb")"#,
            expect![[r#"
                1:1 Open(Paren)
                t:1:5 Illegal escape sequence: 'q'
            "#]],
        );
        lex(
            r#"("\08")"#,
            expect![[r#"
                1:1 Open(Paren)
                t:1:5 Illegal escape sequence: '8'
            "#]],
        );
        lex(
            r#"("\x4")"#,
            expect![[r#"
                1:1 Open(Paren)
                t:1:6 Illegal escape sequence: '"'
            "#]],
        );
        lex(
            indoc! {r#"
                (x "abc
                def")
            "#},
            expect![[r#"
                1:1 Open(Paren)
                1:2 Symbol("x")
                1:3 Space
                t:1:4 String literal must be a single line
            "#]],
        );
    }
}
