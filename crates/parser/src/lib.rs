use std::rc::Rc;

use ast::{
    ast::{Element, List},
    symbols::SymbolTable,
    trivia::{new, Position, Trivia},
};
use errors::ParsingError;
use log::debug;

use crate::lexer::{Scanner, Token};

pub mod lexer;

/// Parses `text` into its top-level lists, interning symbols into `symbols`.
/// `source` names the text in every position.
pub fn parse(
    source: &str,
    text: &str,
    symbols: &mut SymbolTable,
) -> Result<Vec<Rc<List>>, ParsingError> {
    let mut scanner = Scanner::new(source, text);
    let mut stack: Vec<List> = Vec::new();
    let mut forms = Vec::new();

    while let Some(Trivia { inner, span }) = scanner.next_token()? {
        let element = match inner {
            Token::Space | Token::Tab | Token::Comment(_) => continue,
            Token::Open(bracket) => {
                stack.push(List::new(bracket, span));
                continue;
            }
            Token::Close(bracket) => {
                let list = match stack.pop() {
                    Some(list) if list.bracket == bracket => Rc::new(list),
                    _ => {
                        return Err(ParsingError::UnexpectedInputChar {
                            position: span,
                            found: bracket.close(),
                        })
                    }
                };
                match stack.last_mut() {
                    Some(parent) => parent.elements.push(Element::List(list)),
                    None => forms.push(list),
                }
                continue;
            }
            Token::Symbol(text) => {
                if stack.is_empty() {
                    return Err(ParsingError::TopLevelElementMustBeAList { position: span });
                }
                classify(&text, span, symbols)
            }
            Token::Str(text) => Element::String(new(text.into(), span)),
        };

        match stack.last_mut() {
            Some(list) => list.elements.push(element),
            None => {
                return Err(ParsingError::TopLevelElementMustBeAList {
                    position: element.span().clone(),
                })
            }
        }
    }

    if !stack.is_empty() {
        return Err(ParsingError::MissingClosingParenthesis {
            position: scanner.here(),
        });
    }

    debug!("parsed {} top-level forms from {source}", forms.len());
    Ok(forms)
}

/// Integer, then float, then symbol.
fn classify(text: &str, span: Position, symbols: &mut SymbolTable) -> Element {
    if let Some(int) = parse_integer(text) {
        Element::Int(new(int, span))
    } else if let Some(float) = parse_float(text) {
        Element::Float(new(float, span))
    } else {
        Element::Symbol(new(symbols.intern(text), span))
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// `_` may only sit between digits, or between a base prefix and a digit.
fn underscores_ok(text: &str) -> bool {
    let (_, mut rest) = split_sign(text);

    // '^' start, '0' digit or prefix, '_' separator, '!' anything else
    let mut saw = '^';
    let mut hex = false;
    if let Some(prefix @ ("0x" | "0X" | "0o" | "0O" | "0b" | "0B")) = rest.get(..2) {
        hex = prefix.ends_with(['x', 'X']);
        rest = &rest[2..];
        saw = '0';
    }

    for c in rest.chars() {
        if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
            saw = '0';
        } else if c == '_' {
            if saw != '0' {
                return false;
            }
            saw = '_';
        } else {
            if saw == '_' {
                return false;
            }
            saw = '!';
        }
    }

    saw != '_'
}

fn strip_underscores(text: &str) -> Option<String> {
    if text.contains('_') && !underscores_ok(text) {
        return None;
    }

    Some(text.chars().filter(|c| *c != '_').collect())
}

/// Signed integer literal: `0x`, `0o` and `0b` prefixes, a leading `0` for
/// octal, decimal otherwise, `_` allowed between digits. `None` unless the
/// whole text is consumed and the value fits an `i64`.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = strip_underscores(text)?;
    let (negative, digits) = split_sign(&text);

    let (radix, digits) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// Decimal floats as `str::parse` reads them (`inf` and `nan` included),
/// hexadecimal floats with a binary exponent (`0x1.8p1`), `_` allowed between
/// digits.
pub fn parse_float(text: &str) -> Option<f64> {
    let text = strip_underscores(text)?;
    let (negative, body) = split_sign(&text);

    match body.get(..2) {
        Some("0x" | "0X") => {
            let value = parse_hex_float(&body[2..])?;
            Some(if negative { -value } else { value })
        }
        _ => text.parse().ok(),
    }
}

fn parse_hex_float(text: &str) -> Option<f64> {
    let (mantissa, exponent) = text.split_once(['p', 'P'])?;
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for c in int.chars().chain(frac.chars()) {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }

    let exponent: i32 = exponent.parse().ok()?;
    if value == 0.0 {
        return Some(0.0);
    }

    let shift = i32::try_from(frac.len()).ok()?.checked_mul(4)?;
    Some(value * 2f64.powi(exponent.saturating_sub(shift)))
}

#[cfg(test)]
mod test {
    use expect_test::{expect, Expect};
    use indoc::indoc;

    use super::*;

    fn p(src: &str, expect: Expect) {
        let mut symbols = SymbolTable::new();
        match parse("t", src, &mut symbols) {
            Ok(forms) => {
                let x: Vec<String> = forms
                    .iter()
                    .map(|form| form.pretty_string(0, &symbols))
                    .collect();
                expect.assert_eq(&format!("{}\n", x.join("\n")));
            }
            Err(e) => {
                expect.assert_eq(&format!("{e}\n"));
            }
        }
    }

    #[test]
    fn test_list() {
        p(
            r#"(+ 1 2.5 abc "s")"#,
            expect![[r#"
                List() 1:1
                  Symbol(+) 1:2
                  Int(1) 1:4
                  Float(2.5) 1:6
                  Symbol(abc) 1:10
                  String("s") 1:14
            "#]],
        );
        p(
            indoc! {"
                (set f (func (x)
                  [* x 2])) ; doubles
                {f 0x10}
            "},
            expect![[r#"
                List() 1:1
                  Symbol(set) 1:2
                  Symbol(f) 1:6
                  List() 1:8
                    Symbol(func) 1:9
                    List() 1:14
                      Symbol(x) 1:15
                    List[] 2:3
                      Symbol(*) 2:4
                      Symbol(x) 2:6
                      Int(2) 2:8
                List{} 3:1
                  Symbol(f) 3:2
                  Int(16) 3:4
            "#]],
        );
    }

    #[test]
    fn test_no_forms() {
        let mut symbols = SymbolTable::new();
        assert_eq!(parse("t", "", &mut symbols), Ok(vec![]));
        assert_eq!(parse("t", "  ; only a comment\n\t\n", &mut symbols), Ok(vec![]));
    }

    #[test]
    fn test_classification() {
        p(
            "(123 -7 0x1F 08 1.5 inf abc)",
            expect![[r#"
                List() 1:1
                  Int(123) 1:2
                  Int(-7) 1:6
                  Int(31) 1:9
                  Float(8.0) 1:14
                  Float(1.5) 1:17
                  Float(inf) 1:21
                  Symbol(abc) 1:25
            "#]],
        );
        p(
            "(1_000 0x_FF 0x1p4 1_0.5 _1 1__0)",
            expect![[r#"
                List() 1:1
                  Int(1000) 1:2
                  Int(255) 1:8
                  Float(16.0) 1:14
                  Float(10.5) 1:20
                  Symbol(_1) 1:26
                  Symbol(1__0) 1:29
            "#]],
        );
    }

    #[test]
    fn test_brackets() {
        p(
            "(1 2 3",
            expect![[r#"
                t:1:7 Missing closing parenthesis
            "#]],
        );
        p(
            "(1 2]",
            expect![[r#"
                t:1:5 Unexpected input char: ']'
            "#]],
        );
        p(
            "(a) )",
            expect![[r#"
                t:1:5 Unexpected input char: ')'
            "#]],
        );
        p(
            "(a [b {c}]\n",
            expect![[r#"
                t:1:11 Missing closing parenthesis
            "#]],
        );
        p(
            "abc (x)",
            expect![[r#"
                t:1:1 Top-level element must be a list
            "#]],
        );
        p(
            r#"(x) "s""#,
            expect![[r#"
                t:1:5 Top-level element must be a list
            "#]],
        );
    }

    #[test]
    fn test_same_spelling_same_symbol() {
        let mut symbols = SymbolTable::new();
        let forms = parse("t", "(a b a)", &mut symbols).unwrap();

        let ids: Vec<_> = forms[0]
            .elements
            .iter()
            .map(|e| e.as_symbol().unwrap())
            .collect();
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("+42"), Some(42));
        assert_eq!(parse_integer("-0x10"), Some(-16));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("017"), Some(15));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_integer("9223372036854775808"), None);
        assert_eq!(parse_integer("08"), None);
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("+"), None);
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer("--1"), None);
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("-0b_1_0"), Some(-2));
        assert_eq!(parse_integer("0_17"), Some(15));
        assert_eq!(parse_integer("1_"), None);
        assert_eq!(parse_integer("_1"), None);
        assert_eq!(parse_integer("1__0"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("-2e3"), Some(-2000.0));
        assert_eq!(parse_float("1_0.2_5"), Some(10.25));
        assert_eq!(parse_float("0x1p4"), Some(16.0));
        assert_eq!(parse_float("0x1.8p1"), Some(3.0));
        assert_eq!(parse_float("-0X_Ap-1"), Some(-5.0));
        assert_eq!(parse_float("0x.8p0"), Some(0.5));
        assert_eq!(parse_float("0x0p9999"), Some(0.0));
        assert_eq!(parse_float("inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("0x1.8"), None);
        assert_eq!(parse_float("0xp1"), None);
        assert_eq!(parse_float("1._5"), None);
        assert_eq!(parse_float("abc"), None);
    }
}
