use std::rc::Rc;

use smol_str::SmolStr;

use crate::{
    symbols::{SymbolId, SymbolTable},
    trivia::{Position, Trivia},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Bracket {
    Paren,
    Square,
    Curly,
}

impl Bracket {
    pub fn from_open(c: char) -> Option<Self> {
        match c {
            '(' => Some(Self::Paren),
            '[' => Some(Self::Square),
            '{' => Some(Self::Curly),
            _ => None,
        }
    }

    pub fn from_close(c: char) -> Option<Self> {
        match c {
            ')' => Some(Self::Paren),
            ']' => Some(Self::Square),
            '}' => Some(Self::Curly),
            _ => None,
        }
    }

    pub fn open(self) -> char {
        match self {
            Self::Paren => '(',
            Self::Square => '[',
            Self::Curly => '{',
        }
    }

    pub fn close(self) -> char {
        match self {
            Self::Paren => ')',
            Self::Square => ']',
            Self::Curly => '}',
        }
    }
}

/// A bracket-delimited sequence of elements. `bracket` is the kind that opened it.
#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub bracket: Bracket,
    pub elements: Vec<Element>,
    pub span: Position,
}

impl List {
    pub fn new(bracket: Bracket, span: Position) -> Self {
        Self {
            bracket,
            elements: Vec::new(),
            span,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Everything after the leading element.
    pub fn args(&self) -> &[Element] {
        self.elements.get(1..).unwrap_or_default()
    }

    pub fn pretty_string(&self, indent: usize, symbols: &SymbolTable) -> String {
        let buffer = " ".repeat(indent);

        let line = format!(
            "{buffer}List{}{} {}:{}",
            self.bracket.open(),
            self.bracket.close(),
            self.span.line,
            self.span.column
        );
        let mut lines: Vec<String> = self
            .elements
            .iter()
            .map(|x| x.pretty_string(indent + 2, symbols))
            .collect();
        lines.insert(0, line);

        lines.join("\n")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    List(Rc<List>),
    Int(Trivia<i64>),
    Float(Trivia<f64>),
    String(Trivia<SmolStr>),
    Symbol(Trivia<SymbolId>),
}

impl Element {
    pub fn span(&self) -> &Position {
        match self {
            Self::List(list) => &list.span,
            Self::Int(Trivia { span, .. })
            | Self::Float(Trivia { span, .. })
            | Self::String(Trivia { span, .. })
            | Self::Symbol(Trivia { span, .. }) => span,
        }
    }

    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Symbol(sym) => Some(sym.inner),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<List>> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn pretty_string(&self, indent: usize, symbols: &SymbolTable) -> String {
        let buffer = " ".repeat(indent);

        match self {
            Self::List(list) => list.pretty_string(indent, symbols),
            Self::Int(int) => format!(
                "{buffer}Int({}) {}:{}",
                int.inner, int.span.line, int.span.column
            ),
            Self::Float(float) => format!(
                "{buffer}Float({:?}) {}:{}",
                float.inner, float.span.line, float.span.column
            ),
            Self::String(str) => format!(
                "{buffer}String(\"{}\") {}:{}",
                escape_string(&str.inner),
                str.span.line,
                str.span.column
            ),
            Self::Symbol(sym) => {
                let name = symbols
                    .name_of(sym.inner)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|_| sym.inner.to_string());

                format!("{buffer}Symbol({name}) {}:{}", sym.span.line, sym.span.column)
            }
        }
    }
}

/// Writes `text` back in string-literal escape form (without the quotes).
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trivia::new;

    #[test]
    fn test_brackets() {
        for bracket in [Bracket::Paren, Bracket::Square, Bracket::Curly] {
            assert_eq!(Bracket::from_open(bracket.open()), Some(bracket));
            assert_eq!(Bracket::from_close(bracket.close()), Some(bracket));
            assert_eq!(Bracket::from_open(bracket.close()), None);
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_string("line\nfeed\ttab"), "line\\nfeed\\ttab");
        assert_eq!(escape_string("\x01\x7f"), "\\x01\\x7f");
    }

    #[test]
    fn test_pretty() {
        let mut symbols = SymbolTable::new();
        let add = symbols.intern("+");
        let at = |column| Position::new("t", 1, column);

        let mut list = List::new(Bracket::Square, at(1));
        list.elements.push(Element::Symbol(new(add, at(2))));
        list.elements.push(Element::Int(new(1, at(4))));
        list.elements.push(Element::Float(new(2.5, at(6))));
        list.elements.push(Element::String(new("x\n".into(), at(10))));

        assert_eq!(list.args().len(), 3);
        assert_eq!(
            list.pretty_string(0, &symbols),
            [
                "List[] 1:1",
                "  Symbol(+) 1:2",
                "  Int(1) 1:4",
                "  Float(2.5) 1:6",
                "  String(\"x\\n\") 1:10",
            ]
            .join("\n")
        );
    }
}
