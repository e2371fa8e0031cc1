pub use errors::Position;

/// A value paired with the source position it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Trivia<T> {
    pub inner: T,
    pub span: Position,
}

pub fn new<T>(inner: T, span: Position) -> Trivia<T> {
    Trivia { inner, span }
}
