pub mod ast;
pub mod hir;
pub mod symbols;
pub mod trivia;
