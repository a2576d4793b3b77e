//! The resolved syntax tree consumed by effectc.
//!
//! effectc never parses text. A host-language front end parses and symbol-resolves a source
//! file, and hands the result over as a [`SourceFile`] together with a [`SymbolResolver`]
//! that answers type, symbol and constant queries about it. Front ends that annotate the tree
//! while resolving can use [`AnnotatedResolver`], which answers from those annotations.
//!
//! All node types have small builder methods so trees can also be assembled in code.

mod decl;
mod expr;
mod resolve;
mod stmt;

pub use decl::*;
pub use expr::*;
pub use resolve::*;
pub use stmt::*;

use std::fmt::{Display, Formatter};

/// A position in a source file.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const fn new(line: u32, column: u32) -> Self {
        SourceLocation { line, column }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
