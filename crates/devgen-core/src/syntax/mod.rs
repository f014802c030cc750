//! Go subset front end: lexer, parser, and plain AST

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{
    Decl, FieldDef, Import, MethodDef, SourceFile, TypeDecl, TypeExpr, ValueDecl, ValueKind,
    ValueSpec,
};
pub use parser::{ParseError, parse_file};
