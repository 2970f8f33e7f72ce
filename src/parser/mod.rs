// Boolean filter-query parser

pub mod ast;
pub mod lexer;
pub mod query;

// Public API re-exports
pub use ast::Query;
pub use query::parse_query;
