pub mod error;
pub mod expr;
pub mod statement;
