pub mod array;
pub mod error;
pub mod function;
pub mod global;
pub mod object;
