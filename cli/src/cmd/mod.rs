mod dump;
mod eval;
mod repl;
mod run;

pub use dump::dump;
pub use eval::eval;
pub use repl::repl;
pub use run::run;
