//! Logging facade for the quill crates.
//!
//! None of the engine crates depend on `tracing` directly. Every macro here expands to a
//! branch on [`ENABLED`], which is a compile time constant: building without the `QUILL_LOG`
//! environment variable set removes all log statements from the hot paths of the interpreter.

#[doc(hidden)]
pub use tracing as __tracing;
pub use tracing::Level;

/// Whether logging was compiled in.
pub const ENABLED: bool = option_env!("QUILL_LOG").is_some();

#[macro_export]
macro_rules! trace {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::trace!($($tok)*)
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::debug!($($tok)*)
        }
    };
}

#[macro_export]
macro_rules! info {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::info!($($tok)*)
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::warn!($($tok)*)
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::error!($($tok)*)
        }
    };
}

/// Creates a [`Span`]. Evaluates to [`Span::Disabled`] without touching `tracing` if logging
/// was not compiled in.
#[macro_export]
macro_rules! span {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::Span::Enabled($crate::__tracing::span!($($tok)*))
        } else {
            $crate::Span::Disabled
        }
    };
}

#[macro_export]
macro_rules! event {
    ($($tok:tt)*) => {
        if $crate::ENABLED {
            $crate::__tracing::event!($($tok)*);
        }
    };
}

#[derive(Debug, Clone)]
pub enum Span {
    Enabled(tracing::Span),
    Disabled,
}

impl Span {
    pub fn enter(&self) -> Entered<'_> {
        match self {
            Self::Enabled(span) => Entered::Enabled(span.enter()),
            Self::Disabled => Entered::Disabled,
        }
    }

    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match self {
            Self::Enabled(span) => span.in_scope(f),
            Self::Disabled => f(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// Guard returned by [`Span::enter`], exits the span when dropped.
#[derive(Debug)]
pub enum Entered<'a> {
    Enabled(tracing::span::Entered<'a>),
    Disabled,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disabled_span_runs_closure() {
        let span = Span::Disabled;
        assert!(span.is_disabled());
        assert_eq!(span.in_scope(|| 1 + 1), 2);
        let _guard = span.enter();
    }

    #[test]
    fn macros_expand_in_statement_position() {
        let value = 42;
        debug!("value: {}", value);
        warn!(value, "unused");
        let span = span!(Level::DEBUG, "test");
        span.in_scope(|| trace!("inside"));
    }
}
