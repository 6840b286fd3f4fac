/// A byte range into the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub lo: u32,
    pub hi: u32,
}

impl Span {
    /// Marker for nodes that the compiler synthesizes and that have no source location.
    pub const COMPILER_GENERATED: Span = Span { lo: u32::MAX, hi: u32::MAX };

    pub fn res(self, src: &str) -> &str {
        &src[self.lo as usize..self.hi as usize]
    }

    /// Joins two spans. A compiler generated span on either side yields the other one.
    pub fn to(self, other: Span) -> Span {
        if !self.is_user_span() {
            return other;
        }
        if !other.is_user_span() {
            return self;
        }
        debug_assert!(other.hi >= self.lo);
        Span {
            lo: self.lo,
            hi: other.hi,
        }
    }

    pub fn is_user_span(self) -> bool {
        self != Self::COMPILER_GENERATED
    }

    /// Whether the source between the end of `self` and the start of `next` contains a line terminator.
    pub fn line_break_before(self, next: Span, src: &str) -> bool {
        if !self.is_user_span() || !next.is_user_span() || next.lo < self.hi {
            return false;
        }
        memchr::memchr2(b'\n', b'\r', &src.as_bytes()[self.hi as usize..next.lo as usize]).is_some()
    }
}

#[cfg(test)]
mod test {
    use super::Span;

    #[test]
    fn line_break_detection() {
        let src = "a\nb c";
        let a = Span { lo: 0, hi: 1 };
        let b = Span { lo: 2, hi: 3 };
        let c = Span { lo: 4, hi: 5 };
        assert!(a.line_break_before(b, src));
        assert!(!b.line_break_before(c, src));
        assert_eq!(a.to(c).res(src), src);
    }
}
