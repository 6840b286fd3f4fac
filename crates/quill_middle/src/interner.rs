use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxBuildHasher;

/// Declares the symbols that every [`StringInterner`] starts out with.
///
/// Keywords are listed first so that they occupy the lowest indices, which makes
/// [`Symbol::is_keyword`] a single comparison.
macro_rules! define_symbols {
    (
        keywords { $($kw:ident: $kwstr:literal,)* }
        others { $($name:ident: $str:literal,)* }
    ) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum KeywordIndex {
            $($kw,)*
        }

        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum OtherIndex {
            $($name,)*
        }

        pub(super) const KEYWORD_COUNT: u32 = [$($kwstr),*].len() as u32;

        $(pub const $kw: Symbol = Symbol(KeywordIndex::$kw as u32);)*
        $(pub const $name: Symbol = Symbol(KEYWORD_COUNT + OtherIndex::$name as u32);)*

        pub const PREINTERNED: &[&str] = &[$($kwstr,)* $($str,)*];
    };
}

pub mod sym {
    #![allow(non_upper_case_globals)]

    use super::Symbol;

    define_symbols! {
        keywords {
            if_: "if",
            else_: "else",
            function: "function",
            var: "var",
            let_: "let",
            const_: "const",
            return_: "return",
            throw: "throw",
            try_: "try",
            catch: "catch",
            finally: "finally",
            true_: "true",
            false_: "false",
            null: "null",
            new: "new",
            for_: "for",
            do_: "do",
            while_: "while",
            in_: "in",
            instanceof: "instanceof",
            delete: "delete",
            void: "void",
            typeof_: "typeof",
            continue_: "continue",
            break_: "break",
            debugger: "debugger",
            this: "this",
        }
        others {
            empty: "",
            target: "target",
            undefined: "undefined",
            globalThis: "globalThis",
            prototype: "prototype",
            constructor: "constructor",
            name: "name",
            message: "message",
            length: "length",
            NaN: "NaN",
            Infinity: "Infinity",
            toString: "toString",
            valueOf: "valueOf",
        }
    }
}

/// An interned string. Two symbols of the same interner are equal if and only if their strings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn is_keyword(self) -> bool {
        self.0 < sym::KEYWORD_COUNT
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone)]
pub struct StringInterner {
    store: Vec<Rc<str>>,
    mapping: hashbrown::HashMap<Rc<str>, u32, FxBuildHasher>,
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner").field("len", &self.store.len()).finish()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    pub fn new() -> Self {
        let mut store = Vec::with_capacity(sym::PREINTERNED.len());
        let mut mapping = hashbrown::HashMap::with_capacity_and_hasher(sym::PREINTERNED.len(), FxBuildHasher);

        for s in sym::PREINTERNED {
            let s: Rc<str> = Rc::from(*s);
            mapping.insert(Rc::clone(&s), store.len() as u32);
            store.push(s);
        }

        Self { store, mapping }
    }

    pub fn intern(&mut self, value: impl Borrow<str>) -> Symbol {
        let value = value.borrow();
        if let Some(&id) = self.mapping.get(value) {
            return Symbol(id);
        }

        let id = self.store.len() as u32;
        let value: Rc<str> = Rc::from(value);
        self.mapping.insert(Rc::clone(&value), id);
        self.store.push(value);
        Symbol(id)
    }

    pub fn intern_char(&mut self, value: char) -> Symbol {
        let mut buf = [0; 4];
        self.intern(&*value.encode_utf8(&mut buf))
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.store[symbol.0 as usize]
    }

    /// Returns the shared string behind `symbol` without copying it.
    pub fn resolve_rc(&self, symbol: Symbol) -> Rc<str> {
        Rc::clone(&self.store[symbol.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn preinterned_symbols_resolve() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(sym::if_), "if");
        assert_eq!(interner.resolve(sym::this), "this");
        assert_eq!(interner.resolve(sym::target), "target");
        assert_eq!(interner.resolve(sym::empty), "");
        assert!(sym::this.is_keyword());
        assert!(!sym::target.is_keyword());
    }

    #[test]
    fn interning_is_idempotent() {
        let mut interner = StringInterner::new();
        let a = interner.intern("demo");
        let b = interner.intern(String::from("demo"));
        assert_eq!(a, b);
        assert_eq!(interner.intern("new"), sym::new);
        assert_ne!(interner.intern("arrow"), a);
        assert_eq!(interner.intern_char('x'), interner.intern("x"));
    }
}
