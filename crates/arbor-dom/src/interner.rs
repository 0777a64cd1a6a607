//! String Interner - Deduplicate names
//!
//! Element and attribute names, prefixes and namespace URIs repeat all over
//! a document. They are stored once and referenced by a 4-byte [`Atom`].

use std::collections::HashMap;

/// Interned string ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Atom(pub(crate) u32);

impl Atom {
    /// Empty string
    pub const EMPTY: Atom = Atom(0);
}

/// String interner for names
#[derive(Debug)]
pub struct StringInterner {
    /// Map from string content to atom
    map: HashMap<Box<str>, Atom>,
    /// Interned strings, indexed by atom
    strings: Vec<Box<str>>,
}

impl StringInterner {
    /// Create a new interner with common XML names pre-interned
    pub fn new() -> Self {
        let mut interner = Self {
            map: HashMap::with_capacity(64),
            strings: Vec::with_capacity(64),
        };

        // Index 0 is always the empty string
        interner.intern("");

        const COMMON_NAMES: &[&str] = &[
            "xml",
            "xmlns",
            "id",
            "lang",
            "space",
            "http://www.w3.org/XML/1998/namespace",
            "http://www.w3.org/2000/xmlns/",
        ];
        for name in COMMON_NAMES {
            interner.intern(name);
        }

        interner
    }

    /// Intern a string, returning its atom
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = s.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    /// Resolve an atom back to its string
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings.get(atom.0 as usize).map_or("", |s| &**s)
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false: the empty string is pre-interned
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
