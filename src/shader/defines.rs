//! Shader Macro Definitions
//!
//! Collects the `#define` lines gathered from a node graph into a set keyed
//! by macro name. Names and values are interned [`Symbol`]s kept in a sorted
//! `Vec`, so membership tests during conditional includes are binary
//! searches over integers.
//!
//! ```rust,ignore
//! let mut defines = ShaderDefines::new();
//! defines.push_line("#define _PCF");
//! defines.push_line("#define _FAKE_PCF 1");
//! assert!(defines.contains("_PCF"));
//! ```

use std::hash::{Hash, Hasher};

use crate::shader::nodes::functions::define_line;
use crate::utils::interner::{self, Symbol};

/// A set of macro definitions, unique per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDefines {
    defines: Vec<(Symbol, Symbol)>,
}

impl ShaderDefines {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a define. A later value for the same name wins.
    pub fn set(&mut self, name: &str, value: &str) {
        self.set_symbol(interner::intern(name), interner::intern(value));
    }

    #[inline]
    pub fn set_symbol(&mut self, name: Symbol, value: Symbol) {
        match self.defines.binary_search_by_key(&name, |&(k, _)| k) {
            Ok(idx) => self.defines[idx].1 = value,
            Err(idx) => self.defines.insert(idx, (name, value)),
        }
    }

    /// Parse a `#define NAME [VALUE]` line. Anything else is ignored and
    /// reported as `false`.
    pub fn push_line(&mut self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("#define") {
            return false;
        }
        let Some(name) = tokens.next() else {
            return false;
        };
        let value = tokens.collect::<Vec<_>>().join(" ");
        self.set(name, &value);
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let Some(sym) = interner::get(name) else {
            return false;
        };
        match self.defines.binary_search_by_key(&sym, |&(k, _)| k) {
            Ok(idx) => {
                self.defines.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.contains_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn contains_symbol(&self, name: Symbol) -> bool {
        self.defines.binary_search_by_key(&name, |&(k, _)| k).is_ok()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static str> {
        let sym = interner::get(name)?;
        self.defines
            .binary_search_by_key(&sym, |&(k, _)| k)
            .ok()
            .map(|idx| interner::resolve(self.defines[idx].1))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    pub fn merge(&mut self, other: &ShaderDefines) {
        for &(name, value) in &other.defines {
            self.set_symbol(name, value);
        }
    }

    /// `#define` lines sorted by text, independent of interning order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .defines
            .iter()
            .map(|&(k, v)| define_line(interner::resolve(k), interner::resolve(v)))
            .collect();
        lines.sort();
        lines
    }
}

impl Hash for ShaderDefines {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.defines.hash(state);
    }
}

impl<'a> FromIterator<&'a str> for ShaderDefines {
    fn from_iter<I: IntoIterator<Item = &'a str>>(lines: I) -> Self {
        let mut defines = Self::new();
        for line in lines {
            defines.push_line(line);
        }
        defines
    }
}
