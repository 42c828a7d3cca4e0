//! Global String Interner
//!
//! Maps strings to compact integer [`Symbol`]s. Shader define names and values
//! are interned so that define sets compare and hash as integer vectors.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Symbol type alias.
pub type Symbol = Spur;

/// Intern a string, returning its Symbol.
///
/// Returns the existing Symbol if the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Look up the Symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolve a Symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-intern the macro names emitted by the built-in node library.
pub fn preload_common_macros() {
    let common = [
        "SHADER_NAME",
        "_NONE",
        "_PCF",
        "_ESM",
        "_VSM",
        "_EVSM",
        "_FAKE_PCF",
        "_POISSON_PCF",
        "_BAND_PCF",
        "_TAP_PCF",
        "_FLOATTEX",
        "_FLOATLINEAR",
        "_ROTATE_OFFSET",
        "1",
    ];

    for name in common {
        intern(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("_PCF");
        let s2 = intern("_PCF");
        let s3 = intern("_ESM");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "_PCF");
        assert_eq!(resolve(s3), "_ESM");
    }

    #[test]
    fn test_get() {
        let _ = intern("_ROTATE_OFFSET_TEST");

        assert!(get("_ROTATE_OFFSET_TEST").is_some());
        assert!(get("never_interned_macro").is_none());
    }
}
