//! Process-wide symbol table.
//!
//! Every distinct symbol text maps to exactly one [`Symbol`] handle, so the
//! evaluator compares symbols by handle and never by text. The table lives for
//! the whole process and never forgets a name.

use std::fmt;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: LazyLock<Mutex<StringInterner<DefaultBackend>>> =
    LazyLock::new(|| Mutex::new(StringInterner::<DefaultBackend>::new()));

/// A poisoned lock only means another thread panicked mid-intern; the table itself
/// is append-only, so it is still consistent.
fn table() -> MutexGuard<'static, StringInterner<DefaultBackend>> {
    INTERNER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opaque, copyable handle to an interned symbol name.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(DefaultSymbol);

impl Symbol {
    /// The text this symbol was interned from.
    pub fn name(self) -> String {
        table()
            .resolve(self.0)
            .map(str::to_owned)
            .unwrap_or_default()
    }
}

/// Intern `name`, returning the canonical handle for that text.
pub fn intern(name: &str) -> Symbol {
    Symbol(table().get_or_intern(name))
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_handle() {
        let a = intern("interner-test-a");
        let b = intern("interner-test-a");
        let c = intern("interner-test-c");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_name_round_trip() {
        for name in ["car", "+", "foo-bar?", "x", "*"] {
            assert_eq!(intern(name).name(), name);
            assert_eq!(format!("{}", intern(name)), name);
        }
    }

    #[test]
    fn test_interning_is_shared_across_threads() {
        let here = intern("interner-test-threads");
        let there = std::thread::spawn(|| intern("interner-test-threads"))
            .join()
            .unwrap_or_else(|_| panic!("interning thread panicked"));
        assert_eq!(here, there);
    }
}
