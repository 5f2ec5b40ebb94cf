use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

/// An interned engine symbol.
///
/// Two symbols with the same text share one allocation, so the engine can
/// compare them by reference.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference identity, as the engine compares symbols.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn table() -> &'static Mutex<HashSet<Arc<str>>> {
    static TABLE: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Register `text` in the process-wide symbol table and return its symbol.
pub fn intern(text: &str) -> Symbol {
    // The set only ever grows; a poisoned lock still holds a consistent set.
    let mut set = table().lock().unwrap_or_else(|e| e.into_inner());
    if let Some(existing) = set.get(text) {
        return Symbol(Arc::clone(existing));
    }
    let entry: Arc<str> = Arc::from(text);
    set.insert(Arc::clone(&entry));
    Symbol(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_gives_reference_identity() {
        let a = intern("trade");
        let b = intern(&String::from("trade"));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.as_str(), "trade");
    }

    #[test]
    fn distinct_text_distinct_symbols() {
        let a = intern("bid");
        let b = intern("ask");
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_symbol_is_valid() {
        assert_eq!(intern("").as_str(), "");
    }
}
