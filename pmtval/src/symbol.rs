//! Interned symbols.
//!
//! Symbols are the keys of dicts and stream tags, so they are compared far more
//! often than they are created. Every [`Symbol`] is allocated once by the
//! process-wide [`SymbolTable`]; afterwards equality is a pointer comparison.
use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

static GLOBAL_SYMBOLS: Lazy<SymbolTable> = Lazy::new(SymbolTable::new);

/// An interned string.
///
/// Two symbols created from equal strings share the same allocation:
///
/// ```rust
/// # use pmtval::Symbol;
/// let a = Symbol::new("freq");
/// let b = Symbol::new("freq");
/// assert_eq!(a, b);
/// assert!(a.same_handle(&b));
/// ```
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Intern `name` in the process-wide table.
    pub fn new(name: &str) -> Self {
        GLOBAL_SYMBOLS.intern(name)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if both symbols point at the same interned allocation.
    #[inline]
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.same_handle(other)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide string interner backing [`Symbol`].
///
/// # A note on concurrency
/// Lookups of already interned names only take a shared read lock. Interning a
/// new name takes an upgradable read lock, checks again (another thread may
/// have inserted the name in between) and only then upgrades to a write lock.
/// Symbols are never removed.
pub struct SymbolTable {
    symbols: RwLock<HashSet<Arc<str>>>,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            symbols: RwLock::new(HashSet::new()),
        }
    }

    /// The table used by [`Symbol::new`].
    pub fn global() -> &'static SymbolTable {
        &GLOBAL_SYMBOLS
    }

    /// Return the symbol for `name`, inserting it if needed.
    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(existing) = self.symbols.read().get(name) {
            return Symbol(existing.clone());
        }

        let symbols = self.symbols.upgradable_read();
        if let Some(existing) = symbols.get(name) {
            return Symbol(existing.clone());
        }

        let mut symbols = RwLockUpgradableReadGuard::upgrade(symbols);
        let interned: Arc<str> = Arc::from(name);
        symbols.insert(interned.clone());
        debug!(
            "Interned new symbol `{}` ({} symbols)",
            name,
            symbols.len()
        );
        Symbol(interned)
    }

    /// Returns `true` if `name` was interned at some point.
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.read().contains(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_shared_handle() {
        let a = Symbol::new("rx_time");
        let b = SymbolTable::global().intern("rx_time");
        assert!(a.same_handle(&b));
        assert!(SymbolTable::global().contains("rx_time"));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(Symbol::new("rx_freq"), Symbol::new("rx_rate"));
    }

    #[test]
    fn concurrent_interning_converges() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Symbol::new("packet_len")))
            .collect();
        let symbols: Vec<Symbol> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(symbols.windows(2).all(|w| w[0].same_handle(&w[1])));
    }
}
