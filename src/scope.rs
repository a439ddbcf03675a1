//! Scope capture for event records.
//!
//! Callers push contextual values around a unit of work with
//! [`HecLogger::begin_scope`](crate::HecLogger::begin_scope); the returned
//! [`ScopeGuard`] pops the value again when dropped. The default provider keeps
//! one stack per thread.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A value pushed onto the scope stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeValue {
    Text(String),
    Fields(BTreeMap<String, String>),
}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Text(text) => f.write_str(text),
            ScopeValue::Fields(fields) => {
                let mut first = true;
                for (key, value) in fields {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{key}:{value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for ScopeValue {
    fn from(value: &str) -> Self {
        ScopeValue::Text(value.to_owned())
    }
}

impl From<String> for ScopeValue {
    fn from(value: String) -> Self {
        ScopeValue::Text(value)
    }
}

impl From<BTreeMap<String, String>> for ScopeValue {
    fn from(fields: BTreeMap<String, String>) -> Self {
        ScopeValue::Fields(fields)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ScopeValue
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        ScopeValue::Fields(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Token returned by [`ScopeProvider::push`]; pops the scope on drop.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl ScopeGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard that does nothing when dropped.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Source of the ambient scope stack.
pub trait ScopeProvider: Send + Sync {
    /// Push `value` and return a guard that removes it again.
    fn push(&self, value: ScopeValue) -> ScopeGuard;

    /// Visit active scopes from outermost to innermost.
    fn for_each_scope(&self, visit: &mut dyn FnMut(&ScopeValue));
}

/// Provider that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScopeProvider;

impl ScopeProvider for NullScopeProvider {
    fn push(&self, _value: ScopeValue) -> ScopeGuard {
        ScopeGuard::noop()
    }

    fn for_each_scope(&self, _visit: &mut dyn FnMut(&ScopeValue)) {}
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type Entries = Vec<(u64, ScopeValue)>;

thread_local! {
    static STACKS: RefCell<HashMap<u64, Entries>> = RefCell::new(HashMap::new());
}

/// Per-thread scope stack. Each provider instance owns an independent stack.
#[derive(Debug)]
pub struct ThreadLocalScopeProvider {
    id: u64,
}

impl ThreadLocalScopeProvider {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for ThreadLocalScopeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeProvider for ThreadLocalScopeProvider {
    fn push(&self, value: ScopeValue) -> ScopeGuard {
        let stack = self.id;
        let token = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        STACKS.with(|stacks| {
            stacks
                .borrow_mut()
                .entry(stack)
                .or_default()
                .push((token, value));
        });
        ScopeGuard::new(move || {
            // Guards may be dropped out of order, so remove by token.
            let _ = STACKS.try_with(|stacks| {
                let mut stacks = stacks.borrow_mut();
                if let Some(entries) = stacks.get_mut(&stack) {
                    entries.retain(|(t, _)| *t != token);
                    if entries.is_empty() {
                        stacks.remove(&stack);
                    }
                }
            });
        })
    }

    fn for_each_scope(&self, visit: &mut dyn FnMut(&ScopeValue)) {
        STACKS.with(|stacks| {
            if let Some(entries) = stacks.borrow().get(&self.id) {
                for (_, value) in entries {
                    visit(value);
                }
            }
        });
    }
}

/// Flatten the active scopes into display strings plus merged key/value
/// fields. Inner scopes overwrite outer keys.
pub fn capture(provider: &dyn ScopeProvider) -> (Vec<String>, BTreeMap<String, String>) {
    let mut scopes = Vec::new();
    let mut fields = BTreeMap::new();
    provider.for_each_scope(&mut |value| {
        scopes.push(value.to_string());
        if let ScopeValue::Fields(map) = value {
            fields.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    });
    (scopes, fields)
}
