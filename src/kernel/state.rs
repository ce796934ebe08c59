//! Keyed reactive state with a single bound observer.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

/// Receives every accepted `set`. Values are owned snapshots taken at the
/// time of the change.
pub trait StateObserver<K, V>: Send {
    fn on_state_changed(&mut self, key: &K, new_value: &V, old_value: &V);
}

impl<K, V, F> StateObserver<K, V> for F
where
    F: FnMut(&K, &V, &V) + Send,
{
    fn on_state_changed(&mut self, key: &K, new_value: &V, old_value: &V) {
        self(key, new_value, old_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    DoubleBind,
    UnknownKey(String),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::DoubleBind => write!(f, "state is already bound to an observer"),
            StateError::UnknownKey(key) => write!(f, "unknown state key: {}", key),
        }
    }
}

impl std::error::Error for StateError {}

pub struct ReactiveState<K, V> {
    values: FxHashMap<K, V>,
    observer: Option<Box<dyn StateObserver<K, V>>>,
}

impl<K, V> ReactiveState<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + PartialEq,
{
    /// The keys of `initial` are the whole schema.
    pub fn new(initial: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: initial.into_iter().collect(),
            observer: None,
        }
    }

    pub fn has(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Stores `value` and notifies the observer, even when the value is
    /// unchanged.
    pub fn set(&mut self, key: K, value: V) -> Result<(), StateError> {
        let slot = self
            .values
            .get_mut(&key)
            .ok_or_else(|| StateError::UnknownKey(format!("{:?}", key)))?;
        let old_value = std::mem::replace(slot, value);
        let new_value = slot.clone();

        if let Some(observer) = self.observer.as_mut() {
            observer.on_state_changed(&key, &new_value, &old_value);
        }
        Ok(())
    }

    /// Like [`set`](Self::set), but equal values are dropped without a
    /// notification. Returns whether the value changed.
    pub fn set_if_changed(&mut self, key: K, value: V) -> Result<bool, StateError> {
        match self.values.get(&key) {
            None => Err(StateError::UnknownKey(format!("{:?}", key))),
            Some(current) if *current == value => Ok(false),
            Some(_) => self.set(key, value).map(|_| true),
        }
    }

    pub fn bind(&mut self, observer: Box<dyn StateObserver<K, V>>) -> Result<(), StateError> {
        if self.observer.is_some() {
            return Err(StateError::DoubleBind);
        }
        self.observer = Some(observer);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.observer.is_some()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ReactiveState<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveState")
            .field("values", &self.values)
            .field("bound", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/state.rs"]
mod tests;
