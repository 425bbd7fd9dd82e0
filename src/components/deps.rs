use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A prop compared by reference identity, never by value.
///
/// Cloning keeps the identity; building a new `PropRef` from an equal value
/// does not.
pub struct PropRef<T: ?Sized>(Rc<T>);

impl<T> PropRef<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl<T: ?Sized> PropRef<T> {
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn as_rc(&self) -> &Rc<T> {
        &self.0
    }
}

impl<T: ?Sized> Clone for PropRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for PropRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Deref for PropRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Rc<T>> for PropRef<T> {
    fn from(rc: Rc<T>) -> Self {
        Self(rc)
    }
}

impl<T: Default> Default for PropRef<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for PropRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropRef").field(&&*self.0).finish()
    }
}

/// Dependency list of one effect.
#[derive(Debug, Clone)]
pub struct EffectDeps<K> {
    last: Option<K>,
}

impl<K: PartialEq> EffectDeps<K> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Stores `deps` and reports whether the effect has to run: always on
    /// the first call and after [`reset`](Self::reset), then only when the
    /// dependencies differ from the stored ones.
    pub fn changed(&mut self, deps: K) -> bool {
        if self.last.as_ref() == Some(&deps) {
            return false;
        }
        self.last = Some(deps);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn current(&self) -> Option<&K> {
        self.last.as_ref()
    }
}

impl<K: PartialEq> Default for EffectDeps<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_ref_identity() {
        let a = PropRef::new(vec![1, 2]);
        let b = PropRef::new(vec![1, 2]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_effect_deps() {
        let mut deps = EffectDeps::new();
        assert!(deps.changed(1));
        assert!(!deps.changed(1));
        assert!(deps.changed(2));
        deps.reset();
        assert!(deps.changed(2));
        assert_eq!(deps.current(), Some(&2));
    }
}
