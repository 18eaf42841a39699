//! Composable record predicates and helpers to apply them.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// A compiled boolean test over `T`. Cheap to clone and shareable across threads.
pub struct Predicate<T: ?Sized>(Arc<dyn Fn(&T) -> bool + Send + Sync>);

impl<T: ?Sized> Predicate<T> {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn test(&self, candidate: &T) -> bool {
        (self.0)(candidate)
    }

    /// Both `self` and `other` must hold.
    #[must_use]
    pub fn and(self, other: Predicate<T>) -> Self
    where
        T: 'static,
    {
        Self::new(move |candidate: &T| self.test(candidate) && other.test(candidate))
    }

    /// Conjunction of all predicates, `None` when there are none.
    #[must_use]
    pub fn all<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate<T>>,
        T: 'static,
    {
        predicates.into_iter().reduce(Predicate::and)
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Keep the candidates `compiled` accepts, in their original order.
/// With no predicate every candidate is returned.
#[must_use]
pub fn apply_filters<T, I>(candidates: I, compiled: Option<&Predicate<T>>) -> Vec<I::Item>
where
    T: ?Sized,
    I: IntoIterator,
    I::Item: Borrow<T>,
{
    match compiled {
        None => candidates.into_iter().collect(),
        Some(predicate) => candidates
            .into_iter()
            .filter(|c| predicate.test(<I::Item as Borrow<T>>::borrow(c)))
            .collect(),
    }
}

/// Lazy counterpart of [`apply_filters`].
pub trait ApplyFilterExt: Iterator + Sized {
    fn apply_filter<T>(self, compiled: Option<Predicate<T>>) -> FilterIter<Self, T>
    where
        T: ?Sized,
        Self::Item: Borrow<T>,
    {
        FilterIter {
            inner: self,
            predicate: compiled,
        }
    }
}

impl<I: Iterator> ApplyFilterExt for I {}

pub struct FilterIter<I, T: ?Sized> {
    inner: I,
    predicate: Option<Predicate<T>>,
}

impl<I, T> Iterator for FilterIter<I, T>
where
    T: ?Sized,
    I: Iterator,
    I::Item: Borrow<T>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(predicate) = &self.predicate else {
            return self.inner.next();
        };
        self.inner
            .find(|c| predicate.test(<I::Item as Borrow<T>>::borrow(c)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.predicate {
            None => self.inner.size_hint(),
            Some(_) => (0, self.inner.size_hint().1),
        }
    }
}
