use std::borrow::Borrow;

/// A single key-value pair stored in a [`Chain`]
#[derive(Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:?}, {:?}>", self.key, self.value)
    }
}

/// What [`Chain::insert`] did with the pair it was given
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome<V> {
    /// The key was new, the chain grew by one
    Inserted,
    /// The key was already present, holds the value that got overwritten
    Updated(V),
}

impl<V> InsertOutcome<V> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }

    /// Returns the overwritten value, if there was any
    pub fn into_old(self) -> Option<V> {
        match self {
            InsertOutcome::Inserted => None,
            InsertOutcome::Updated(old) => Some(old),
        }
    }
}

/// The entries sharing one hash slot
///
/// Keys are unique within a chain. Entries are kept in insertion order,
/// removal does not reorder the ones left behind.
#[derive(Clone, PartialEq, Eq)]
pub struct Chain<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Chain<K, V> {
    /// Creates an empty chain, does not allocate
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Shorthand for `self.len() == 0`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // [adapters]

    /// A fresh cursor over the chain, starting at the front
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Appends without looking for a duplicate key.
    /// Only for moving entries whose keys are already known to be unique.
    pub(crate) fn push_unchecked(&mut self, entry: Entry<K, V>) {
        self.entries.push(entry);
    }
}

impl<K: Eq, V> Chain<K, V> {
    /// Inserts the pair, overwriting the value in place if the key is already
    /// present in the chain
    pub fn insert(&mut self, key: K, value: V) -> InsertOutcome<V> {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(e) => {
                let old = std::mem::replace(&mut e.value, value);
                InsertOutcome::Updated(old)
            }
            None => {
                self.entries.push(Entry { key, value });
                InsertOutcome::Inserted
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.entries
            .iter()
            .find(|e| e.key.borrow() == key)
            .map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.entries
            .iter_mut()
            .find(|e| e.key.borrow() == key)
            .map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes the entry with the given key, returning it
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let pos = self.entries.iter().position(|e| e.key.borrow() == key)?;
        Some(self.entries.remove(pos))
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for Chain<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl<K, V> IntoIterator for Chain<K, V> {
    type Item = Entry<K, V>;
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.entries.into_iter())
    }
}

impl<'a, K, V> IntoIterator for &'a Chain<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// [iterators]

/// Borrowing cursor over a [`Chain`], created fresh by [`Chain::iter`]
#[derive(Clone, Debug)]
pub struct Iter<'a, K, V> {
    inner: std::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Owning iterator, drains the chain front to back
#[derive(Debug)]
pub struct IntoIter<K, V>(std::vec::IntoIter<Entry<K, V>>);

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
