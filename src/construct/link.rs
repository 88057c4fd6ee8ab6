use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// Represents an ordered set of elements with O(1) membership checking.
/// Note that this is insert-only.
#[derive(Clone, PartialEq)]
pub struct VecSet<T: Eq + Hash + Clone> {
    order: Vec<T>,
    members: HashMap<T, usize>,
}

impl<T> Debug for VecSet<T>
where
    T: Eq + Hash + Clone + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.order)
    }
}

impl<T: Eq + Hash + Clone> Default for VecSet<T> {
    fn default() -> Self {
        VecSet {
            order: vec![],
            members: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> VecSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a member onto the set, unless it is already present.
    pub fn push(&mut self, item: T) {
        if !self.contains(&item) {
            self.members.insert(item.clone(), self.order.len());
            self.order.push(item);
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains_key(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.members.get(item).copied()
    }

    pub fn items(&self) -> &[T] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The names a run's missions are bound to in the merged scope.
/// The dispatcher's imports are linked against this table:
/// an import whose module path ends in a known mission name
/// becomes a plain binding to that mission's namespace.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    missions: VecSet<String>,
}

impl LinkTable {
    pub fn new<I, S>(missions: I) -> LinkTable
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = LinkTable::default();
        for mission in missions {
            table.missions.push(mission.into());
        }
        table
    }

    /// Tries each known mission, in binding order, against the
    /// last component of a dotted module path.
    pub fn resolve(&self, path: &[&str]) -> Option<&str> {
        let last = path.last()?;
        self.missions
            .items()
            .iter()
            .find(|mission| mission.as_str() == *last)
            .map(|m| m.as_str())
    }

    pub fn missions(&self) -> &[String] {
        self.missions.items()
    }
}
