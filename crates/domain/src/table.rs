//! Tables and the change notifications live queries react to.

use std::fmt;

/// A persisted table whose rows a query may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Player,
    Team,
}

impl Table {
    const fn bit(self) -> u8 {
        match self {
            Self::Player => 0b01,
            Self::Team => 0b10,
        }
    }

    /// Name of the table in the persisted schema.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A small set of [`Table`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TableSet(u8);

impl TableSet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding exactly `table`.
    #[must_use]
    pub const fn single(table: Table) -> Self {
        Self(table.bit())
    }

    /// Return a copy of this set with `table` added.
    #[must_use]
    pub const fn with(self, table: Table) -> Self {
        Self(self.0 | table.bit())
    }

    /// Add `table` to the set.
    pub fn insert(&mut self, table: Table) {
        self.0 |= table.bit();
    }

    #[must_use]
    pub const fn contains(self, table: Table) -> bool {
        self.0 & table.bit() != 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Table> for TableSet {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Published after a write transaction commits, naming the tables whose rows
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChange {
    pub tables: TableSet,
}

impl TableChange {
    #[must_use]
    pub const fn new(tables: TableSet) -> Self {
        Self { tables }
    }

    /// Whether a query depending on `observed` must re-fetch.
    #[must_use]
    pub const fn affects(&self, observed: TableSet) -> bool {
        self.tables.intersects(observed)
    }
}
