#![warn(missing_docs)]
#![doc(test(no_crate_inject))]
#![doc(test(attr(deny(unused, future_incompatible))))]

//! This crate provides an algebra over sparse, discrete probability and frequency tables.
//!
//! A [`Table`] maps composite keys, one value per named column, to non-negative weights. The
//! weights may be raw counts or probabilities. A [`MultiTable`] is a family of tables indexed by
//! the values of some conditioning columns, which is how a conditional distribution like
//! `P(X, Y | Z)` is represented.
//!
//! The operations mirror relational algebra:
//!
//! - [`Table::marginal`] sums columns away (group-by-sum),
//! - [`Table::condition_on`] partitions a table into a [`MultiTable`],
//! - [`Table::reduce`] fixes some columns to given values and drops them,
//! - [`Factor::product`] joins two tables, multiplying weights of rows whose shared columns agree,
//! - [`Table::add`] sums weights key by key, and
//! - [`Table::normalise`] rescales weights so they sum to one.
//!
//! ```
//! use contingency::{Factor, Table};
//! # fn main() -> contingency::Result<()> {
//! let joint = Table::with_names(
//!     vec![(("a", "x"), 4.0), (("a", "y"), 4.0), (("b", "x"), 6.0), (("b", "y"), 6.0)],
//!     vec!["A", "B"],
//! )?;
//!
//! let p_b = joint.marginal(&["A"], true)?;
//! assert_eq!(p_b.get("x"), 0.5);
//!
//! // P(A | B) * P(B) rebuilds the joint distribution P(A, B).
//! let p_a_given_b = joint.condition_on(&["B"], true)?;
//! let rebuilt = Factor::from(p_a_given_b).product(&Factor::from(p_b))?;
//! let rebuilt = rebuilt.into_flat().expect("conditioning columns were fully absorbed");
//! assert_eq!(rebuilt.names(), ["A", "B"]);
//! assert!((rebuilt.get(("b", "y")) - 0.3).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! Looking up a key which was never observed yields a weight of zero rather than an error.

mod estimate;
mod frequency;
mod multi;
mod table;

pub use estimate::{Binomial, Multinomial};
pub use frequency::FrequencyTable;
pub use multi::{Factor, MultiTable};
pub use table::Table;

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;
use std::sync::Arc;

/// A single column's value within a [`Key`].
///
/// Values of different variants never compare equal, so `Int(1)` and `Float(1.0)` are distinct
/// levels. Floats compare by their IEEE total order, which makes every value usable as a hash
/// key.
#[derive(Clone)]
pub enum Value {
    /// A boolean level.
    Bool(bool),
    /// An integer level.
    Int(i64),
    /// A floating-point level.
    Float(f64),
    /// A string level.
    Str(Arc<str>),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
        }
    }

    /// The name of this value's primitive type.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
        }
    }

    /// Interprets a text field as an integer, then a float, then a boolean, and otherwise keeps
    /// it as a string.
    ///
    /// ```
    /// use contingency::Value;
    ///
    /// assert_eq!(Value::parse("12"), Value::Int(12));
    /// assert_eq!(Value::parse("1.5"), Value::Float(1.5));
    /// assert_eq!(Value::parse("true"), Value::Bool(true));
    /// assert_eq!(Value::parse("high"), Value::from("high"));
    /// ```
    pub fn parse(field: &str) -> Value {
        if let Ok(i) = field.parse() {
            Value::Int(i)
        } else if let Ok(f) = field.parse() {
            Value::Float(f)
        } else if let Ok(b) = field.parse() {
            Value::Bool(b)
        } else {
            Value::from(field)
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => fmt::Debug::fmt(b, f),
            Value::Int(i) => fmt::Debug::fmt(i, f),
            Value::Float(x) => fmt::Debug::fmt(x, f),
            Value::Str(s) => fmt::Debug::fmt(&**s, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::Int(i) => fmt::Display::fmt(i, f),
            Value::Float(x) => fmt::Display::fmt(x, f),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

/// A composite key: one [`Value`] per column of a table.
///
/// Keys with up to four columns are stored inline without a heap allocation.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Key(SmallVec<[Value; 4]>);

impl Key {
    /// Creates a key from the given column values, in column order.
    pub fn new<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Key(values.into_iter().collect())
    }

    /// The number of columns in this key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the zero-column key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the column values.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// The column values as a slice.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Returns the value of one column, if the key is that wide.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns a new key made of the values at `indices`, in that order.
    ///
    /// ```
    /// use contingency::{IntoKey, Key};
    ///
    /// let key = ("a", "x", 1).into_key();
    /// assert_eq!(key.project(&[2, 0]), (1, "a").into_key());
    /// assert_eq!(key.project(&[]), Key::default());
    /// ```
    pub fn project(&self, indices: &[usize]) -> Key {
        Key(indices.iter().map(|&i| self.0[i].clone()).collect())
    }

    /// Returns a new key holding this key's values followed by `other`'s.
    pub fn concat(&self, other: &Key) -> Key {
        let mut values = SmallVec::with_capacity(self.len() + other.len());
        values.extend(self.0.iter().cloned());
        values.extend(other.0.iter().cloned());
        Key(values)
    }
}

impl std::ops::Index<usize> for Key {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("");
        for value in self.0.iter() {
            tuple.field(value);
        }
        tuple.finish()
    }
}

impl iter::FromIterator<Value> for Key {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Key(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Key {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Conversion into a [`Key`].
///
/// A single atomic value (string, number, boolean, or [`Value`]) becomes a one-column key, while
/// tuples, arrays, slices and vectors are flattened into one column per element. The same rule
/// applies everywhere, so single-column and multi-column tables share one key representation.
///
/// ```
/// use contingency::{IntoKey, Value};
///
/// assert_eq!("abc".into_key().len(), 1);
/// assert_eq!(7i64.into_key().as_slice(), [Value::Int(7)]);
/// assert_eq!(("a", 1, true).into_key().len(), 3);
/// assert_eq!(vec!["a", "b"].into_key(), ("a", "b").into_key());
/// assert_eq!(["a"].into_key(), "a".into_key());
/// ```
pub trait IntoKey {
    /// Performs the conversion.
    fn into_key(self) -> Key;
}

impl IntoKey for Key {
    fn into_key(self) -> Key {
        self
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Key {
        self.clone()
    }
}

macro_rules! scalar_key {
    ($($t:ty),*) => {
        $(
            impl IntoKey for $t {
                fn into_key(self) -> Key {
                    Key(smallvec::smallvec![Value::from(self)])
                }
            }
        )*
    };
}

scalar_key![Value, bool, i64, i32, u32, f64, &str, String];

impl<T: Into<Value>> IntoKey for Vec<T> {
    fn into_key(self) -> Key {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Value>, const N: usize> IntoKey for [T; N] {
    fn into_key(self) -> Key {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Value> + Clone> IntoKey for &[T] {
    fn into_key(self) -> Key {
        self.iter().cloned().map(Into::into).collect()
    }
}

macro_rules! tuple_key {
    ($(($($t:ident $v:ident),+))*) => {
        $(
            impl<$($t: Into<Value>),+> IntoKey for ($($t,)+) {
                fn into_key(self) -> Key {
                    let ($($v,)+) = self;
                    Key(smallvec::smallvec![$($v.into()),+])
                }
            }
        )*
    };
}

tuple_key! {
    (A a)
    (A a, B b)
    (A a, B b, C c)
    (A a, B b, C c, D d)
    (A a, B b, C c, D d, E e)
    (A a, B b, C c, D d, E e, F f)
    (A a, B b, C c, D d, E e, F f, G g)
    (A a, B b, C c, D d, E e, F f, G g, H h)
}

/// The ordered column names of a table, with name to position lookup.
///
/// For a [`MultiTable`], the columns name the conditioning variables and [`Columns::children`]
/// names the columns of every nested table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Columns {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    children: Vec<String>,
}

/// The result of [`Columns::split`]: the selected columns and their complement, both in column
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    /// Positions of the selected columns.
    pub indices: Vec<usize>,
    /// Names of the selected columns.
    pub names: Vec<String>,
    /// Positions of every column which was not selected.
    pub complement_indices: Vec<usize>,
    /// Names of every column which was not selected.
    pub complement_names: Vec<String>,
}

impl Columns {
    /// Creates a column set with the given names, which must be unique.
    ///
    /// ```
    /// use contingency::{Columns, Error};
    ///
    /// let columns = Columns::new(vec!["Age", "Sex"])?;
    /// assert_eq!(columns.index_of("Sex"), Some(1));
    /// assert_eq!(columns.index_of("Edu"), None);
    ///
    /// assert_eq!(
    ///     Columns::new(vec!["Age", "Age"]),
    ///     Err(Error::DuplicateColumn("Age".to_string()))
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        Ok(Columns {
            names,
            positions,
            children: Vec::new(),
        })
    }

    /// Creates the column set `X1..Xn`.
    pub fn synthesized(count: usize) -> Self {
        Columns::trusted((1..=count).map(|i| format!("X{}", i)).collect())
    }

    /// Builds a column set from names already known to be unique.
    pub(crate) fn trusted(names: Vec<String>) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Columns {
            names,
            positions,
            children: Vec::new(),
        }
    }

    /// Attaches the schema of nested tables to this column set.
    ///
    /// Child names must be unique and must not reuse any of this set's names.
    pub fn with_children<I, S>(mut self, children: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let children: Vec<String> = children.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(children.len());
        for name in children.iter() {
            if self.contains(name) || !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        self.children = children;
        Ok(self)
    }

    /// The number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The column names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The column names of nested tables, or an empty slice for a flat table.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Returns `true` if this column set describes a table of tables.
    pub fn is_nested(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns the position of the named column, or `None` if it is not defined.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns `true` if the named column is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Returns `true` if the name belongs to the nested tables' schema.
    pub fn contains_child(&self, name: &str) -> bool {
        self.children.iter().any(|child| child == name)
    }

    /// A flat column set for the nested tables.
    pub(crate) fn child_columns(&self) -> Columns {
        Columns::trusted(self.children.clone())
    }

    /// Returns the names at the given positions.
    pub(crate) fn select(&self, indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| self.names[i].clone()).collect()
    }

    /// Builds a key from a mix of positional and named values.
    ///
    /// Every named value is placed in its column's slot first. The remaining slots are then
    /// filled from left to right with the positional values, in order. So callers may name any
    /// subset of the columns and supply the rest positionally.
    ///
    /// ```
    /// use contingency::{Columns, IntoKey, Value};
    ///
    /// let columns = Columns::new(vec!["X1", "X2", "X3"])?;
    /// let key = columns.to_key(&[Value::from("a"), Value::from(33)], &[("X2", Value::from("y"))])?;
    /// assert_eq!(key, ("a", "y", 33).into_key());
    ///
    /// assert!(columns.to_key(&[Value::from("a")], &[]).is_err());
    /// assert!(columns.to_key(&[Value::from("a"), Value::from(1)], &[("X9", Value::from(2))]).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn to_key(&self, positional: &[Value], named: &[(&str, Value)]) -> Result<Key> {
        let got = positional.len() + named.len();
        if got != self.len() {
            return Err(Error::Arity {
                expected: self.len(),
                got,
            });
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.len()];
        for (name, value) in named {
            let index = self
                .index_of(name)
                .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
            if slots[index].replace(value.clone()).is_some() {
                return Err(Error::DuplicateColumn(name.to_string()));
            }
        }

        let mut positional = positional.iter();
        slots
            .into_iter()
            .map(|slot| slot.or_else(|| positional.next().cloned()))
            .collect::<Option<Key>>()
            .ok_or(Error::Arity {
                expected: self.len(),
                got,
            })
    }

    /// Pairs every column name with the corresponding value of `key`.
    pub fn named_key<'a>(&'a self, key: &'a Key) -> Vec<(&'a str, &'a Value)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(key.iter())
            .collect()
    }

    /// Splits the columns into the named ones and the rest, both kept in column order.
    ///
    /// Fails if any name is not defined. The selected names may be given in any order.
    ///
    /// ```
    /// use contingency::Columns;
    ///
    /// let columns = Columns::new(vec!["X1", "X2", "X3", "X4"])?;
    /// let split = columns.split(&["X3", "X1"])?;
    /// assert_eq!(split.indices, [0, 2]);
    /// assert_eq!(split.names, ["X1", "X3"]);
    /// assert_eq!(split.complement_indices, [1, 3]);
    /// assert_eq!(split.complement_names, ["X2", "X4"]);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn split(&self, by: &[&str]) -> Result<Split> {
        let mut selected = vec![false; self.len()];
        for name in by {
            let index = self
                .index_of(name)
                .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
            selected[index] = true;
        }

        let (indices, complement_indices): (Vec<usize>, Vec<usize>) =
            (0..self.len()).partition(|&i| selected[i]);
        Ok(Split {
            names: self.select(&indices),
            complement_names: self.select(&complement_indices),
            indices,
            complement_indices,
        })
    }
}

/// The broad classes of [`Error`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A key or a list of names has the wrong number of columns.
    Arity,
    /// Column names don't fit the requested operation.
    Schema,
    /// Values of different primitive types were mixed within a column.
    Type,
    /// The input data itself is unusable.
    Value,
}

/// Errors reported by table operations.
///
/// Every error is fatal to the call that raised it; no operation returns a partial result.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A key has a different number of values than the table has columns.
    #[error("expected a key with {expected} values, got {got}")]
    Arity {
        /// The table's column count.
        expected: usize,
        /// The length of the offending key.
        got: usize,
    },

    /// The number of supplied names doesn't match the number of columns.
    #[error("expected {expected} column names, got {got}")]
    NameCount {
        /// The table's column count.
        expected: usize,
        /// The number of names supplied.
        got: usize,
    },

    /// A column name was referenced which the table doesn't define.
    #[error("column name {0:?} is not defined")]
    UnknownColumn(String),

    /// A column name appears twice.
    #[error("column name {0:?} is used more than once")]
    DuplicateColumn(String),

    /// The operation would leave the table without any columns.
    #[error("cannot {operation} on all columns")]
    AllColumns {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The operation needs at least one column name.
    #[error("cannot {operation} on zero columns")]
    NoColumns {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The operation needs a table with more than one column.
    #[error("cannot {operation} a single-column table")]
    SingleColumn {
        /// The rejected operation.
        operation: &'static str,
    },

    /// A conditioning column of a [`MultiTable`] was used where only child columns may be.
    #[error("column {0:?} is a conditioning column")]
    ConditionedColumn(String),

    /// A selection on a [`MultiTable`] named both conditioning and child columns.
    #[error("cannot select on conditioning and child columns at the same time")]
    MixedSelection,

    /// Two tables were combined whose columns differ in names or order.
    #[error("column names {left:?} and {right:?} do not match")]
    NameMismatch {
        /// Columns of the left-hand table.
        left: Vec<String>,
        /// Columns of the right-hand table.
        right: Vec<String>,
    },

    /// The nested tables of a [`MultiTable`] don't share one schema.
    #[error("nested table has columns {found:?}, expected {expected:?}")]
    ChildSchema {
        /// The schema of the first nested table.
        expected: Vec<String>,
        /// The schema that differed.
        found: Vec<String>,
    },

    /// The columns of two tables don't fit any supported product.
    #[error("cannot multiply tables: {0}")]
    Topology(String),

    /// A column holds values of more than one primitive type.
    #[error("column {column:?} holds {expected} values but also {found}")]
    MixedTypes {
        /// The offending column.
        column: String,
        /// The type of the column's first value.
        expected: &'static str,
        /// The type that disagreed.
        found: &'static str,
    },

    /// A table was requested from no samples at all.
    #[error("cannot build a table from empty samples")]
    Empty,

    /// A weight was negative, infinite or NaN.
    #[error("weight {0} is not a finite non-negative number")]
    InvalidWeight(f64),

    /// A distribution needs a different number of levels than the data has.
    #[error("expected {expected} levels, got {got}")]
    LevelCount {
        /// The number of levels required.
        expected: usize,
        /// The number of levels present.
        got: usize,
    },

    /// A level was requested which was never observed.
    #[error("level {0:?} was not observed")]
    UnknownLevel(Value),

    /// Prior parameters were rejected.
    #[error("invalid prior: {0}")]
    Prior(String),

    /// A logarithm base was not a finite number greater than zero and other than one.
    #[error("{0} is not a usable logarithm base")]
    LogBase(f64),
}

impl Error {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Arity { .. } | Error::NameCount { .. } => ErrorKind::Arity,
            Error::UnknownColumn(_)
            | Error::DuplicateColumn(_)
            | Error::AllColumns { .. }
            | Error::NoColumns { .. }
            | Error::SingleColumn { .. }
            | Error::ConditionedColumn(_)
            | Error::MixedSelection
            | Error::NameMismatch { .. }
            | Error::ChildSchema { .. }
            | Error::Topology(_) => ErrorKind::Schema,
            Error::MixedTypes { .. } => ErrorKind::Type,
            Error::Empty
            | Error::InvalidWeight(_)
            | Error::LevelCount { .. }
            | Error::UnknownLevel(_)
            | Error::Prior(_)
            | Error::LogBase(_) => ErrorKind::Value,
        }
    }
}

/// Result type for table operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Summary statistics for a single [`Table`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct Summary {
    /// The [Shannon entropy][] of the table, measured in bits. This is normalized to produce the
    /// same result whether the table contains probabilities or frequencies.
    ///
    /// [Shannon entropy]: https://en.wikipedia.org/wiki/Entropy_(information_theory)
    pub uncertainty: f64,

    /// The total weight across all cells in the table. If this table contains probabilities, the
    /// `sample_size` should be approximately 1.0.
    pub sample_size: f64,
}

impl iter::FromIterator<f64> for Summary {
    /// Creates a summary for a table whose cells are provided by the given iterator.
    ///
    /// Zero cells contribute nothing, and a table with at most one non-zero cell is
    /// deterministic, with exactly zero uncertainty.
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = Summary {
            uncertainty: 0.0,
            sample_size: 0.0,
        };
        let mut nonzero = 0;
        for count in iter {
            if count > 0.0 {
                summary.uncertainty -= count * count.log2();
                summary.sample_size += count;
                nonzero += 1;
            }
        }
        if nonzero > 1 {
            summary.uncertainty /= summary.sample_size;
            summary.uncertainty += summary.sample_size.log2();
        } else {
            summary.uncertainty = 0.0;
        }
        summary
    }
}

/// Checks that a weight can be stored in a table.
pub(crate) fn check_weight(weight: f64) -> Result<f64> {
    if weight >= 0.0 && weight.is_finite() {
        Ok(weight)
    } else {
        Err(Error::InvalidWeight(weight))
    }
}
