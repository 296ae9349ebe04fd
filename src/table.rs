use crate::{check_weight, Columns, Error, IntoKey, Key, MultiTable, Result, Summary, Value};
use sorted_iter::assume::AssumeSortedByKeyExt;
use sorted_iter::SortedPairIterator;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Mul;
use tracing::debug;

/// A sparse table of non-negative weights indexed by composite keys.
///
/// Weights are either frequencies (counts) or probabilities. Every key has exactly one value per
/// column, and keys which were never observed have weight zero.
#[derive(Clone, PartialEq)]
pub struct Table {
    pub(crate) columns: Columns,
    pub(crate) cells: HashMap<Key, f64>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ", self.columns.names())?;
        f.debug_map().entries(self.sorted()).finish()
    }
}

/// Collects keyed rows into cells, summing duplicate keys, and returns the common arity.
fn collect_rows<I, K>(rows: I) -> Result<(usize, HashMap<Key, f64>)>
where
    I: IntoIterator<Item = (K, f64)>,
    K: IntoKey,
{
    let rows = rows.into_iter();
    let mut cells = HashMap::with_capacity(rows.size_hint().0);
    let mut arity = None;
    for (key, weight) in rows {
        let key = key.into_key();
        let weight = check_weight(weight)?;
        let expected = *arity.get_or_insert(key.len());
        if key.len() != expected {
            return Err(Error::Arity {
                expected,
                got: key.len(),
            });
        }
        *cells.entry(key).or_insert(0.0) += weight;
    }
    match arity {
        None => Err(Error::Empty),
        Some(0) => Err(Error::NoColumns {
            operation: "build a table",
        }),
        Some(arity) => Ok((arity, cells)),
    }
}

/// Resolves `NAME=VALUE` pairs to column positions, rejecting unknown and repeated names.
pub(crate) fn resolve_selection(
    columns: &Columns,
    fixed: &[(&str, Value)],
) -> Result<Vec<(usize, Value)>> {
    let mut selection: Vec<(usize, Value)> = Vec::with_capacity(fixed.len());
    for (name, value) in fixed {
        let index = columns
            .index_of(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        if selection.iter().any(|&(i, _)| i == index) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        selection.push((index, value.clone()));
    }
    Ok(selection)
}

pub(crate) fn selects(key: &Key, selection: &[(usize, Value)]) -> bool {
    selection.iter().all(|(i, value)| key[*i] == *value)
}

impl Table {
    /// Creates a table from `(key, weight)` rows, naming the columns `X1..Xn`.
    ///
    /// The number of columns is taken from the first row, and every other row must agree. Rows
    /// with the same key are summed.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::new(vec![(("a", "x"), 4.0), (("a", "y"), 4.0), (("a", "x"), 1.0)])?;
    /// assert_eq!(table.names(), ["X1", "X2"]);
    /// assert_eq!(table.get(("a", "x")), 5.0);
    /// assert_eq!(table.get(("b", "x")), 0.0);
    ///
    /// assert!(Table::new(vec![(vec!["a"], 1.0), (vec!["a", "b"], 1.0)]).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn new<I, K>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: IntoKey,
    {
        let (arity, cells) = collect_rows(rows)?;
        Ok(Table {
            columns: Columns::synthesized(arity),
            cells,
        })
    }

    /// Creates a table from `(key, weight)` rows with the given column names.
    pub fn with_names<I, K, N, S>(rows: I, names: N) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: IntoKey,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (arity, cells) = collect_rows(rows)?;
        let columns = Columns::new(names)?;
        if columns.len() != arity {
            return Err(Error::NameCount {
                expected: arity,
                got: columns.len(),
            });
        }
        Ok(Table { columns, cells })
    }

    /// Creates a frequency table by counting repeated samples.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::from_samples(vec![(1, "a"), (1, "b"), (1, "a")])?;
    /// assert_eq!(table.get((1, "a")), 2.0);
    /// assert_eq!(table.total(), 3.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn from_samples<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoKey,
    {
        Table::new(samples.into_iter().map(|sample| (sample, 1.0)))
    }

    /// Creates a frequency table by counting repeated samples, with the given column names.
    pub fn from_samples_with_names<I, N, S>(samples: I, names: N) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoKey,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table::with_names(samples.into_iter().map(|sample| (sample, 1.0)), names)
    }

    /// Creates a table with the given columns and no rows.
    pub fn empty(columns: Columns) -> Self {
        Table {
            columns,
            cells: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(columns: Columns, cells: HashMap<Key, f64>) -> Self {
        Table { columns, cells }
    }

    /// The columns of this table.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// The column names of this table, in key order.
    pub fn names(&self) -> &[String] {
        self.columns.names()
    }

    /// The number of columns in every key.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// The number of stored keys.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns an iterator over the stored keys and weights, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, f64)> + '_ {
        self.cells.iter().map(|(key, &weight)| (key, weight))
    }

    /// Returns the stored keys and weights sorted by key.
    pub fn sorted(&self) -> Vec<(&Key, f64)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_unstable_by(|a, b| a.0.cmp(b.0));
        cells
    }

    /// Returns the weight stored for a key, or zero if the key was never observed.
    pub fn get(&self, key: impl IntoKey) -> f64 {
        self.cells.get(&key.into_key()).copied().unwrap_or(0.0)
    }

    /// Returns `true` if the key was observed.
    pub fn contains(&self, key: impl IntoKey) -> bool {
        self.cells.contains_key(&key.into_key())
    }

    /// Returns the weight for a key given as a mix of positional and named values, as described
    /// in [`Columns::to_key`].
    ///
    /// ```
    /// use contingency::{Table, Value};
    ///
    /// let table = Table::with_names(vec![(("a", "x", 1), 3.0)], vec!["A", "B", "C"])?;
    /// let weight = table.get_by(&[Value::from("a"), Value::from(1)], &[("B", Value::from("x"))])?;
    /// assert_eq!(weight, 3.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn get_by(&self, positional: &[Value], named: &[(&str, Value)]) -> Result<f64> {
        Ok(self.get(self.columns.to_key(positional, named)?))
    }

    /// Pairs each column name with the corresponding value of `key`.
    pub fn named_key<'a>(&'a self, key: &'a Key) -> Vec<(&'a str, &'a Value)> {
        self.columns.named_key(key)
    }

    /// The sum of all weights.
    pub fn total(&self) -> f64 {
        self.cells.values().sum()
    }

    /// The weight of a key divided by the table's total, or zero if the total is zero.
    pub fn probability(&self, key: impl IntoKey) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.get(key) / total
        } else {
            0.0
        }
    }

    /// The weight of a key, optionally divided by the table's total.
    pub fn frequency(&self, key: impl IntoKey, normalised: bool) -> f64 {
        if normalised {
            self.probability(key)
        } else {
            self.get(key)
        }
    }

    /// All keys with their weights, optionally normalised, sorted by key.
    pub fn frequencies(&self, normalised: bool) -> Vec<(Key, f64)> {
        let total = self.total();
        let divisor = if normalised && total > 0.0 { total } else { 1.0 };
        self.sorted()
            .into_iter()
            .map(|(key, weight)| (key.clone(), weight / divisor))
            .collect()
    }

    /// The distinct values observed in one column.
    ///
    /// ```
    /// use contingency::{Table, Value};
    ///
    /// let table = Table::from_samples(vec![("a", 1), ("b", 1), ("a", 2)])?;
    /// let levels: Vec<Value> = table.levels("X1")?.into_iter().collect();
    /// assert_eq!(levels, [Value::from("a"), Value::from("b")]);
    /// assert!(table.levels("X3").is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn levels(&self, name: &str) -> Result<BTreeSet<Value>> {
        let index = self
            .columns
            .index_of(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        Ok(self.cells.keys().map(|key| key[index].clone()).collect())
    }

    /// Compute a [`Summary`] over the current contents of this table.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::from_samples(vec![1, 1, 2, 2, 1, 1, 2, 2])?;
    /// assert_eq!(table.summary().uncertainty, 1.0);
    /// assert_eq!(table.summary().sample_size, 8.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn summary(&self) -> Summary {
        self.cells.values().copied().collect()
    }

    /// The Shannon entropy of the normalised weights, using the given logarithm base.
    ///
    /// The base must be finite, positive and other than one.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::from_samples(vec!["a", "b", "c", "d"])?;
    /// assert_eq!(table.entropy(4.0)?, 1.0);
    /// assert!(table.entropy(1.0).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn entropy(&self, base: f64) -> Result<f64> {
        let bits = base.log2();
        if !(bits.is_finite() && bits != 0.0) {
            return Err(Error::LogBase(base));
        }
        Ok(self.summary().uncertainty / bits)
    }

    /// Verifies that every key has one value per column and that each column holds values of a
    /// single primitive type.
    ///
    /// ```
    /// use contingency::{ErrorKind, Key, Table, Value};
    ///
    /// let table = Table::new(vec![
    ///     (Key::new(vec![Value::from("a")]), 1.0),
    ///     (Key::new(vec![Value::from(2)]), 1.0),
    /// ])?;
    /// assert_eq!(table.check_consistency().unwrap_err().kind(), ErrorKind::Type);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn check_consistency(&self) -> Result<()> {
        let mut kinds: Vec<Option<&'static str>> = vec![None; self.arity()];
        for (key, weight) in self.sorted() {
            if key.len() != self.arity() {
                return Err(Error::Arity {
                    expected: self.arity(),
                    got: key.len(),
                });
            }
            check_weight(weight)?;
            for (i, value) in key.iter().enumerate() {
                let expected = *kinds[i].get_or_insert(value.kind());
                if value.kind() != expected {
                    return Err(Error::MixedTypes {
                        column: self.names()[i].clone(),
                        expected,
                        found: value.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Shrinks the capacity of the table as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.cells.shrink_to_fit();
    }

    /// Sums weights of keys which agree on the columns at `keep`.
    fn project(&self, keep: &[usize], columns: Columns) -> Table {
        // Don't preallocate more than the source holds: projections only ever shrink.
        let mut cells = HashMap::with_capacity(self.cells.len());
        for (key, weight) in self.cells.iter() {
            *cells.entry(key.project(keep)).or_insert(0.0) += weight;
        }
        Table { columns, cells }
    }

    /// Sums the named columns away, leaving a table over the remaining columns.
    ///
    /// Marginalising over no columns returns a copy, normalised if requested. Naming every column
    /// or any undefined column is an error.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::new(vec![
    ///     (("a", "x"), 4.0),
    ///     (("a", "y"), 4.0),
    ///     (("b", "x"), 6.0),
    ///     (("b", "y"), 6.0),
    /// ])?;
    ///
    /// let counts = table.marginal(&["X1"], false)?;
    /// assert_eq!(counts.names(), ["X2"]);
    /// assert_eq!(counts.get("x"), 10.0);
    ///
    /// let probabilities = table.marginal(&["X1"], true)?;
    /// assert_eq!(probabilities.get("y"), 0.5);
    ///
    /// assert!(table.marginal(&["X1", "X2"], true).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn marginal(&self, names: &[&str], normalise: bool) -> Result<Table> {
        let split = self.columns.split(names)?;
        if split.complement_indices.is_empty() {
            return Err(Error::AllColumns {
                operation: "marginalise",
            });
        }

        let mut table = if split.indices.is_empty() {
            self.clone()
        } else {
            debug!(drop = ?split.names, keep = ?split.complement_names, "marginal");
            self.project(
                &split.complement_indices,
                Columns::trusted(split.complement_names),
            )
        };
        if normalise {
            table.normalise();
        }
        Ok(table)
    }

    /// Partitions this table by the values of the named columns.
    ///
    /// Each partition is a table over the remaining columns. With `normalise`, every partition
    /// is divided by its own total so it holds the conditional distribution given its key.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::with_names(
    ///     vec![(("a", "x"), 1.0), (("b", "x"), 3.0), (("a", "y"), 2.0)],
    ///     vec!["A", "B"],
    /// )?;
    ///
    /// let given_b = table.condition_on(&["B"], true)?;
    /// assert_eq!(given_b.names(), ["B"]);
    /// assert_eq!(given_b.children(), ["A"]);
    /// assert_eq!(given_b.probability("a", "x"), 0.25);
    /// assert_eq!(given_b.probability("a", "y"), 1.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn condition_on(&self, names: &[&str], normalise: bool) -> Result<MultiTable> {
        if self.arity() < 2 {
            return Err(Error::SingleColumn {
                operation: "condition",
            });
        }
        if names.is_empty() {
            return Err(Error::NoColumns {
                operation: "condition",
            });
        }
        let split = self.columns.split(names)?;
        if split.complement_indices.is_empty() {
            return Err(Error::AllColumns {
                operation: "condition",
            });
        }
        debug!(parents = ?split.names, children = ?split.complement_names, "condition_on");

        let child_columns = Columns::trusted(split.complement_names.clone());
        let mut partitions: HashMap<Key, Table> = HashMap::new();
        for (key, &weight) in self.cells.iter() {
            partitions
                .entry(key.project(&split.indices))
                .or_insert_with(|| Table::empty(child_columns.clone()))
                .cells
                .insert(key.project(&split.complement_indices), weight);
        }
        if normalise {
            for table in partitions.values_mut() {
                table.normalise();
            }
        }

        let columns = Columns::trusted(split.names).with_children(split.complement_names)?;
        Ok(MultiTable::from_parts(columns, partitions))
    }

    /// Keeps the rows whose named columns hold the given values, then drops those columns.
    ///
    /// ```
    /// use contingency::{Table, Value};
    ///
    /// let table = Table::new(vec![
    ///     (("a", "x", 1), 1.0),
    ///     (("a", "y", 1), 2.0),
    ///     (("b", "y", 1), 3.0),
    ///     (("b", "y", 2), 4.0),
    /// ])?;
    ///
    /// let y = table.reduce(&[("X2", Value::from("y"))])?;
    /// assert_eq!(y.names(), ["X1", "X3"]);
    /// assert_eq!(y.get(("b", 2)), 4.0);
    /// assert_eq!(y.get(("a", 1)), 2.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn reduce(&self, fixed: &[(&str, Value)]) -> Result<Table> {
        let selection = resolve_selection(&self.columns, fixed)?;
        if selection.is_empty() {
            return Ok(self.clone());
        }
        if selection.len() == self.arity() {
            return Err(Error::AllColumns {
                operation: "reduce",
            });
        }

        let keep: Vec<usize> = (0..self.arity())
            .filter(|i| selection.iter().all(|(j, _)| i != j))
            .collect();
        debug!(?fixed, "reduce");

        let mut cells = HashMap::new();
        for (key, weight) in self.cells.iter() {
            if selects(key, &selection) {
                *cells.entry(key.project(&keep)).or_insert(0.0) += weight;
            }
        }
        Ok(Table {
            columns: Columns::trusted(self.columns.select(&keep)),
            cells,
        })
    }

    /// Joins two tables, multiplying the weights of rows which agree on every shared column.
    ///
    /// The result has this table's columns followed by the other table's columns which this
    /// table lacks. Without shared columns every pair of rows is combined. Rows whose shared
    /// values appear on only one side are dropped.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let ab = Table::with_names(vec![(("a", 1), 2.0), (("b", 2), 3.0)], vec!["A", "B"])?;
    /// let bc = Table::with_names(vec![((1, "x"), 5.0), ((1, "y"), 7.0), ((3, "z"), 1.0)], vec!["B", "C"])?;
    ///
    /// let abc = ab.product(&bc);
    /// assert_eq!(abc.names(), ["A", "B", "C"]);
    /// assert_eq!(abc.len(), 2);
    /// assert_eq!(abc.get(("a", 1, "y")), 14.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn product(&self, other: &Table) -> Table {
        let (left_shared, right_shared): (Vec<usize>, Vec<usize>) = self
            .names()
            .iter()
            .enumerate()
            .filter_map(|(i, name)| other.columns.index_of(name).map(|j| (i, j)))
            .unzip();
        let right_rest: Vec<usize> = (0..other.arity())
            .filter(|j| !right_shared.contains(j))
            .collect();
        debug!(
            left = ?self.names(),
            right = ?other.names(),
            shared = left_shared.len(),
            "product"
        );

        // With nothing shared, every right row lands under the empty key.
        let mut lookup: HashMap<Key, Vec<(Key, f64)>> = HashMap::new();
        for (key, &weight) in other.cells.iter() {
            lookup
                .entry(key.project(&right_shared))
                .or_default()
                .push((key.project(&right_rest), weight));
        }

        let mut cells = HashMap::with_capacity(self.cells.len().max(other.cells.len()));
        for (key, &weight) in self.cells.iter() {
            if let Some(matching) = lookup.get(&key.project(&left_shared)) {
                for (rest, other_weight) in matching {
                    cells.insert(key.concat(rest), weight * other_weight);
                }
            }
        }

        let mut names = self.names().to_vec();
        names.extend(other.columns.select(&right_rest));
        Table {
            columns: Columns::trusted(names),
            cells,
        }
    }

    /// Sums the weights of two tables key by key.
    ///
    /// Both tables must have the same column names in the same order. A key missing from either
    /// side counts as zero.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let a = Table::new(vec![("x", 1.0), ("y", 2.0)])?;
    /// let b = Table::new(vec![("y", 3.0), ("z", 4.0)])?;
    /// let sum = a.add(&b)?;
    /// assert_eq!(sum.get("y"), 5.0);
    /// assert_eq!(sum.total(), a.total() + b.total());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn add(&self, other: &Table) -> Result<Table> {
        if self.names() != other.names() {
            return Err(Error::NameMismatch {
                left: self.names().to_vec(),
                right: other.names().to_vec(),
            });
        }

        let left = self.sorted().into_iter().assume_sorted_by_key();
        let right = other.sorted().into_iter().assume_sorted_by_key();
        let cells = left
            .outer_join(right)
            .map(|(key, (a, b))| (key.clone(), a.unwrap_or(0.0) + b.unwrap_or(0.0)))
            .collect();
        Ok(Table {
            columns: self.columns.clone(),
            cells,
        })
    }

    /// Divides every weight by the total, in place. A table whose total is zero is unchanged.
    pub fn normalise(&mut self) {
        let total = self.total();
        if total > 0.0 {
            for weight in self.cells.values_mut() {
                *weight /= total;
            }
        }
    }

    /// Returns a normalised copy of this table.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::new(vec![("x", 1.0), ("y", 3.0)])?.normalised();
    /// assert_eq!(table.get("y"), 0.75);
    /// assert_eq!(table.normalised(), table);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn normalised(&self) -> Table {
        let mut table = self.clone();
        table.normalise();
        table
    }

    /// Returns a copy of this table with every weight multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Result<Table> {
        let factor = check_weight(factor)?;
        Ok(self.scaled(factor))
    }

    pub(crate) fn scaled(&self, factor: f64) -> Table {
        Table {
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|(key, weight)| (key.clone(), weight * factor))
                .collect(),
        }
    }
}

impl Mul<&Table> for &Table {
    type Output = Table;

    /// Equivalent to [`Table::product`].
    fn mul(self, rhs: &Table) -> Table {
        self.product(rhs)
    }
}

impl Mul<f64> for &Table {
    type Output = Result<Table>;

    /// Equivalent to [`Table::scale`].
    fn mul(self, rhs: f64) -> Result<Table> {
        self.scale(rhs)
    }
}

impl Mul<&Table> for f64 {
    type Output = Result<Table>;

    fn mul(self, rhs: &Table) -> Result<Table> {
        rhs.scale(self)
    }
}
