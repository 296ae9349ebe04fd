use crate::{check_weight, Columns, Key, Result, Summary, Table, Value};
use std::collections::HashMap;
use std::ops::{Add, Mul};

/// Observed counts of a single named variable.
///
/// Unlike a [`Table`], a frequency table may be empty: every level of an empty table has
/// frequency and probability zero.
///
/// ```
/// use contingency::{FrequencyTable, Value};
///
/// let pets = FrequencyTable::new(vec!["Dog", "Cat", "Dog", "Dog"]).with_name("Pet");
/// assert_eq!(pets.name(), "Pet");
/// assert_eq!(pets.frequency("Dog", false), 3.0);
/// assert_eq!(pets.probability("Cat"), 0.25);
/// assert_eq!(pets.probability("Fish"), 0.0);
/// assert_eq!(pets.most_common(Some(1)), [(Value::from("Dog"), 3.0)]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyTable {
    table: Table,
}

fn single(level: impl Into<Value>) -> Key {
    Key::new(std::iter::once(level.into()))
}

impl FrequencyTable {
    /// Counts the given samples into a table named `X1`.
    pub fn new<I>(samples: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut cells = HashMap::new();
        for sample in samples {
            *cells.entry(single(sample)).or_insert(0.0) += 1.0;
        }
        FrequencyTable::from_cells(cells)
    }

    /// Builds a table named `X1` from explicit `(level, count)` pairs. Repeated levels are
    /// summed.
    pub fn from_counts<I, V>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, f64)>,
        V: Into<Value>,
    {
        let mut cells = HashMap::new();
        for (level, count) in counts {
            *cells.entry(single(level)).or_insert(0.0) += check_weight(count)?;
        }
        Ok(FrequencyTable::from_cells(cells))
    }

    fn from_cells(cells: HashMap<Key, f64>) -> Self {
        FrequencyTable {
            table: Table::from_parts(Columns::synthesized(1), cells),
        }
    }

    /// Renames the variable.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.table.columns = Columns::trusted(vec![name.into()]);
        self
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.table.names()[0]
    }

    /// The counts as a single-column [`Table`].
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Converts into a single-column [`Table`].
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Returns `true` if the level was observed.
    pub fn contains(&self, level: impl Into<Value>) -> bool {
        self.table.contains(single(level))
    }

    /// The count of a level, optionally divided by the total.
    pub fn frequency(&self, level: impl Into<Value>, normalised: bool) -> f64 {
        self.table.frequency(single(level), normalised)
    }

    /// The count of a level divided by the total, or zero if the table is empty.
    pub fn probability(&self, level: impl Into<Value>) -> f64 {
        self.table.probability(single(level))
    }

    /// Every level with its count, optionally normalised, in sorted level order.
    pub fn frequencies(&self, normalised: bool) -> Vec<(Value, f64)> {
        self.table
            .frequencies(normalised)
            .into_iter()
            .map(|(key, weight)| (key[0].clone(), weight))
            .collect()
    }

    /// The observed levels in sorted order.
    pub fn levels(&self) -> Vec<Value> {
        self.table
            .sorted()
            .into_iter()
            .map(|(key, _)| key[0].clone())
            .collect()
    }

    /// The total count.
    pub fn total(&self) -> f64 {
        self.table.total()
    }

    /// The `n` most common levels with their counts, most common first, or all of them if `n` is
    /// `None`. Ties are listed in level order.
    pub fn most_common(&self, n: Option<usize>) -> Vec<(Value, f64)> {
        let mut levels = self.frequencies(false);
        levels.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        levels.truncate(n.unwrap_or(levels.len()));
        levels
    }

    /// Summary statistics over the counts.
    pub fn summary(&self) -> Summary {
        self.table.summary()
    }

    /// The Shannon entropy of the distribution, using the given logarithm base, which must be
    /// finite, positive and other than one.
    ///
    /// ```
    /// use contingency::FrequencyTable;
    ///
    /// let coin = FrequencyTable::new(vec![1, 1, 2, 2, 1, 1, 2, 2]);
    /// assert_eq!(coin.entropy(2.0)?, 1.0);
    ///
    /// let certain = FrequencyTable::from_counts(vec![("Dog", 10.0), ("Cat", 0.0)])?;
    /// assert_eq!(certain.entropy(2.0)?, 0.0);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn entropy(&self, base: f64) -> Result<f64> {
        self.table.entropy(base)
    }

    /// Sums two frequency tables level by level, keeping this table's name.
    pub fn add(&self, other: &FrequencyTable) -> FrequencyTable {
        let mut table = self.table.clone();
        for (key, count) in other.table.iter() {
            *table.cells.entry(key.clone()).or_insert(0.0) += count;
        }
        FrequencyTable { table }
    }

    /// The joint table of two independent variables.
    ///
    /// The columns are named after both variables, or after this variable with suffixes `1` and
    /// `2` if both share one name.
    ///
    /// ```
    /// use contingency::FrequencyTable;
    ///
    /// let a = FrequencyTable::from_counts(vec![("A", 3.0), ("B", 4.0), ("C", 7.0)])?;
    /// let b = FrequencyTable::from_counts(vec![("A", 4.0), ("C", 4.0), ("D", 10.0)])?;
    ///
    /// let joint = a.product(&b);
    /// assert_eq!(joint.names(), ["X11", "X12"]);
    /// assert_eq!(joint.total(), 14.0 * 18.0);
    /// assert!((joint.probability(("A", "C")) - 3.0 / 14.0 * 4.0 / 18.0).abs() < 1e-12);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn product(&self, other: &FrequencyTable) -> Table {
        let names = if self.name() == other.name() {
            vec![format!("{}1", self.name()), format!("{}2", self.name())]
        } else {
            vec![self.name().to_string(), other.name().to_string()]
        };
        let mut cells = HashMap::with_capacity(self.table.len() * other.table.len());
        for (a, count_a) in self.table.iter() {
            for (b, count_b) in other.table.iter() {
                cells.insert(a.concat(b), count_a * count_b);
            }
        }
        Table::from_parts(Columns::trusted(names), cells)
    }
}

impl Add<&FrequencyTable> for &FrequencyTable {
    type Output = FrequencyTable;

    fn add(self, rhs: &FrequencyTable) -> FrequencyTable {
        FrequencyTable::add(self, rhs)
    }
}

impl Mul<&FrequencyTable> for &FrequencyTable {
    type Output = Table;

    fn mul(self, rhs: &FrequencyTable) -> Table {
        self.product(rhs)
    }
}
