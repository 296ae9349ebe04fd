use crate::table::{resolve_selection, selects};
use crate::{check_weight, Columns, Error, IntoKey, Key, Result, Table, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Mul;
use tracing::{debug, trace};

/// A family of tables indexed by the values of some conditioning columns.
///
/// This represents a conditional distribution like `P(X, Y | Z)`: the conditioning ("parent")
/// columns `Z` form the outer key, and every partition is a [`Table`] over the same "child"
/// columns `X, Y`.
#[derive(Clone, PartialEq)]
pub struct MultiTable {
    columns: Columns,
    partitions: HashMap<Key, Table>,
}

impl fmt::Debug for MultiTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} | {:?} ",
            self.columns.children(),
            self.columns.names()
        )?;
        f.debug_map().entries(self.sorted()).finish()
    }
}

impl MultiTable {
    /// Creates a conditional table from `(parent key, table)` pairs.
    ///
    /// Every nested table must have the same column names, which must not reuse any of the
    /// conditioning `names`. Tables given for the same key are added together.
    ///
    /// ```
    /// use contingency::{MultiTable, Table};
    ///
    /// let rain = Table::with_names(vec![("wet", 9.0), ("dry", 1.0)], vec!["Ground"])?;
    /// let sun = Table::with_names(vec![("wet", 1.0), ("dry", 9.0)], vec!["Ground"])?;
    /// let ground = MultiTable::new(vec![("rain", rain), ("sun", sun)], vec!["Weather"])?;
    ///
    /// assert_eq!(ground.names(), ["Weather"]);
    /// assert_eq!(ground.children(), ["Ground"]);
    /// assert_eq!(ground.probability("wet", "rain"), 0.9);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn new<I, K, N, S>(partitions: I, names: N) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Table)>,
        K: IntoKey,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parents = Columns::new(names)?;
        let mut columns: Option<Columns> = None;
        let mut collected: HashMap<Key, Table> = HashMap::new();
        for (key, table) in partitions {
            let key = key.into_key();
            if key.len() != parents.len() {
                return Err(Error::Arity {
                    expected: parents.len(),
                    got: key.len(),
                });
            }
            if let Some(columns) = &columns {
                if columns.children() != table.names() {
                    return Err(Error::ChildSchema {
                        expected: columns.children().to_vec(),
                        found: table.names().to_vec(),
                    });
                }
            } else {
                columns = Some(parents.clone().with_children(table.names().to_vec())?);
            }
            let table = match collected.remove(&key) {
                Some(existing) => existing.add(&table)?,
                None => table,
            };
            collected.insert(key, table);
        }

        let columns = columns.ok_or(Error::Empty)?;
        Ok(MultiTable {
            columns,
            partitions: collected,
        })
    }

    pub(crate) fn from_parts(columns: Columns, partitions: HashMap<Key, Table>) -> Self {
        MultiTable {
            columns,
            partitions,
        }
    }

    /// The conditioning columns, with the nested tables' schema attached.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// The names of the conditioning columns.
    pub fn names(&self) -> &[String] {
        self.columns.names()
    }

    /// The column names shared by every nested table.
    pub fn children(&self) -> &[String] {
        self.columns.children()
    }

    /// The number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Returns `true` if there are no partitions.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Returns an iterator over the partitions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Table)> + '_ {
        self.partitions.iter()
    }

    /// Returns the partitions sorted by conditioning key.
    pub fn sorted(&self) -> Vec<(&Key, &Table)> {
        let mut partitions: Vec<_> = self.partitions.iter().collect();
        partitions.sort_unstable_by(|a, b| a.0.cmp(b.0));
        partitions
    }

    /// Returns the nested table for one conditioning key.
    pub fn get(&self, parent: impl IntoKey) -> Option<&Table> {
        self.partitions.get(&parent.into_key())
    }

    /// Returns the nested table for a conditioning key given as a mix of positional and named
    /// values, as described in [`Columns::to_key`].
    pub fn get_by(&self, positional: &[Value], named: &[(&str, Value)]) -> Result<Option<&Table>> {
        Ok(self.partitions.get(&self.columns.to_key(positional, named)?))
    }

    /// The probability of `child` within the partition for `parent`, or zero if either was never
    /// observed.
    pub fn probability(&self, child: impl IntoKey, parent: impl IntoKey) -> f64 {
        self.get(parent)
            .map_or(0.0, |table| table.probability(child))
    }

    /// The total weight of every partition.
    pub fn total(&self) -> HashMap<Key, f64> {
        self.partitions
            .iter()
            .map(|(key, table)| (key.clone(), table.total()))
            .collect()
    }

    /// The distinct values observed in one column, which may be a conditioning or a child
    /// column.
    pub fn levels(&self, name: &str) -> Result<BTreeSet<Value>> {
        if let Some(index) = self.columns.index_of(name) {
            return Ok(self.partitions.keys().map(|key| key[index].clone()).collect());
        }
        if !self.columns.contains_child(name) {
            return Err(Error::UnknownColumn(name.to_string()));
        }
        let mut levels = BTreeSet::new();
        for table in self.partitions.values() {
            levels.extend(table.levels(name)?);
        }
        Ok(levels)
    }

    /// Rejects names which aren't child columns.
    fn check_children(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if self.columns.contains(name) {
                return Err(Error::ConditionedColumn(name.to_string()));
            }
            if !self.columns.contains_child(name) {
                return Err(Error::UnknownColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Sums child columns away within every partition.
    ///
    /// Conditioning columns can't be marginalised this way.
    ///
    /// ```
    /// use contingency::{Error, Table};
    ///
    /// let table = Table::new(vec![(("a", "x", 1), 1.0), (("a", "y", 1), 2.0), (("b", "x", 2), 4.0)])?;
    /// let given_x1 = table.condition_on(&["X1"], false)?;
    ///
    /// let marginal = given_x1.marginal(&["X2"], false)?;
    /// assert_eq!(marginal.children(), ["X3"]);
    /// assert_eq!(marginal.get("a").map(|t| t.get(1)), Some(3.0));
    ///
    /// assert_eq!(
    ///     given_x1.marginal(&["X1"], false),
    ///     Err(Error::ConditionedColumn("X1".to_string()))
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn marginal(&self, names: &[&str], normalise: bool) -> Result<MultiTable> {
        self.check_children(names)?;
        let split = self.columns.child_columns().split(names)?;
        if split.complement_indices.is_empty() {
            return Err(Error::AllColumns {
                operation: "marginalise",
            });
        }
        debug!(drop = ?split.names, parents = ?self.names(), "conditional marginal");

        let partitions = self
            .partitions
            .iter()
            .map(|(key, table)| Ok((key.clone(), table.marginal(names, normalise)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        let columns = Columns::trusted(self.names().to_vec()).with_children(split.complement_names)?;
        Ok(MultiTable {
            columns,
            partitions,
        })
    }

    /// Conditions every partition further on some of its child columns.
    ///
    /// The newly conditioned columns come first in the resulting conditioning key, in child
    /// column order, followed by the existing conditioning columns. So `P(X, Y | Z)` conditioned
    /// on `Y` becomes `P(X | Y, Z)`.
    ///
    /// ```
    /// use contingency::Table;
    ///
    /// let table = Table::with_names(
    ///     vec![(("a", "x", 1), 1.0), (("b", "x", 1), 1.0), (("a", "y", 2), 2.0)],
    ///     vec!["X", "Y", "Z"],
    /// )?;
    /// let nested = table.condition_on(&["Z"], true)?.condition_on(&["Y"], true)?;
    /// assert_eq!(nested.names(), ["Y", "Z"]);
    /// assert_eq!(nested.children(), ["X"]);
    /// assert_eq!(nested.probability("a", ("x", 1)), 0.5);
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn condition_on(&self, names: &[&str], normalise: bool) -> Result<MultiTable> {
        self.check_children(names)?;
        if names.is_empty() {
            return Err(Error::NoColumns {
                operation: "condition",
            });
        }
        let split = self.columns.child_columns().split(names)?;
        if split.complement_indices.is_empty() {
            return Err(Error::AllColumns {
                operation: "condition",
            });
        }
        debug!(parents = ?split.names, existing = ?self.names(), "conditional condition_on");

        let mut partitions = HashMap::new();
        for (outer, table) in self.partitions.iter() {
            for (inner, nested) in table.condition_on(names, normalise)?.partitions {
                partitions.insert(inner.concat(outer), nested);
            }
        }

        let mut parents = split.names;
        parents.extend(self.names().iter().cloned());
        let columns = Columns::trusted(parents).with_children(split.complement_names)?;
        Ok(MultiTable {
            columns,
            partitions,
        })
    }

    /// Fixes some columns to the given values and drops them.
    ///
    /// The selection must fall entirely within either the conditioning columns or the child
    /// columns. Fixing child columns reduces every partition. Fixing conditioning columns keeps
    /// only the matching partitions; when every conditioning column is fixed, the single
    /// remaining nested table is returned as a flat [`Factor`].
    ///
    /// ```
    /// use contingency::{Table, Value};
    ///
    /// let table = Table::new(vec![(("a", "x", 1), 1.0), (("a", "y", 1), 2.0), (("b", "x", 2), 4.0)])?;
    /// let given_x1 = table.condition_on(&["X1"], false)?;
    ///
    /// let flat = given_x1.reduce(&[("X1", Value::from("a"))])?;
    /// let flat = flat.as_flat().expect("every conditioning column was fixed");
    /// assert_eq!(flat.names(), ["X2", "X3"]);
    /// assert_eq!(flat.get(("y", 1)), 2.0);
    ///
    /// assert!(given_x1.reduce(&[("X1", Value::from("a")), ("X2", Value::from("x"))]).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn reduce(&self, fixed: &[(&str, Value)]) -> Result<Factor> {
        if fixed.is_empty() {
            return Ok(Factor::Nested(self.clone()));
        }

        let in_parents = fixed
            .iter()
            .filter(|(name, _)| self.columns.contains(name))
            .count();
        if in_parents == 0 {
            self.check_children(&fixed.iter().map(|(name, _)| *name).collect::<Vec<_>>())?;
            debug!(?fixed, "conditional reduce on children");
            let partitions = self
                .partitions
                .iter()
                .map(|(key, table)| Ok((key.clone(), table.reduce(fixed)?)))
                .collect::<Result<HashMap<_, _>>>()?;
            let children: Vec<String> = self
                .children()
                .iter()
                .filter(|child| fixed.iter().all(|(name, _)| name != child))
                .cloned()
                .collect();
            let columns = Columns::trusted(self.names().to_vec()).with_children(children)?;
            return Ok(Factor::Nested(MultiTable {
                columns,
                partitions,
            }));
        }
        if in_parents < fixed.len() {
            return Err(match fixed.iter().find(|(name, _)| {
                !self.columns.contains(name) && !self.columns.contains_child(name)
            }) {
                Some((name, _)) => Error::UnknownColumn(name.to_string()),
                None => Error::MixedSelection,
            });
        }

        let selection = resolve_selection(&self.columns, fixed)?;
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|i| selection.iter().all(|(j, _)| i != j))
            .collect();
        debug!(?fixed, "conditional reduce on parents");

        let matching = self
            .partitions
            .iter()
            .filter(|(key, _)| selects(key, &selection));
        if keep.is_empty() {
            // A fully fixed conditioning key selects at most one partition.
            let table = matching
                .map(|(_, table)| table.clone())
                .next()
                .unwrap_or_else(|| Table::empty(self.columns.child_columns()));
            return Ok(Factor::Flat(table));
        }

        let partitions = matching
            .map(|(key, table)| (key.project(&keep), table.clone()))
            .collect();
        let columns = Columns::trusted(self.columns.select(&keep))
            .with_children(self.children().to_vec())?;
        Ok(Factor::Nested(MultiTable {
            columns,
            partitions,
        }))
    }

    /// Adds two conditional tables partition by partition.
    ///
    /// Both must have the same conditioning columns and the same child columns, in the same
    /// order.
    pub fn add(&self, other: &MultiTable) -> Result<MultiTable> {
        if self.names() != other.names() {
            return Err(Error::NameMismatch {
                left: self.names().to_vec(),
                right: other.names().to_vec(),
            });
        }
        if self.children() != other.children() {
            return Err(Error::ChildSchema {
                expected: self.children().to_vec(),
                found: other.children().to_vec(),
            });
        }

        let mut partitions = self.partitions.clone();
        for (key, table) in other.partitions.iter() {
            let sum = match partitions.remove(key) {
                Some(existing) => existing.add(table)?,
                None => table.clone(),
            };
            partitions.insert(key.clone(), sum);
        }
        Ok(MultiTable {
            columns: self.columns.clone(),
            partitions,
        })
    }

    /// Normalises every partition by its own total, in place. Partitions whose total is zero
    /// are unchanged.
    pub fn normalise(&mut self) {
        for table in self.partitions.values_mut() {
            table.normalise();
        }
    }

    /// Returns a copy of this table with every partition normalised.
    pub fn normalised(&self) -> MultiTable {
        let mut table = self.clone();
        table.normalise();
        table
    }

    /// Returns a copy of this table with every weight multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Result<MultiTable> {
        let factor = check_weight(factor)?;
        Ok(self.scaled(factor))
    }

    fn scaled(&self, factor: f64) -> MultiTable {
        MultiTable {
            columns: self.columns.clone(),
            partitions: self
                .partitions
                .iter()
                .map(|(key, table)| (key.clone(), table.scaled(factor)))
                .collect(),
        }
    }
}

impl Mul<f64> for &MultiTable {
    type Output = Result<MultiTable>;

    /// Multiplies every weight in every partition by a constant, as [`MultiTable::scale`].
    fn mul(self, rhs: f64) -> Result<MultiTable> {
        self.scale(rhs)
    }
}

impl Mul<&MultiTable> for f64 {
    type Output = Result<MultiTable>;

    fn mul(self, rhs: &MultiTable) -> Result<MultiTable> {
        rhs.scale(self)
    }
}

/// Either a flat [`Table`] or a conditional [`MultiTable`].
///
/// Products between factors dispatch on the pair of variants, and may produce either kind: a
/// conditional table multiplied by the distribution of all its conditioning columns collapses
/// into a flat joint table.
#[derive(Clone, Debug, PartialEq)]
pub enum Factor {
    /// A table of weights.
    Flat(Table),
    /// A table of tables.
    Nested(MultiTable),
}

/// The four supported product shapes.
enum Topology<'a> {
    FlatFlat(&'a Table, &'a Table),
    FlatNested(&'a Table, &'a MultiTable),
    NestedFlat(&'a MultiTable, &'a Table),
    NestedNested(&'a MultiTable, &'a MultiTable),
}

impl<'a> Topology<'a> {
    fn of(left: &'a Factor, right: &'a Factor) -> Self {
        match (left, right) {
            (Factor::Flat(a), Factor::Flat(b)) => Topology::FlatFlat(a, b),
            (Factor::Flat(a), Factor::Nested(b)) => Topology::FlatNested(a, b),
            (Factor::Nested(a), Factor::Flat(b)) => Topology::NestedFlat(a, b),
            (Factor::Nested(a), Factor::Nested(b)) => Topology::NestedNested(a, b),
        }
    }
}

impl Factor {
    /// The outer column names: all columns of a flat table, or the conditioning columns of a
    /// conditional one.
    pub fn names(&self) -> &[String] {
        match self {
            Factor::Flat(table) => table.names(),
            Factor::Nested(table) => table.names(),
        }
    }

    /// The nested tables' column names, or an empty slice for a flat table.
    pub fn children(&self) -> &[String] {
        match self {
            Factor::Flat(_) => &[],
            Factor::Nested(table) => table.children(),
        }
    }

    /// Returns the flat table, if this is one.
    pub fn as_flat(&self) -> Option<&Table> {
        match self {
            Factor::Flat(table) => Some(table),
            Factor::Nested(_) => None,
        }
    }

    /// Returns the conditional table, if this is one.
    pub fn as_nested(&self) -> Option<&MultiTable> {
        match self {
            Factor::Flat(_) => None,
            Factor::Nested(table) => Some(table),
        }
    }

    /// Converts into the flat table, if this is one.
    pub fn into_flat(self) -> Option<Table> {
        match self {
            Factor::Flat(table) => Some(table),
            Factor::Nested(_) => None,
        }
    }

    /// Converts into the conditional table, if this is one.
    pub fn into_nested(self) -> Option<MultiTable> {
        match self {
            Factor::Flat(_) => None,
            Factor::Nested(table) => Some(table),
        }
    }

    /// Normalises in place: the whole table if flat, each partition if conditional.
    pub fn normalise(&mut self) {
        match self {
            Factor::Flat(table) => table.normalise(),
            Factor::Nested(table) => table.normalise(),
        }
    }

    /// Returns a copy with every weight multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Result<Factor> {
        Ok(match self {
            Factor::Flat(table) => Factor::Flat(table.scale(factor)?),
            Factor::Nested(table) => Factor::Nested(table.scale(factor)?),
        })
    }

    /// Multiplies two factors.
    ///
    /// - Two flat tables are joined as in [`Table::product`].
    /// - A flat table over some of a conditional table's conditioning columns is multiplied into
    ///   each matching partition. If it covers all of them, the result is a flat joint table,
    ///   so `P(X | Z) * P(Z) = P(X, Z)`; otherwise the uncovered columns stay conditioning
    ///   columns, so `P(X | Z, W) * P(Z) = P(X, Z | W)`.
    /// - Two conditional tables compose when one side's columns all appear among the other
    ///   side's conditioning columns, as in `P(X | Z, U) * P(Z | U) = P(X, Z | U)`.
    ///
    /// Child columns of the result list the left operand's columns first. Any other combination
    /// of columns, including the symmetric `P(X | Y) * P(Y | X)`, is an error.
    ///
    /// ```
    /// use contingency::{Factor, Table};
    ///
    /// let joint = Table::with_names(
    ///     vec![(("a", "x"), 1.0), (("a", "y"), 3.0), (("b", "x"), 2.0), (("b", "y"), 2.0)],
    ///     vec!["A", "B"],
    /// )?;
    /// let p_b = Factor::Flat(joint.marginal(&["A"], true)?);
    /// let p_a_given_b = Factor::Nested(joint.condition_on(&["B"], true)?);
    ///
    /// let rebuilt = p_b.product(&p_a_given_b)?.into_flat().expect("B was fully absorbed");
    /// assert_eq!(rebuilt.names(), ["B", "A"]);
    /// assert!((rebuilt.get(("y", "a")) - 0.375).abs() < 1e-12);
    ///
    /// let p_b_given_a = Factor::Nested(joint.condition_on(&["A"], true)?);
    /// assert!(p_a_given_b.product(&p_b_given_a).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        match Topology::of(self, other) {
            Topology::FlatFlat(a, b) => Ok(Factor::Flat(a.product(b))),
            Topology::FlatNested(a, b) => broadcast(a, b, true),
            Topology::NestedFlat(a, b) => broadcast(b, a, false),
            Topology::NestedNested(a, b) => compose(a, b),
        }
    }
}

impl From<Table> for Factor {
    fn from(table: Table) -> Self {
        Factor::Flat(table)
    }
}

impl From<MultiTable> for Factor {
    fn from(table: MultiTable) -> Self {
        Factor::Nested(table)
    }
}

impl Mul<&Factor> for &Factor {
    type Output = Result<Factor>;

    /// Equivalent to [`Factor::product`].
    fn mul(self, rhs: &Factor) -> Result<Factor> {
        self.product(rhs)
    }
}

/// Positions of `names` within `columns`, or `None` if any is missing.
fn positions(columns: &Columns, names: &[String]) -> Option<Vec<usize>> {
    names.iter().map(|name| columns.index_of(name)).collect()
}

/// Assembles a product result: flat when no conditioning columns survive.
fn assemble(
    parents: Vec<String>,
    children: Vec<String>,
    partitions: HashMap<Key, Table>,
) -> Result<Factor> {
    if parents.is_empty() {
        let mut cells = HashMap::new();
        for (_, table) in partitions {
            cells.extend(table.cells);
        }
        return Ok(Factor::Flat(Table::from_parts(Columns::trusted(children), cells)));
    }
    let columns = Columns::trusted(parents).with_children(children)?;
    Ok(Factor::Nested(MultiTable::from_parts(columns, partitions)))
}

/// Multiplies a flat table over some conditioning columns into each matching partition.
fn broadcast(flat: &Table, nested: &MultiTable, flat_first: bool) -> Result<Factor> {
    let shared = positions(&nested.columns, flat.names()).ok_or_else(|| {
        Error::Topology(format!(
            "columns {:?} are not all conditioning columns of {:?}",
            flat.names(),
            nested.names()
        ))
    })?;
    let rest: Vec<usize> = (0..nested.columns.len())
        .filter(|i| !shared.contains(i))
        .collect();
    debug!(
        flat = ?flat.names(),
        parents = ?nested.names(),
        children = ?nested.children(),
        flat_first,
        "broadcast product"
    );

    let mut children = nested.children().to_vec();
    if flat_first {
        children.splice(0..0, flat.names().iter().cloned());
    } else {
        children.extend(flat.names().iter().cloned());
    }
    let child_columns = Columns::trusted(children.clone());

    let mut partitions: HashMap<Key, Table> = HashMap::new();
    for (key, table) in nested.partitions.iter() {
        let sub = key.project(&shared);
        let weight = match flat.cells.get(&sub) {
            Some(&weight) => weight,
            None => {
                trace!(?key, "no matching row");
                continue;
            }
        };
        let target = partitions
            .entry(key.project(&rest))
            .or_insert_with(|| Table::empty(child_columns.clone()));
        for (child, child_weight) in table.cells.iter() {
            let combined = if flat_first {
                sub.concat(child)
            } else {
                child.concat(&sub)
            };
            target.cells.insert(combined, weight * child_weight);
        }
    }

    assemble(nested.columns.select(&rest), children, partitions)
}

/// Finds where every column of `side` sits among the conditioning columns of `main`, provided
/// `main`'s children don't appear in `side` at all.
fn absorbed(main: &MultiTable, side: &MultiTable) -> Option<(Vec<usize>, Vec<usize>)> {
    let disjoint = main
        .children()
        .iter()
        .all(|name| !side.columns.contains(name) && !side.columns.contains_child(name));
    if !disjoint {
        return None;
    }
    let parents = positions(&main.columns, side.names())?;
    let children = positions(&main.columns, side.children())?;
    Some((parents, children))
}

/// Composes two conditional tables when one side's columns are all conditioning columns of the
/// other.
fn compose(left: &MultiTable, right: &MultiTable) -> Result<Factor> {
    let (main, side, main_is_left, (side_parents, side_children)) =
        if let Some(found) = absorbed(left, right) {
            (left, right, true, found)
        } else if let Some(found) = absorbed(right, left) {
            (right, left, false, found)
        } else {
            return Err(Error::Topology(format!(
                "neither {:?} | {:?} nor {:?} | {:?} is fully conditioned on by the other",
                left.children(),
                left.names(),
                right.children(),
                right.names()
            )));
        };
    let rest: Vec<usize> = (0..main.columns.len())
        .filter(|i| !side_children.contains(i))
        .collect();
    debug!(
        main = ?main.names(),
        side = ?side.names(),
        absorbed = ?side.children(),
        "conditional product"
    );

    let mut children = left.children().to_vec();
    children.extend(right.children().iter().cloned());
    let child_columns = Columns::trusted(children.clone());

    let mut partitions: HashMap<Key, Table> = HashMap::new();
    for (key, table) in main.partitions.iter() {
        let side_table = match side.partitions.get(&key.project(&side_parents)) {
            Some(side_table) => side_table,
            None => continue,
        };
        let sub = key.project(&side_children);
        let weight = match side_table.cells.get(&sub) {
            Some(&weight) => weight,
            None => continue,
        };
        trace!(?key, weight, "composing partition");
        let target = partitions
            .entry(key.project(&rest))
            .or_insert_with(|| Table::empty(child_columns.clone()));
        for (child, child_weight) in table.cells.iter() {
            let combined = if main_is_left {
                child.concat(&sub)
            } else {
                sub.concat(child)
            };
            target.cells.insert(combined, weight * child_weight);
        }
    }
    assemble(main.columns.select(&rest), children, partitions)
}
