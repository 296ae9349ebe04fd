//! Bayesian point estimates over observed counts.

use crate::{Error, IntoKey, Key, Result, Table, Value};
use statrs::distribution::Beta;
use statrs::statistics::Mean;

/// Estimates the probability of one level of a two-level variable under a Beta prior.
///
/// ```
/// use contingency::{Binomial, Table, Value};
///
/// let table = Table::new(vec![("A", 15.0), ("B", 35.0)])?;
/// let estimate = Binomial::new(&table, 1.0, 1.0, None)?;
/// assert_eq!(estimate.level(), &Value::from("A"));
/// assert!((estimate.map() - 16.0 / 52.0).abs() < 1e-12);
/// assert_eq!(estimate.mle(), 0.3);
/// # Ok::<(), contingency::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Binomial {
    level: Value,
    other: Value,
    count: f64,
    total: f64,
    posterior: Beta,
}

impl Binomial {
    /// Builds an estimate from a single-column table with exactly two levels.
    ///
    /// `alpha` and `beta` are the prior's shape parameters. The estimated level defaults to the
    /// first level in sorted order.
    pub fn new(table: &Table, alpha: f64, beta: f64, level: Option<Value>) -> Result<Self> {
        if table.arity() != 1 {
            return Err(Error::Arity {
                expected: 1,
                got: table.arity(),
            });
        }
        let levels: Vec<Value> = table.levels(&table.names()[0])?.into_iter().collect();
        if levels.len() != 2 {
            return Err(Error::LevelCount {
                expected: 2,
                got: levels.len(),
            });
        }
        let (level, other) = match level {
            None => (levels[0].clone(), levels[1].clone()),
            Some(level) if level == levels[0] => (level, levels[1].clone()),
            Some(level) if level == levels[1] => (level, levels[0].clone()),
            Some(level) => return Err(Error::UnknownLevel(level)),
        };

        let count = table.get(level.clone());
        let total = table.total();
        let posterior = Beta::new(count + alpha, total - count + beta)
            .map_err(|e| Error::Prior(e.to_string()))?;
        Ok(Binomial {
            level,
            other,
            count,
            total,
            posterior,
        })
    }

    /// The level being estimated.
    pub fn level(&self) -> &Value {
        &self.level
    }

    /// The posterior distribution of the level's probability.
    pub fn posterior(&self) -> &Beta {
        &self.posterior
    }

    /// The posterior mean, `(n + alpha) / (alpha + beta + N)`.
    pub fn map(&self) -> f64 {
        self.posterior.mean()
    }

    /// The observed proportion, `n / N`, or zero without observations.
    pub fn mle(&self) -> f64 {
        if self.total > 0.0 {
            self.count / self.total
        } else {
            0.0
        }
    }

    /// The estimated probability of either level, and zero for anything else.
    pub fn probability(&self, level: impl Into<Value>) -> f64 {
        let level = level.into();
        if level == self.level {
            self.map()
        } else if level == self.other {
            1.0 - self.map()
        } else {
            0.0
        }
    }
}

/// Estimates the probability of every level under a Dirichlet prior.
#[derive(Clone, Debug)]
pub struct Multinomial {
    counts: Vec<(Key, f64)>,
    alphas: Vec<f64>,
    total: f64,
}

impl Multinomial {
    /// Builds an estimate with one prior parameter per observed key, in sorted key order.
    ///
    /// ```
    /// use contingency::{Multinomial, Table};
    ///
    /// let table = Table::new(vec![("a", 2.0), ("b", 6.0)])?;
    /// let estimate = Multinomial::new(&table, vec![2.0, 1.0])?;
    /// assert_eq!(estimate.probability("a"), 3.0 / 9.0);
    /// assert_eq!(estimate.mle()[1].1, 0.75);
    ///
    /// assert!(Multinomial::new(&table, vec![1.0]).is_err());
    /// # Ok::<(), contingency::Error>(())
    /// ```
    pub fn new(table: &Table, alphas: Vec<f64>) -> Result<Self> {
        let counts = table.frequencies(false);
        if alphas.len() != counts.len() {
            return Err(Error::LevelCount {
                expected: counts.len(),
                got: alphas.len(),
            });
        }
        if let Some(alpha) = alphas.iter().find(|alpha| !(**alpha > 0.0 && alpha.is_finite())) {
            return Err(Error::Prior(format!(
                "concentration {} is not a finite positive number",
                alpha
            )));
        }

        let total = table.total();
        let estimate = Multinomial {
            counts,
            alphas,
            total,
        };
        if estimate.denominator() <= 0.0 {
            return Err(Error::Prior(
                "too few observations for the mode to exist".to_string(),
            ));
        }
        Ok(estimate)
    }

    /// Builds an estimate with the same prior parameter for every key.
    pub fn with_uniform_prior(table: &Table, alpha: f64) -> Result<Self> {
        Multinomial::new(table, vec![alpha; table.len()])
    }

    fn denominator(&self) -> f64 {
        self.total + self.alphas.iter().map(|alpha| alpha - 1.0).sum::<f64>()
    }

    /// The posterior mode for every key, `(n_i + alpha_i - 1) / (N + sum(alpha_j - 1))`.
    pub fn map(&self) -> Vec<(Key, f64)> {
        let denominator = self.denominator();
        self.counts
            .iter()
            .zip(self.alphas.iter())
            .map(|((key, count), alpha)| (key.clone(), (count + alpha - 1.0) / denominator))
            .collect()
    }

    /// The observed proportion of every key.
    pub fn mle(&self) -> Vec<(Key, f64)> {
        self.counts
            .iter()
            .map(|(key, count)| {
                let p = if self.total > 0.0 {
                    count / self.total
                } else {
                    0.0
                };
                (key.clone(), p)
            })
            .collect()
    }

    /// The posterior mode of one key, or zero if it wasn't observed.
    pub fn probability(&self, key: impl IntoKey) -> f64 {
        let key = key.into_key();
        self.map()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map_or(0.0, |(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> Table {
        Table::new(vec![("A", 15.0), ("B", 35.0)]).unwrap()
    }

    #[test]
    fn binomial_of_second_level() {
        let estimate = Binomial::new(&counts(), 1.0, 1.0, Some(Value::from("B"))).unwrap();
        assert!((estimate.map() - 36.0 / 52.0).abs() < 1e-12);
        assert!((estimate.probability("A") - 16.0 / 52.0).abs() < 1e-12);
        assert_eq!(estimate.probability("C"), 0.0);
    }

    #[test]
    fn binomial_needs_two_known_levels() {
        let three = Table::new(vec![("A", 1.0), ("B", 1.0), ("C", 1.0)]).unwrap();
        assert_eq!(
            Binomial::new(&three, 1.0, 1.0, None).unwrap_err(),
            Error::LevelCount {
                expected: 2,
                got: 3
            }
        );
        assert_eq!(
            Binomial::new(&counts(), 1.0, 1.0, Some(Value::from("C"))).unwrap_err(),
            Error::UnknownLevel(Value::from("C"))
        );
        assert!(matches!(
            Binomial::new(&counts(), -20.0, 1.0, None),
            Err(Error::Prior(_))
        ));
    }

    #[test]
    fn binomial_needs_one_column() {
        let wide = Table::new(vec![(("A", 1), 1.0), (("B", 1), 1.0)]).unwrap();
        assert!(Binomial::new(&wide, 1.0, 1.0, None).is_err());
    }

    #[test]
    fn multinomial_map_with_flat_prior_is_mle() {
        let estimate = Multinomial::with_uniform_prior(&counts(), 1.0).unwrap();
        assert_eq!(estimate.map(), estimate.mle());
        assert_eq!(estimate.probability("B"), 0.7);
        assert_eq!(estimate.probability("Z"), 0.0);
    }
}
