//! Bounded permutation of raw values.
//!
//! A [`PermutationList`] holds N raw values and an index vector that is read
//! as a base-N counter, last position least significant. Each increment
//! advances the counter by one; when the carry runs off the first position the
//! vector grows by one position and restarts at all zeros. Starting empty,
//! the sequence for two values is `[0]`, `[1]`, `[0,0]`, `[0,1]`, `[1,0]`,
//! `[1,1]`, `[0,0,0]`, ...
//!
//! Growth is bounded. Running into the bound yields
//! [`SynapseError::MaxGrowthReached`], the normal end of a search.

use crate::error::{Result, SynapseError};

/// A list of raw values permuted by a bounded index vector.
#[derive(Debug, Clone)]
pub struct PermutationList<T: Clone> {
    raw_values: Vec<T>,
    indizes: Vec<usize>,
    max_growth: usize,
}

impl<T: Clone> PermutationList<T> {
    /// Create a permutation list over the given values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `raw_values` is empty or `max_growth` is zero.
    pub fn new(raw_values: Vec<T>, max_growth: usize) -> Result<Self> {
        if raw_values.is_empty() {
            return Err(SynapseError::invalid_config("raw values must not be empty"));
        }
        if max_growth == 0 {
            return Err(SynapseError::invalid_config(
                "max growth must be greater than 0",
            ));
        }

        Ok(Self {
            raw_values,
            indizes: Vec::new(),
            max_growth,
        })
    }

    /// Advance the index vector by `delta` increments.
    ///
    /// Either all increments apply or none do. Returns the values selected by
    /// the new index vector.
    ///
    /// # Errors
    ///
    /// Returns `MaxGrowthReached` if any increment would grow the index vector
    /// beyond the growth bound. The list is left unchanged in that case.
    pub fn permute_by(&mut self, delta: usize) -> Result<Vec<T>> {
        let radix = self.raw_values.len();
        let mut next = self.indizes.clone();

        for _ in 0..delta {
            increment(&mut next, radix);
            if next.len() > self.max_growth {
                return Err(SynapseError::MaxGrowthReached {
                    max_growth: self.max_growth,
                });
            }
        }

        self.indizes = next;
        Ok(self.permuted_values())
    }

    /// The values selected by the current index vector.
    pub fn permuted_values(&self) -> Vec<T> {
        self.indizes
            .iter()
            .map(|&i| self.raw_values[i].clone())
            .collect()
    }

    /// The current index vector.
    pub fn indizes(&self) -> &[usize] {
        &self.indizes
    }

    /// The values this list was created with.
    pub fn raw_values(&self) -> &[T] {
        &self.raw_values
    }

    /// The growth bound.
    pub fn max_growth(&self) -> usize {
        self.max_growth
    }
}

fn increment(indizes: &mut Vec<usize>, radix: usize) {
    for position in indizes.iter_mut().rev() {
        *position += 1;
        if *position < radix {
            return;
        }
        *position = 0;
    }

    // Carry ran off the first position, or the vector was empty.
    indizes.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        assert!(PermutationList::<u8>::new(vec![], 2).is_err());
        assert!(PermutationList::new(vec![1], 0).is_err());
    }

    #[test]
    fn permute_by_four_then_eight() {
        let mut list = PermutationList::new(vec!['a', 'b'], 3).unwrap();

        let values = list.permute_by(4).unwrap();
        assert_eq!(list.indizes(), &[0, 1]);
        assert_eq!(values, vec!['a', 'b']);

        let values = list.permute_by(8).unwrap();
        assert_eq!(list.indizes(), &[1, 0, 1]);
        assert_eq!(values, vec!['b', 'a', 'b']);
    }

    #[test]
    fn single_steps_follow_counter_order() {
        let mut list = PermutationList::new(vec![0u8, 1], 3).unwrap();
        let mut seen = Vec::new();
        for _ in 0..7 {
            list.permute_by(1).unwrap();
            seen.push(list.indizes().to_vec());
        }
        assert_eq!(
            seen,
            vec![
                vec![0],
                vec![1],
                vec![0, 0],
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![0, 0, 0],
            ]
        );
    }

    #[test]
    fn max_growth_leaves_list_unchanged() {
        let mut list = PermutationList::new(vec!["x", "y"], 2).unwrap();
        list.permute_by(6).unwrap();
        assert_eq!(list.indizes(), &[1, 1]);

        let err = list.permute_by(1).unwrap_err();
        assert!(err.is_max_growth_reached());
        assert_eq!(list.indizes(), &[1, 1]);

        // A delta that crosses the bound part way is rejected as a whole.
        let mut list = PermutationList::new(vec!["x", "y"], 2).unwrap();
        assert!(list.permute_by(7).is_err());
        assert!(list.indizes().is_empty());
    }

    #[test]
    fn raw_values_are_untouched() {
        let mut list = PermutationList::new(vec![10, 20, 30], 2).unwrap();
        list.permute_by(5).unwrap();
        assert_eq!(list.raw_values(), &[10, 20, 30]);
        assert_eq!(list.indizes(), &[0, 1]);
        assert_eq!(list.permuted_values(), vec![10, 20]);
    }
}
