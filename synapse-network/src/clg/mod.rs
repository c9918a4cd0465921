//! Built-in CLGs.
//!
//! | name | inputs | outputs |
//! |------|--------|---------|
//! | `input` | String | String |
//! | `output` | String | String |
//! | `sum`, `subtract`, `multiply` | Float, Float | Float |
//! | `is-greater` | Float, Float | Bool |
//! | `round` | Float, Int | Float |
//! | `parse-float` | String | Float |
//! | `to-string` | Float | String |
//! | `read-information-id` | | String |
//!
//! Every signature is preceded by the traversal context.

mod math;
mod text;

pub use math::{IsGreater, Multiply, Round, Subtract, Sum};
pub use text::{FloatToString, Input, Output, ParseFloat, ReadInformationId};

use std::sync::Arc;
use synapse_core::Clg;
use synapse_core::storage::Storage;

/// Every built-in CLG, ready for registration.
pub fn catalog(storage: Arc<dyn Storage>) -> Vec<Arc<dyn Clg>> {
    vec![
        Arc::new(Input::new(Arc::clone(&storage))),
        Arc::new(Output),
        Arc::new(Sum),
        Arc::new(Subtract),
        Arc::new(Multiply),
        Arc::new(IsGreater),
        Arc::new(Round),
        Arc::new(ParseFloat),
        Arc::new(FloatToString),
        Arc::new(ReadInformationId::new(storage)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use synapse_core::storage::MemoryStorage;
    use synapse_core::traits::check_signature;

    #[test]
    fn catalog_names_are_unique_and_signatures_valid() {
        let clgs = catalog(Arc::new(MemoryStorage::with_defaults()));
        let names: HashSet<&str> = clgs.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), clgs.len());
        assert!(names.contains("input"));
        assert!(names.contains("output"));
        for clg in &clgs {
            check_signature(clg.as_ref()).unwrap();
        }
    }
}
