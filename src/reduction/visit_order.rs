use crate::reduction::PredecessorOrder;

/// Visit the most recently created predecessor edge first.
pub struct ReverseInsertion;

/// Visit predecessor edges in the order in which they were created.
pub struct Insertion;

impl PredecessorOrder for ReverseInsertion {
    fn visit_order<T: Copy>(mut live: Vec<T>) -> Vec<T> {
        live.reverse();
        live
    }
}

impl PredecessorOrder for Insertion {
    fn visit_order<T: Copy>(live: Vec<T>) -> Vec<T> {
        live
    }
}
