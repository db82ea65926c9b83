pub mod tree_compare;

pub use tree_compare::{documents_equal, trees_equal};
