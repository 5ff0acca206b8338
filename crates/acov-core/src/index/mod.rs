pub mod file_index;
pub mod project;
pub mod tree;

pub use file_index::{graph_companion, FileCategory, FileIndex};
pub use project::{ProjectIndex, ProjectTrees};
pub use tree::TreeIndex;
