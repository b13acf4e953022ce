pub mod context;
pub mod error;
pub mod items;
pub mod materials;
pub mod sync;
pub mod tree;
pub mod versions;

pub use context::{SyncContext, SyncStats};
pub use error::SyncError;
pub use sync::{sync_bom, SyncOutcome};
pub use tree::{Forest, TreeNode};
