mod node;
mod settings;
mod snapshot;

pub use node::{classify, same_shallow, BookmarkShape, Kind, LocalNode, Node, NodeId};
pub use settings::Settings;
pub use snapshot::{now, Category, Snapshot, Timestamp};
