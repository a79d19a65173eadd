pub mod snapshot;
pub mod feed;
pub mod derived;
pub mod refresh;

pub use snapshot::MetricsSnapshot;
pub use feed::{open_source, FeedError, FeedKind, FeedOptions, MetricsSource};
pub use derived::{DashboardSummary, DerivedError};
pub use refresh::RefreshLoop;
