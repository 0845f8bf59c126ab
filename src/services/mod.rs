pub mod controller;
pub mod feed;
pub mod interaction;
pub mod preference_store;
pub mod recommender;
pub mod session;

pub use controller::{DashboardView, FeedController, FeedSettings};
pub use interaction::{Clock, InteractionLogger, OpenedItem, ReadOutcome, SystemClock};
pub use preference_store::{FileStorage, MemoryStorage, PreferenceStore, SnapshotStorage};
pub use recommender::{HttpRecommendationClient, RecommendationApi};
pub use session::SessionIdentity;
