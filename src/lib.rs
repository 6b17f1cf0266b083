pub mod cmd;
pub mod config;
pub mod error;
pub mod highlight;
pub mod navigator;
pub mod parsers;
pub mod pipeline;
pub mod recent;
pub mod search;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Config;
pub use error::{DecodeError, ExtractionError, StoreError};
pub use highlight::{render, Segment, SegmentKind};
pub use navigator::MatchNavigator;
pub use pipeline::ExtractionPipeline;
pub use recent::{JsonFileStore, MemoryStore, RecentUploads};
pub use search::{search, Match, MatchSet};
pub use session::{ExtractionOutcome, ExtractionTicket, Session};
pub use types::{Document, FailurePolicy, FormatTag};
pub use utils::parse_format;
