//! Services - the exposure-matching pipeline and its task wrapper
//!
//! - `history_parser` - month files to one flat timeline
//! - `visit_filter` - place visits overlapping the lookback window
//! - `exposure_table` - known exposure windows by place id
//! - `contact_matcher` - visits overlapping a known exposure
//! - `pipeline` - read, parse and filter in one call
//! - `cancelable` - cancelable blocking task
//! - `check_session` - latest-submission-wins contact computation

pub mod cancelable;
pub mod check_session;
pub mod contact_matcher;
pub mod exposure_table;
pub mod history_parser;
pub mod pipeline;
pub mod visit_filter;

// Re-export commonly used types
pub use cancelable::{CancelableTask, Canceler};
pub use check_session::{CheckSession, CheckStatus, SessionSnapshot};
pub use contact_matcher::{count_contacts, find_contacts, match_contacts, ContactReport};
pub use exposure_table::{ExposureSource, ExposureTable};
pub use pipeline::{collect_recent_visits, CheckError};
