//! Shared run storage: the URL work queue and the visit dataset

mod queue;
mod writer;

pub use queue::{expand_sessions, load_urls_from_file, UrlQueue};
pub use writer::{DatasetWriter, VisitRecord};
