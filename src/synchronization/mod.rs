mod builder;
mod config;
mod kind;
mod null;
mod scratch;
mod simple;
mod synchronizer;

pub use builder::SyncBuilder;
pub use config::{SyncConfig, TAG_SEPARATOR, strip_tag};
pub use kind::SyncKind;
pub(crate) use null::NullSync;
pub(crate) use scratch::ReductionScratch;
pub(crate) use simple::SimpleSync;
pub use synchronizer::Synchronizer;
