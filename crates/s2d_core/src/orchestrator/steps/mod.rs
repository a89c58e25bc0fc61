//! Pipeline step implementations.
//!
//! One step per job stage, in this order: export, invoke, decode, publish.

mod decode;
mod export;
mod invoke;
mod publish;

pub use decode::DecodeStep;
pub use export::ExportStep;
pub use invoke::InvokeStep;
pub use publish::PublishStep;
