mod instance;
mod summarizer;

pub(crate) use instance::{extract_instances, Instance, InstanceColumns};
pub(crate) use summarizer::Summarizer;
