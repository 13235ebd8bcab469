// Commands module - operations exposed to the presentation layer

pub mod common;
pub mod note;
pub mod settings;
