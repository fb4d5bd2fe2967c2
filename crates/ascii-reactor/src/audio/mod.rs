mod source_pipe;
mod spectrum;
mod synthetic;

pub use source_pipe::SourcePipe;
pub use synthetic::SyntheticSource;
