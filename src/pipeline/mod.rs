// The moderation-gated completion pipeline.

pub mod completion;

pub use completion::{
    CompletionRequest, CompletionResult, ModeratedCompletion, Outcome, PipelineOptions,
};
