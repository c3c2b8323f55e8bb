// Sieve: moderation-gated completion proxy for Claude
//
// This is the library root. Each module corresponds to one stage or
// collaborator of the moderated completion pipeline.

pub mod config;
pub mod generation;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod web;
