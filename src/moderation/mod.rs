// Content moderation — trait-based abstraction over the moderation provider.
//
// The ContentModerator trait defines the interface. AzureContentSafety
// implements it using Azure AI Content Safety. The pipeline only ever sees
// the trait, so tests drive it with in-process stubs.

pub mod azure;
pub mod traits;
