// Text generation — the TextGenerator trait and its Claude implementation.

pub mod claude;
pub mod traits;
