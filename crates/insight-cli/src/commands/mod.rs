pub mod analyze;
pub mod context;
pub mod dissect;
pub mod examples;
pub mod extract;
pub mod input;
pub mod preview;
pub mod repl;

pub use analyze::AnalyzeArgs;
pub use dissect::DissectArgs;
pub use examples::ExamplesArgs;
pub use extract::ExtractArgs;
pub use preview::PreviewArgs;
pub use repl::ReplArgs;
