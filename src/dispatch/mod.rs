//! Interactive routing of discovered files.
//!
//! The gate takes files from the watch session, asks the [`Prompter`] where
//! they go and under which name, and hands the move to the [`FileRouter`].

mod gate;
mod prompt;
mod router;

pub use gate::{
    DispatchGate, DispatchStats, DispatchStatsSnapshot, PromptStep, RouteOutcome,
    SharedDestinations, Submission,
};
pub use prompt::Prompter;
pub use router::{target_file_name, FileRouter};

#[cfg(test)]
pub(crate) use prompt::testing;
