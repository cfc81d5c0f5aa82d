//! Command synthesis: from a [`ValidSpec`](crate::encoding::ValidSpec) to an
//! [`InvocationPlan`].

mod error;
mod plan;
mod synthesize;

pub use error::SynthesisError;
pub use plan::InvocationPlan;
pub use synthesize::{format_seconds, path_arg, CommandSynthesizer};
