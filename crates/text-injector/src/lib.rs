//! Text injection into a located edit field.
//!
//! Methods are tried from least to most invasive until one is acknowledged by
//! the platform (or, under [`Strictness::VerifyByReadback`], until the field
//! reads back the target text).

pub mod api;
pub mod errors;
pub mod model;
pub mod policy;

mod runner;
mod wait;

pub use api::{TextInjector, TextInjectorBuilder};
pub use errors::InjectError;
pub use model::{InjectCtx, InjectionMethod, InjectionReport};
pub use policy::{InjectionPolicy, Strictness};
