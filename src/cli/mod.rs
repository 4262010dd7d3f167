pub mod apps;
pub mod commands;
pub mod env;
pub mod locate;
pub mod output;
pub mod run;
pub mod runtime;
