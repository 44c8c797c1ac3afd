//! Command line definition, shared with the xtask for man pages and
//! completions

pub mod cli;
