//! # Repository Implementations
//!
//! One repository per storage concern. The sync engine only needs the state
//! repository today; new concerns get their own module here.

pub mod state;
