//! Job processing module.

mod processor;
mod store;

pub use processor::{JobProcessor, JobWork};
pub use store::{JobRecord, JobStore, RetryWork};
