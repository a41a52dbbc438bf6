mod core;

pub use self::core::{App, Job};
