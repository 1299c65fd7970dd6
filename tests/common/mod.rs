// tests/common/mod.rs

#![allow(dead_code)]

pub use tsc_util_test_utils::builders;
pub use tsc_util_test_utils::fakes;
pub use tsc_util_test_utils::{init_tracing, with_timeout};
