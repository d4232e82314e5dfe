//! Suites compiled into the binary.

pub mod hdfs_to_azure;

use crate::errors::Result;
use crate::registry::Suite;

/// Every built-in suite, in registration order.
pub fn builtin() -> Result<Vec<Suite>> {
    Ok(vec![hdfs_to_azure::suite()?])
}
