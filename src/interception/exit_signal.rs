// src/interception/exit_signal.rs
//! Test-safe replacement for `process.exit`
//!
//! Instead of ending the process, the fake raises
//! `HarnessError::ProcessExit` carrying the requested status, which unwinds
//! the module's top-level code back to whoever triggered the load.

use crate::runtime::process::exit_code_arg;
use crate::runtime::value::Value;
use crate::utils::errors::{HarnessError, Result};
use tracing::debug;

/// Member of `process` replaced by the fake
pub const EXIT_MEMBER: &str = "exit";

/// Raise the termination signal for `code`
pub fn raise_process_exit(code: i32) -> Result<Value> {
    debug!("Intercepted process.exit({})", code);
    metrics::counter!("harness_process_exit_total").increment(1);
    Err(HarnessError::ProcessExit { code })
}

/// The fake termination primitive as a function value
pub fn fake_process_exit() -> Value {
    Value::function(EXIT_MEMBER, |args| raise_process_exit(exit_code_arg(args)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carries_status() {
        let err = fake_process_exit().call(&[Value::from(5)]).unwrap_err();
        assert_eq!(err.process_exit_code(), Some(5));
        assert_eq!(err.to_string(), "process.exit was called with code 5");
    }

    #[test]
    fn test_numeric_string_status_is_kept() {
        let err = fake_process_exit().call(&[Value::from("5")]).unwrap_err();
        assert_eq!(err.process_exit_code(), Some(5));
    }

    #[test]
    fn test_defaults_to_zero() {
        let err = fake_process_exit().call(&[]).unwrap_err();
        assert_eq!(err.process_exit_code(), Some(0));
    }

    #[test]
    fn test_is_a_function() {
        let exit = fake_process_exit();
        assert_eq!(exit.type_of(), "function");
        assert_eq!(exit.get("name").as_str(), Some("exit"));
    }
}
