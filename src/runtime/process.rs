// src/runtime/process.rs
//! Default global bindings: `process` and `console`
//!
//! `process.exit` here is the real termination primitive. Harness loads
//! shadow it with the fake termination signal.

use crate::runtime::value::{ObjectLike, PlainObject, Value};
use crate::utils::errors::Result;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Exit status requested by a termination call; `process.exit()` means 0
///
/// Numeric strings are coerced, so `process.exit("5")` requests 5.
pub fn exit_code_arg(args: &[Value]) -> i32 {
    args.first()
        .and_then(|arg| match arg {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|code| code.is_finite())
        .map(|code| code as i32)
        .unwrap_or(0)
}

/// Build the `process` global
pub fn process_object(cwd: &Path) -> PlainObject {
    let cwd = cwd.display().to_string();

    let env = PlainObject::new();
    for (key, value) in std::env::vars() {
        env.set(&key, Value::from(value));
    }

    let argv = std::env::args().map(Value::from).collect::<Vec<_>>();

    PlainObject::new()
        .with("exit", Value::function("exit", real_exit))
        .with("cwd", Value::function("cwd", move |_| Ok(Value::from(cwd.as_str()))))
        .with("platform", std::env::consts::OS)
        .with("pid", std::process::id() as f64)
        .with("argv", Value::Array(argv))
        .with("env", Value::from_object(env))
        .with("version", crate::VERSION)
}

fn real_exit(args: &[Value]) -> Result<Value> {
    let code = exit_code_arg(args);
    warn!("Module code terminated the process with code {}", code);
    std::process::exit(code)
}

/// Build the `console` global, forwarding to `tracing`
pub fn console_object() -> PlainObject {
    PlainObject::new()
        .with("log", Value::function("log", |args| log_line(Level::Info, args)))
        .with("info", Value::function("info", |args| log_line(Level::Info, args)))
        .with("debug", Value::function("debug", |args| log_line(Level::Debug, args)))
        .with("warn", Value::function("warn", |args| log_line(Level::Warn, args)))
        .with("error", Value::function("error", |args| log_line(Level::Error, args)))
}

#[derive(Clone, Copy)]
enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

fn log_line(level: Level, args: &[Value]) -> Result<Value> {
    let line = format_args_line(args);
    match level {
        Level::Debug => debug!(target: "plugin", "{}", line),
        Level::Info => info!(target: "plugin", "{}", line),
        Level::Warn => warn!(target: "plugin", "{}", line),
        Level::Error => error!(target: "plugin", "{}", line),
    }
    Ok(Value::Undefined)
}

fn format_args_line(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_arg() {
        assert_eq!(exit_code_arg(&[]), 0);
        assert_eq!(exit_code_arg(&[Value::from(5)]), 5);
        assert_eq!(exit_code_arg(&[Value::from("5")]), 5);
        assert_eq!(exit_code_arg(&[Value::from(" 12 ")]), 12);
        assert_eq!(exit_code_arg(&[Value::from("five")]), 0);
        assert_eq!(exit_code_arg(&[Value::Bool(true)]), 0);
        assert_eq!(exit_code_arg(&[Value::from(f64::NAN)]), 0);
    }

    #[test]
    fn test_process_members() {
        let process = process_object(Path::new("/work"));
        assert_eq!(process.get("exit").type_of(), "function");
        assert_eq!(process.get("platform").as_str(), Some(std::env::consts::OS));
        assert_eq!(process.get("cwd").call(&[]).unwrap().as_str(), Some("/work"));
        assert_eq!(process.get("env").type_of(), "object");
    }

    #[test]
    fn test_console_formats_arguments() {
        assert_eq!(
            format_args_line(&[Value::from("ready:"), Value::from(3), Value::Bool(true)]),
            "ready: 3 true"
        );
        let console = console_object();
        assert!(console.get("log").call(&[Value::from("hi")]).unwrap().is_undefined());
    }
}
