//! Simulated code execution.
//!
//! JavaScript runs for real in a small sandboxed interpreter on a worker
//! thread; every other language gets a canned message.

mod ast;
mod builtins;
mod interp;
mod lexer;
mod parser;
mod value;

use crate::config::ExecutionConfig;
use crate::error::WorkspaceError;
use interp::Interpreter;
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Deepest call stack the worker thread can hold
pub const MAX_CALL_DEPTH: usize = 500;

/// Extra time the caller waits past the script's own deadline
const GRACE: Duration = Duration::from_millis(500);

pub const NO_OUTPUT: &str = "Code executed successfully (no output)";
pub const HTML_PREVIEW: &str = "HTML preview would render here in a real implementation";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("SyntaxError: {message} (line {line})")]
    Syntax { message: String, line: usize },

    /// A value thrown by the script and never caught
    #[error("{0}")]
    Uncaught(String),

    #[error("Step budget of {0} exhausted")]
    StepBudget(u64),

    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Maximum call stack size exceeded (depth {0})")]
    CallDepth(usize),

    #[error("Output limit of {0} lines exceeded")]
    OutputLimit(usize),

    #[error("Resource limit reached: {0}")]
    Resource(&'static str),

    #[error("Execution worker failed: {0}")]
    Worker(String),
}

/// Budgets enforced on every live run
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    pub step_budget: u64,
    pub time_budget: Duration,
    pub max_output_lines: usize,
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for Limits {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            step_budget: config.step_budget,
            time_budget: config.time_budget(),
            max_output_lines: config.max_output_lines,
            max_call_depth: config.max_call_depth.clamp(1, MAX_CALL_DEPTH),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionSimulator {
    limits: Limits,
}

impl ExecutionSimulator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Turn `(code, language)` into terminal output. Never fails.
    pub fn run(&self, code: &str, language: &str) -> String {
        match language {
            "javascript" | "js" => match self.execute(code) {
                Ok(lines) if lines.is_empty() => NO_OUTPUT.to_string(),
                Ok(lines) => lines.join("\n"),
                Err(e) => {
                    log::info!("Script failed: {}", e);
                    WorkspaceError::Execution(e.to_string()).to_string()
                }
            },
            "html" => HTML_PREVIEW.to_string(),
            other => format!(
                "Running {} code is currently simulated.\nCode received ({} characters)",
                other,
                code.chars().count()
            ),
        }
    }

    /// Run a script on a fresh worker thread and collect its console output
    pub fn execute(&self, code: &str) -> Result<Vec<String>, ExecutionError> {
        let (tx, rx) = mpsc::channel();
        let source = code.to_string();
        let limits = self.limits.clone();
        let wait = limits.time_budget + GRACE;

        let handle = std::thread::Builder::new()
            .name("nebula-exec".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let result = parser::parse_program(&source)
                    .and_then(|program| Interpreter::new(limits).run(&program));
                let _ = tx.send(result);
            })
            .map_err(|e| ExecutionError::Worker(e.to_string()))?;

        match rx.recv_timeout(wait) {
            Ok(result) => {
                if handle.join().is_err() {
                    log::warn!("Execution worker panicked after reporting");
                }
                result
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The worker checks its own deadline and will wind down.
                log::warn!("Execution worker did not answer within {:?}", wait);
                Err(ExecutionError::Timeout(wait.as_millis() as u64))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let reason = match handle.join() {
                    Err(_) => "worker panicked",
                    Ok(()) => "worker exited without a result",
                };
                Err(ExecutionError::Worker(reason.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_js(code: &str) -> String {
        ExecutionSimulator::default().run(code, "javascript")
    }

    #[test]
    fn test_console_log() {
        assert_eq!(run_js("console.log(1 + 1)"), "2");
        assert_eq!(
            ExecutionSimulator::default().run("console.log('a'); console.log('b')", "js"),
            "a\nb"
        );
    }

    #[test]
    fn test_no_output() {
        assert_eq!(run_js("const x = 1;"), NO_OUTPUT);
        assert_eq!(run_js(""), NO_OUTPUT);
    }

    #[test]
    fn test_other_languages_are_simulated() {
        let sim = ExecutionSimulator::default();
        assert_eq!(sim.run("<p>hi</p>", "html"), HTML_PREVIEW);
        assert_eq!(
            sim.run("fn main() {}", "rust"),
            "Running rust code is currently simulated.\nCode received (12 characters)"
        );
        // Only the exact lowercase tags run live
        assert!(sim.run("console.log(1)", "JavaScript").starts_with("Running JavaScript"));
    }

    #[test]
    fn test_errors_become_output() {
        assert_eq!(
            run_js("throw new Error('boom')"),
            "Error executing code: boom"
        );
        assert_eq!(
            run_js("undefinedThing()"),
            "Error executing code: undefinedThing is not defined"
        );
        assert_eq!(
            run_js("let a = ;"),
            "Error executing code: SyntaxError: Unexpected token ';' (line 1)"
        );
        assert_eq!(run_js("throw 'plain'"), "Error executing code: plain");
    }

    #[test]
    fn test_runaway_loop_hits_budget() {
        let sim = ExecutionSimulator::new(Limits {
            step_budget: 10_000,
            ..Limits::default()
        });
        assert_eq!(
            sim.execute("while (true) {}"),
            Err(ExecutionError::StepBudget(10_000))
        );
        assert!(sim.run("for (;;) {}", "javascript").starts_with("Error executing code:"));
    }

    #[test]
    fn test_deadline_stops_worker() {
        let sim = ExecutionSimulator::new(Limits {
            step_budget: u64::MAX,
            time_budget: Duration::from_millis(50),
            ..Limits::default()
        });
        assert_eq!(
            sim.execute("while (true) {}"),
            Err(ExecutionError::Timeout(50))
        );
    }

    #[test]
    fn test_recursion_depth_is_limited() {
        let result = ExecutionSimulator::default().execute("function f(n) { return f(n + 1) } f(0)");
        assert_eq!(result, Err(ExecutionError::CallDepth(200)));
    }

    #[test]
    fn test_configured_call_depth_is_clamped() {
        let config = ExecutionConfig {
            max_call_depth: 100_000,
            ..ExecutionConfig::default()
        };
        let sim = ExecutionSimulator::new(Limits::from(&config));
        let result =
            sim.execute("function f(n) { return n === 0 ? 0 : 1 + f(n - 1) } console.log(f(50000))");
        assert_eq!(result, Err(ExecutionError::CallDepth(MAX_CALL_DEPTH)));
    }

    #[test]
    fn test_deeply_nested_templates_fail_cleanly() {
        let source = format!("console.log({}1{})", "`${".repeat(5000), "}`".repeat(5000));
        let result = ExecutionSimulator::default().execute(&source);
        assert!(matches!(result, Err(ExecutionError::Syntax { .. })));
        assert!(ExecutionSimulator::default()
            .run(&source, "javascript")
            .starts_with("Error executing code: SyntaxError"));
    }

    #[test]
    fn test_output_cap() {
        let sim = ExecutionSimulator::new(Limits {
            max_output_lines: 3,
            ..Limits::default()
        });
        assert_eq!(
            sim.execute("for (let i = 0; i < 10; i++) console.log(i)"),
            Err(ExecutionError::OutputLimit(3))
        );
    }

    #[test]
    fn test_closures_and_scopes() {
        let out = run_js(
            r#"
            function counter() {
                let n = 0;
                return () => ++n;
            }
            const c = counter();
            c(); c();
            console.log(c());

            const fns = [];
            for (const i of [1, 2, 3]) fns.push(() => i * 10);
            console.log(fns.map(f => f()).join(","));

            var hoisted = later();
            function later() { return "hoisted"; }
            console.log(hoisted);
            "#,
        );
        assert_eq!(out, "3\n10,20,30\nhoisted");
    }

    #[test]
    fn test_try_catch_finally() {
        let out = run_js(
            r#"
            try {
                null.x;
            } catch (e) {
                console.log(e.message);
            } finally {
                console.log("done");
            }
            const k = 1;
            try { k = 2; } catch (e) { console.log(e.name); }
            "#,
        );
        assert_eq!(
            out,
            "Cannot read properties of null (reading 'x')\ndone\nTypeError"
        );
    }

    #[test]
    fn test_budget_errors_skip_catch() {
        let sim = ExecutionSimulator::new(Limits {
            step_budget: 5_000,
            ..Limits::default()
        });
        let result = sim.execute("try { while (true) {} } catch (e) { console.log('caught') }");
        assert_eq!(result, Err(ExecutionError::StepBudget(5_000)));
    }

    #[test]
    fn test_operators_and_templates() {
        let out = run_js(
            r#"
            const name = "Nebula";
            console.log(`Hello, ${name}! ${1 + 2}`);
            console.log(1 == "1", 1 === "1", null == undefined, NaN === NaN);
            console.log(typeof name, typeof missing, typeof null, typeof (() => 1));
            console.log(7 % 3, 2 ** 10, 5 / 2, "3" * "4", 1 + "2");
            let x = 5; x += 2; x *= 3;
            console.log(x, x++ + ++x, x);
            console.log(null ?? "fallback", 0 || "or", 1 && "and", !0);
            console.log(-7 >> 1, -7 >>> 28, 5 & 3, 5 | 3, 5 ^ 3, ~5);
            const o = { a: { b: 1 } };
            console.log(o?.a?.b, o.missing?.b, o["a"].b);
            "#,
        );
        assert_eq!(
            out,
            [
                "Hello, Nebula! 3",
                "true false true false",
                "string undefined object function",
                "1 1024 2.5 12 12",
                "21 44 23",
                "fallback or and true",
                "-4 15 1 7 6 -6",
                "1 undefined 1",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_loops_and_control_flow() {
        let out = run_js(
            r#"
            let total = 0;
            for (let i = 0; i < 10; i++) {
                if (i % 2) continue;
                if (i > 6) break;
                total += i;
            }
            let n = 0;
            do { n++; } while (n < 3);
            const keys = [];
            for (const k in { x: 1, y: 2 }) keys.push(k);
            let w = 3;
            while (w--) {}
            console.log(total, n, keys.join(""), w);
            "#,
        );
        assert_eq!(out, "12 3 xy -1");
    }

    #[test]
    fn test_constructors_and_this() {
        let out = run_js(
            r#"
            function Point(x, y) { this.x = x; this.y = y; }
            const p = new Point(1, 2);
            const obj = {
                label: "obj",
                describe() { return this.label + ":" + p.x; },
            };
            console.log(obj.describe(), JSON.stringify(p));
            console.log(new Error("e1"));
            "#,
        );
        assert_eq!(out, "obj:1 {\"x\":1,\"y\":2}\nError: e1");
    }

    #[test]
    fn test_runs_are_isolated() {
        let sim = ExecutionSimulator::default();
        assert_eq!(sim.run("var leaked = 1; console.log(leaked)", "js"), "1");
        assert_eq!(
            sim.run("console.log(leaked)", "js"),
            "Error executing code: leaked is not defined"
        );
    }
}
