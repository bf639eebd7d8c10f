//! Colorful console output for solve events.
//!
//! Provides a `tracing` layer that formats the solver's `solve_start`,
//! `solve_end` and `constraint_suspended` events with colors.

use std::io::{self, Write};
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const TARGET: &str = "linrelax_solver";

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes console output for solve events.
///
/// Safe to call multiple times, only the first call has effect. `RUST_LOG`
/// directives are honored; solver events default to `info`.
pub fn init() {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("{TARGET}=info").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        // Another subscriber may already be installed by the host.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SolverConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats solve events with colors.
pub struct SolverConsoleLayer;

impl<S: Subscriber> Layer<S> for SolverConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with(TARGET) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_solver_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    solver: Option<String>,
    strategy: Option<String>,
    relaxation: Option<String>,
    status: Option<String>,
    constraint: Option<String>,
    constraint_count: Option<u64>,
    variable_count: Option<u64>,
    sweeps: Option<u64>,
    projections: Option<u64>,
    suspended: Option<u64>,
    relax_calls: Option<u64>,
    duration_ms: Option<u64>,
    max_error: Option<f64>,
    penalty: Option<f64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.record_str(field, s.trim_matches('"'));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "event" => &mut self.event,
            "solver" => &mut self.solver,
            "strategy" => &mut self.strategy,
            "relaxation" => &mut self.relaxation,
            "status" => &mut self.status,
            "constraint" => &mut self.constraint,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "constraint_count" => self.constraint_count = Some(value),
            "variable_count" => self.variable_count = Some(value),
            "sweeps" => self.sweeps = Some(value),
            "projections" => self.projections = Some(value),
            "suspended" => self.suspended = Some(value),
            "relax_calls" => self.relax_calls = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "max_error" => self.max_error = Some(value),
            "penalty" => self.penalty = Some(value),
            _ => {}
        }
    }
}

fn format_solver_event(v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("solve_start") => format_solve_start(v),
        Some("solve_end") => format_solve_end(v),
        Some("constraint_suspended") => format_suspended(v),
        _ => String::new(),
    }
}

fn format_solve_start(v: &EventVisitor) -> String {
    let solver = v.solver.as_deref().unwrap_or("Solver");
    let engine = match (&v.strategy, &v.relaxation) {
        (Some(strategy), Some(relaxation)) => format!("{strategy} over {relaxation}"),
        (None, Some(relaxation)) => relaxation.clone(),
        _ => "unknown".to_string(),
    };

    format!(
        "{} {} {} Solving started: engine ({}), constraint count ({}), variable count ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", solver).bright_cyan(),
        engine.white().bold(),
        v.constraint_count.unwrap_or(0).bright_yellow(),
        v.variable_count.unwrap_or(0).bright_yellow(),
    )
}

fn format_solve_end(v: &EventVisitor) -> String {
    let solver = v.solver.as_deref().unwrap_or("Solver");
    let status = v.status.as_deref().unwrap_or("unknown");

    let mut output = format!(
        "{} {} {} Solving ended: status ({}), time spent ({}), sweeps ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", solver).bright_cyan(),
        format_status(status),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        v.sweeps.unwrap_or(0).white(),
    );
    if let Some(max_error) = v.max_error {
        output.push_str(&format!(", max error ({})", format!("{:.3e}", max_error).bright_magenta()));
    }
    if let Some(projections) = v.projections {
        output.push_str(&format!(", projections ({})", projections.white()));
    }
    if let Some(suspended) = v.suspended {
        let count = if suspended > 0 {
            suspended.bright_red().to_string()
        } else {
            suspended.bright_green().to_string()
        };
        output.push_str(&format!(
            ", suspended ({}), sub-solves ({})",
            count,
            v.relax_calls.unwrap_or(0).white()
        ));
    }
    output
}

fn format_suspended(v: &EventVisitor) -> String {
    format!(
        "    {} suspended {} (penalty {})",
        "->".bright_blue(),
        v.constraint.as_deref().unwrap_or("?").white(),
        v.penalty.unwrap_or(0.0).yellow(),
    )
}

fn format_status(status: &str) -> String {
    match status {
        "optimal" => status.bright_green().bold().to_string(),
        "suboptimal" => status.yellow().bold().to_string(),
        _ => status.bright_red().bold().to_string(),
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}
