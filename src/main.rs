//! MProbe Workshop - Main Entry Point
//!
//! Loads a problem instance, analyses every constraint and objective in the
//! background and prints the workshop tables through their filters.
//!
//! With the `native` feature, problem files given on the command line are
//! opened by `libmprobe` (reader plugins from `MPROBE_PLUGIN_DIR`). Otherwise
//! the built-in sample problem of the mock library is used.

use anyhow::Context;
use mprobe_workshop::{
    backend::ProblemLoader,
    config::AppConfig,
    histogram::HistType,
    table::{ConstraintColumn, VariableColumn},
    EntityKind, Session, TableModel, TaskEvent, TaskOutcome, WorkshopId,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[cfg(feature = "mock-library")]
const SAMPLE_INSTANCE: &str = "sample.nl";

fn init_logging() -> Option<WorkerGuard> {
    let (file_layer, guard) = match AppConfig::log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mprobe-workshop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mprobe_workshop=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

/// Pick the analysis library and the files making up the instance
fn open_library(files: Vec<PathBuf>) -> anyhow::Result<(Box<dyn ProblemLoader>, Vec<PathBuf>)> {
    #[cfg(feature = "native")]
    {
        if !files.is_empty() {
            let plugins = std::env::var_os("MPROBE_PLUGIN_DIR").map(PathBuf::from);
            let library = mprobe_workshop::backend::NativeLibrary::new(plugins.as_deref())?;
            return Ok((Box::new(library), files));
        }
    }

    #[cfg(feature = "mock-library")]
    {
        use mprobe_workshop::backend::{MockLibrary, MockProblem};

        if !files.is_empty() {
            tracing::warn!("Native library not enabled, ignoring {} file(s)", files.len());
        }
        let path = PathBuf::from(SAMPLE_INSTANCE);
        let library = MockLibrary::new().with_instance(path.clone(), MockProblem::sample());
        return Ok((Box::new(library), vec![path]));
    }

    #[cfg(not(feature = "mock-library"))]
    {
        let _ = files;
        anyhow::bail!("No problem files given")
    }
}

/// Analyse every function of a workshop, printing progress until done
fn run_analysis(
    session: &mut Session,
    id: WorkshopId,
    close_delay: Duration,
) -> anyhow::Result<TaskOutcome> {
    let extra_histograms = session.config().extra_histograms;
    let workshop = session.workshop_mut(id).context("Workshop was closed")?;
    workshop.set_extra_histograms(extra_histograms);
    workshop.analyze_all()?;

    let outcome = loop {
        let mut finished = None;
        for (event_id, event) in session.poll() {
            if event_id != id {
                continue;
            }
            match event {
                TaskEvent::Progress { percent, action } => println!("[{:>3}%] {}", percent, action),
                TaskEvent::Finished(outcome) => finished = Some(outcome),
            }
        }
        if let Some(outcome) = finished {
            break outcome;
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    // Keep the finished progress line up like the dialog would
    std::thread::sleep(close_delay);
    Ok(outcome)
}

fn print_presets(session: &mut Session, id: WorkshopId) -> anyhow::Result<()> {
    let workshop = session.workshop_mut(id).context("Workshop was closed")?;
    println!("\n{} filters:", workshop.kind().title());
    for filter in workshop.presets() {
        workshop.select_filter(filter.predicate.clone());
        let shown = workshop.count_label();
        workshop.toggle_reverse();
        let reversed = workshop.count_label();
        workshop.toggle_reverse();
        println!("  {:<18} {:<28} reversed: {}", filter.name, shown, reversed);
    }
    workshop.select_preset("All")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_logging();
    tracing::info!("Starting MProbe workshop");

    let config = AppConfig::load_or_default();
    let close_delay = Duration::from_millis(config.progress_close_delay_ms);
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let (library, files) = open_library(files)?;

    let mut session = Session::new(config);
    session
        .load(library.as_ref(), &files)
        .context("Failed to load problem")?;
    println!("{}", session.statistics()?);

    let variables = session.open_workshop(EntityKind::Variable);
    let constraints = session.open_workshop(EntityKind::Constraint);
    let objectives = session.open_workshop(EntityKind::Objective);

    for id in [constraints, objectives] {
        let outcome = run_analysis(&mut session, id, close_delay)?;
        println!(
            "Analysed {} of {} ({} failed{})",
            outcome.completed.len(),
            outcome.total,
            outcome.failed.len(),
            if outcome.cancelled { ", cancelled" } else { "" }
        );
    }

    for id in [variables, constraints, objectives] {
        print_presets(&mut session, id)?;
    }

    if let Some(table) = session
        .workshop(constraints)
        .and_then(|w| w.constraint_table())
    {
        println!("\nEffectiveness:");
        for row in 0..table.row_count() {
            let name = table.value(row, ConstraintColumn::Name.index());
            println!("  {:<12} {}", name.to_string(), table.effectiveness_text(row));
        }
    }

    session.select_objective(0);
    if let Some(workshop) = session.workshop(variables) {
        println!("\nBest point for objective 0:");
        for row in workshop.visible_rows() {
            println!(
                "  {:<12} {}",
                workshop.value(row, VariableColumn::Name.index()).to_string(),
                workshop.value(row, VariableColumn::BestPoint.index())
            );
        }
    }

    let related = session.show_constraints_with_variable(0)?;
    if let Some(workshop) = session.workshop(constraints) {
        println!(
            "\nConstraints using variable 0 ({} view(s)): {}",
            related,
            workshop.count_label()
        );
    }

    for hist in HistType::ALL {
        match session.histogram(hist) {
            Ok(stats) => println!(
                "{} histogram: {} points, mean {:.3}, std dev {:.3}",
                hist, stats.data_points, stats.mean, stats.std_dev
            ),
            Err(e) => tracing::warn!("No {} histogram: {}", hist, e),
        }
    }

    match session.trace(constraints) {
        Ok(path) => println!("\nTrace appended to {}", path.display()),
        Err(e) => tracing::warn!("Trace failed: {}", e),
    }

    session.save_config();
    tracing::info!("Shutting down...");
    Ok(())
}
