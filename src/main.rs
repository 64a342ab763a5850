// primer: run and step through annotated lesson pages

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use primer::lesson::report::{render_report, Summary};
use primer::lesson::{LessonRunner, Playground, RunnerConfig};
use primer::ui::App;

#[derive(Parser)]
#[command(name = "primer")]
#[command(about = "Run and step through annotated lesson pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every unit and print a pass/fail report
    Run {
        /// A .lesson page or a playground directory
        path: PathBuf,

        #[command(flatten)]
        runner: RunnerArgs,

        /// Only print failing units and the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Step through the units in a terminal UI
    View {
        /// A .lesson page or a playground directory
        path: PathBuf,

        #[command(flatten)]
        runner: RunnerArgs,
    },
}

/// Flags that override the manifest's `[runner]` table
#[derive(Args)]
struct RunnerArgs {
    /// Only units whose name contains this text (case-insensitive)
    #[arg(short, long)]
    filter: Option<String>,

    /// Skip the units derived from exercise lines
    #[arg(long)]
    no_exercises: bool,

    /// Statement budget per unit
    #[arg(long)]
    max_steps: Option<usize>,

    /// Maximum nested function calls
    #[arg(long)]
    max_call_depth: Option<usize>,
}

impl RunnerArgs {
    /// Defaults, then the manifest, then these flags
    fn config(&self, playground: &Playground) -> RunnerConfig {
        let mut config = RunnerConfig::default();
        config.apply_settings(&playground.settings);
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(max_call_depth) = self.max_call_depth {
            config.max_call_depth = max_call_depth;
        }
        if self.no_exercises {
            config.exercises = false;
        }
        config.filter = self.filter.clone();
        config
    }
}

fn load(path: &Path) -> Result<Playground> {
    Playground::load(path).with_context(|| format!("Failed to load lessons from {}", path.display()))
}

fn run(path: &Path, args: &RunnerArgs, quiet: bool) -> Result<ExitCode> {
    let playground = load(path)?;
    let runner = LessonRunner::new(args.config(&playground));
    let units = runner.select(&playground.units);
    if units.is_empty() {
        bail!("No lesson units match in {}", path.display());
    }

    let results = runner.run_all(&units);
    print!("{}", render_report(&results, quiet));

    if Summary::of(&results).all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn view(path: &Path, args: &RunnerArgs) -> Result<ExitCode> {
    let playground = load(path)?;
    let mut config = args.config(&playground);
    config.record_trace = true;
    let runner = LessonRunner::new(config);
    let units = runner.select(&playground.units);
    if units.is_empty() {
        bail!("No lesson units match in {}", path.display());
    }
    let results = runner.run_all(&units);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(playground.title, units, results);
    let res = app.run(&mut terminal);

    // Restore the terminal before reporting any UI error
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("Viewer failed")?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run {
            path,
            runner,
            quiet,
        } => run(path, runner, *quiet),
        Commands::View { path, runner } => view(path, runner),
    }
}
