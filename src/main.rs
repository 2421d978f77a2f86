use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor::MoveTo,
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures_util::future::join_all;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;

use feedwatch::demo::demo_feed;
use feedwatch::ui::console::{stats_report, summary_report};
use feedwatch::{
    events, spawn_poller, ui, App, DataSource, FailurePolicy, FeedClient, Schedule, SensorSuite,
    Settings,
};
use feedwatch_types::{local_now, MAX_WINDOW_HOURS};

#[derive(Parser, Debug)]
#[command(name = "feedwatch", version)]
#[command(about = "Console dashboard for environmental sensors published on Adafruit IO")]
struct Args {
    /// Settings file (TOML). Defaults to ./feedwatch.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// How the sensors of one refresh are fetched
    #[arg(long, global = true, value_enum)]
    schedule: Option<Schedule>,

    /// What to do when a sensor fails to refresh
    #[arg(long, global = true, value_enum)]
    on_error: Option<FailurePolicy>,

    /// Use generated data instead of the live service (no credentials needed)
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest reading of every sensor
    Stats,

    /// Show last, min and max of every sensor over a window
    Summary {
        /// Window in hours (overrides the configured windows)
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Live dashboard
    Watch {
        /// Refresh interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Compare sequential and concurrent refreshes of several suites
    Bench {
        /// Number of independent suites to refresh
        #[arg(short, long, default_value_t = 3)]
        runs: usize,
    },

    /// Refresh once and write the snapshot as JSON
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Window in hours (overrides the configured windows)
        #[arg(long)]
        hours: Option<u32>,
    },
}

fn main() -> Result<()> {
    env_file_loaded(dotenvy::dotenv())?;
    let args = Args::parse();

    let interactive = matches!(args.command, Command::Watch { .. });
    init_tracing(interactive)?;

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(schedule) = args.schedule {
        settings.schedule = schedule;
    }
    if let Some(policy) = args.on_error {
        settings.on_error = policy;
    }
    match &args.command {
        Command::Summary { hours: Some(hours) } | Command::Export { hours: Some(hours), .. } => {
            override_window(&mut settings, *hours)?;
        }
        Command::Watch { interval: Some(secs) } => settings.refresh_secs = (*secs).max(1),
        _ => {}
    }

    let client: Arc<dyn FeedClient> = if args.demo {
        Arc::new(demo_feed(&settings))
    } else {
        Arc::new(settings.build_client()?)
    };
    tracing::debug!(client = client.description(), "feed client ready");

    let rt = Runtime::new()?;

    match args.command {
        Command::Stats => run_stats(&rt, &settings, client.as_ref()),
        Command::Summary { .. } => run_summary(&rt, &settings, client.as_ref()),
        Command::Watch { .. } => run_watch(&rt, &settings, client),
        Command::Bench { runs } => run_bench(&rt, &settings, client.as_ref(), runs.max(1)),
        Command::Export { output, .. } => run_export(&rt, &settings, client.as_ref(), &output),
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn env_file_loaded<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("loading .env"),
    }
}

/// Logs go to stderr. The dashboard owns the terminal, so it only logs when
/// `RUST_LOG` asks for it.
fn init_tracing(interactive: bool) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if interactive => return Ok(()),
        Err(_) => "warn".into(),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

fn override_window(settings: &mut Settings, hours: u32) -> Result<()> {
    anyhow::ensure!(hours > 0, "--hours must be greater than zero");
    anyhow::ensure!(
        hours <= MAX_WINDOW_HOURS,
        "--hours must be at most {}",
        MAX_WINDOW_HOURS
    );
    settings.window_hours = hours;
    for sensor in &mut settings.sensors {
        sensor.window_hours = None;
    }
    Ok(())
}

fn clear_console() -> Result<()> {
    let mut stdout = io::stdout();
    if stdout.is_terminal() {
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    }
    Ok(())
}

fn run_stats(rt: &Runtime, settings: &Settings, client: &dyn FeedClient) -> Result<()> {
    let suite = settings.build_suite();
    let latest = rt.block_on(suite.fetch_latest(client))?;

    clear_console()?;
    print!("{}", stats_report(&latest, local_now()));
    Ok(())
}

fn run_summary(rt: &Runtime, settings: &Settings, client: &dyn FeedClient) -> Result<()> {
    let mut suite = settings.build_suite();
    rt.block_on(suite.refresh_all(client))?;

    clear_console()?;
    print!("{}", summary_report(&suite.snapshot()));
    Ok(())
}

fn run_export(
    rt: &Runtime,
    settings: &Settings,
    client: &dyn FeedClient,
    output: &Path,
) -> Result<()> {
    let mut suite = settings.build_suite();
    rt.block_on(suite.refresh_all(client))?;

    let json = serde_json::to_string_pretty(&suite.snapshot())?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    println!("Exported snapshot to: {}", output.display());
    Ok(())
}

/// Refresh `runs` independent suites one after another with the sequential
/// schedule, then all at once with the concurrent schedule.
fn run_bench(rt: &Runtime, settings: &Settings, client: &dyn FeedClient, runs: usize) -> Result<()> {
    let suites = |schedule| -> Vec<SensorSuite> {
        (0..runs)
            .map(|_| {
                settings
                    .build_suite()
                    .with_schedule(schedule)
                    .with_policy(FailurePolicy::Continue)
            })
            .collect()
    };

    let mut sequential = suites(Schedule::Sequential);
    let start = Instant::now();
    let failed: usize = rt.block_on(async {
        let mut failed = 0;
        for suite in &mut sequential {
            failed += refresh_failures(suite, client).await;
        }
        failed
    });
    let sequential_time = start.elapsed();

    let mut concurrent = suites(Schedule::Concurrent);
    let start = Instant::now();
    let failed_concurrent: usize = rt.block_on(async {
        join_all(concurrent.iter_mut().map(|suite| refresh_failures(suite, client)))
            .await
            .into_iter()
            .sum()
    });
    let concurrent_time = start.elapsed();

    let sensors = settings.sensors.len();
    println!("{} suites x {} sensors via {}", runs, sensors, client.description());
    println!("  sequential  {:>10.2?}  ({} failed)", sequential_time, failed);
    println!("  concurrent  {:>10.2?}  ({} failed)", concurrent_time, failed_concurrent);
    if !concurrent_time.is_zero() {
        println!(
            "  speedup     {:>9.1}x",
            sequential_time.as_secs_f64() / concurrent_time.as_secs_f64()
        );
    }
    Ok(())
}

async fn refresh_failures(suite: &mut SensorSuite, client: &dyn FeedClient) -> usize {
    match suite.refresh_all(client).await {
        Ok(report) => report.failed.len(),
        Err(_) => 1,
    }
}

fn run_watch(rt: &Runtime, settings: &Settings, client: Arc<dyn FeedClient>) -> Result<()> {
    let suite = settings.build_suite();
    let interval = settings.refresh_interval();

    // The refresh task keeps running on the runtime's workers after block_on returns
    let (source, handle) = rt.block_on(async { spawn_poller(suite, client, interval) });

    let result = run_tui(Box::new(source), settings.stale_after_minutes);

    handle.abort();
    result
}

/// Run the dashboard with the given data source
fn run_tui(source: Box<dyn DataSource>, stale_after_minutes: i64) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(source, stale_after_minutes);
    app.reload_data();

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered =
                    ratatui::layout::Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                        .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(12),   // Table and trend
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::summary::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                // Content starts after header (1) + table border (1) + table header (1)
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 2),
                _ => {}
            }
        }

        app.reload_data();
    }

    Ok(())
}
