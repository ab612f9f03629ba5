use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;

use deskshell::config::{self, get_settings};
use deskshell::desktop::{desktop_mode, DesktopExit};
use deskshell::{logging, sound};
use deskshell::ui::Term;

const USAGE: &str = "\
Usage: deskshell [OPTIONS]

Options:
  --config <path>  Read and write settings at <path>
  --no-sound       Disable audio cues for this run
  --help           Show this message";

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(ratatui::Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Command line ──────────────────────────────────────────────────────────────

struct Options {
    config: Option<PathBuf>,
    no_sound: bool,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut opts = Options {
        config: None,
        no_sound: false,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--no-sound" => opts.no_sound = true,
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config needs a path"))?;
                opts.config = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("unknown argument `{other}`\n\n{USAGE}"),
        }
    }
    Ok(Some(opts))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(opts) = parse_args(&args)? else {
        println!("{USAGE}");
        return Ok(());
    };

    if let Some(path) = opts.config {
        config::set_settings_path(path);
    }
    config::reload_settings();
    if opts.no_sound {
        sound::mute();
    }

    // The terminal is not ours yet, so this is the last chance to use stderr.
    if let Err(err) = logging::init(&config::log_file()) {
        eprintln!("warning: logging disabled: {err:#}");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sound = get_settings().sound && !opts.no_sound,
        "starting"
    );

    let mut terminal = init_terminal()?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        desktop_mode(&mut terminal)
    }));

    // Always restore terminal
    restore_terminal(&mut terminal).ok();

    match result {
        Ok(Ok(DesktopExit::PowerOff)) => {
            tracing::info!("powered off");
            println!("It is now safe to turn off your computer.");
            Ok(())
        }
        Ok(Ok(DesktopExit::Quit)) => {
            tracing::info!("quit");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("desktop failed: {e:#}");
            Err(e)
        }
        Err(_) => {
            tracing::error!("desktop panicked");
            eprintln!("deskshell crashed. See {}", config::log_file().display());
            Ok(())
        }
    }
}
