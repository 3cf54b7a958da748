use std::io::{self, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use khatma_application::{AppContext, BookmarkOutcome};
use khatma_core::SystemClock;
use khatma_storage::{Storage, load_plan, load_reader, save_plan, save_reader};

mod config;
mod render;

use config::Config;

#[derive(Parser)]
#[command(name = "khatma", version, about = "20-day reading plan and page reader")]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the reading plan, or change it
    Plan {
        #[command(subcommand)]
        action: Option<PlanAction>,
    },
    /// Show the current page, or go to PAGE first
    Page {
        #[arg(allow_negative_numbers = true)]
        page: Option<i64>,
    },
    /// Go to the next page
    Next,
    /// Go to the previous page
    Prev,
    /// Remember the current page as last read
    MarkRead,
    /// Go to the last read page
    Continue,
    /// Bookmark the current page
    Bookmark,
    /// List bookmarks, most recent first
    Bookmarks,
    /// Search all pages for a literal piece of text
    Search {
        needle: String,
        /// Go to the page of result N (1-based)
        #[arg(long, value_name = "N")]
        open: Option<usize>,
    },
    /// Build dataset artifacts
    Build {
        #[command(subcommand)]
        step: BuildStep,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Mark DAY (1-20) as done
    Done {
        #[arg(allow_negative_numbers = true)]
        day: i64,
    },
    /// Mark DAY (1-20) as not done
    Undone {
        #[arg(allow_negative_numbers = true)]
        day: i64,
    },
    /// Mark today's plan day as done
    Today,
    /// Mark today's plan day as not done
    UndoToday,
    /// Set the first day of the plan
    Start { date: NaiveDate },
    /// Set the number of pages to spread over the plan
    Pages { pages: f64 },
    /// Start over from today
    Reset,
}

#[derive(Subcommand)]
enum BuildStep {
    /// Parse the delimited plain-text corpus into JSON
    Corpus {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Record saved per-page verse key listings as the page map
    PageMap {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Join the corpus and page map into the page dataset
    Pages {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        page_map: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Plan { action: None });

    let output = match command {
        Command::Build { step } => run_build(step)?,
        command => {
            let config = Config::load(cli.config.as_deref())?;
            let db_path = config.db_path()?;
            tracing::debug!(db = %db_path.display(), "opening state db");
            let storage = Storage::open(&db_path)?;
            match command {
                Command::Plan { action } => run_plan(&storage, action)?,
                command => run_reader(&storage, &config, command)?,
            }
        }
    };
    emit(&output)
}

fn run_plan(storage: &Storage, action: Option<PlanAction>) -> anyhow::Result<String> {
    let clock = SystemClock;
    let mut ctx = AppContext::new(load_plan(storage, &clock), clock);

    let mut notice = None;
    if let Some(action) = action {
        let changed = match action {
            PlanAction::Done { day } => {
                ctx.plan.set_done(day.saturating_sub(1), true);
                true
            }
            PlanAction::Undone { day } => {
                ctx.plan.set_done(day.saturating_sub(1), false);
                true
            }
            PlanAction::Today => ctx.plan.mark_today(),
            PlanAction::UndoToday => ctx.plan.undo_today(),
            PlanAction::Start { date } => {
                ctx.plan.set_start_date(date);
                true
            }
            PlanAction::Pages { pages } => {
                ctx.plan.set_total_pages(pages);
                true
            }
            PlanAction::Reset => {
                ctx.plan.reset();
                true
            }
        };
        if changed {
            save_plan(storage, ctx.plan.state())?;
        } else {
            notice = Some("Today is outside the plan window; nothing changed.");
        }
    }

    let mut out = render::plan(&ctx.plan);
    if let Some(notice) = notice {
        out.push('\n');
        out.push_str(notice);
    }
    Ok(out)
}

fn run_reader(storage: &Storage, config: &Config, command: Command) -> anyhow::Result<String> {
    let dataset_path = config.dataset_path()?;
    let dataset = khatma_engine::load_dataset(&dataset_path)
        .with_context(|| format!("load page dataset {}", dataset_path.display()))?;

    let clock = SystemClock;
    let mut ctx = AppContext::new(load_plan(storage, &clock), clock).with_reader(
        Arc::new(dataset),
        load_reader(storage),
        clock,
    );
    let reader = ctx
        .reader_mut()
        .context("reader unavailable without a page dataset")?;

    let mut changed = true;
    let out = match command {
        Command::Page { page } => {
            match page {
                Some(page) => {
                    reader.go_to(page);
                }
                None => changed = false,
            }
            render::page(&reader.current(), reader.state())
        }
        Command::Next => {
            reader.next();
            render::page(&reader.current(), reader.state())
        }
        Command::Prev => {
            reader.prev();
            render::page(&reader.current(), reader.state())
        }
        Command::MarkRead => {
            reader.mark_last_read();
            format!("Saved last read: page {}", reader.state().page)
        }
        Command::Continue => {
            reader.go_to_last_read();
            render::page(&reader.current(), reader.state())
        }
        Command::Bookmark => match reader.add_bookmark() {
            BookmarkOutcome::Added => format!("Bookmarked page {}", reader.state().page),
            BookmarkOutcome::AlreadyBookmarked => {
                changed = false;
                format!("Page {} is already bookmarked", reader.state().page)
            }
        },
        Command::Bookmarks => {
            changed = false;
            render::bookmarks(reader.state())
        }
        Command::Search { needle, open } => {
            let hits = reader.search(&needle);
            let listing = render::search_results(&hits);
            match open {
                Some(n) => {
                    let hit = n
                        .checked_sub(1)
                        .and_then(|idx| hits.get(idx))
                        .with_context(|| format!("no search result {n}"))?;
                    reader.open_hit(hit);
                    format!(
                        "{listing}\n\n{}",
                        render::page(&reader.current(), reader.state())
                    )
                }
                None => {
                    changed = false;
                    listing
                }
            }
        }
        Command::Plan { .. } | Command::Build { .. } => {
            anyhow::bail!("not a reader command")
        }
    };

    if changed {
        save_reader(storage, reader.state())?;
    }
    Ok(out)
}

fn run_build(step: BuildStep) -> anyhow::Result<String> {
    match step {
        BuildStep::Corpus { input, output } => {
            let corpus = khatma_engine::build_corpus(&input, &output)
                .with_context(|| format!("build corpus from {}", input.display()))?;
            Ok(format!(
                "Wrote {} ({} verses)",
                output.display(),
                corpus.verse_count()
            ))
        }
        BuildStep::PageMap { input, output } => {
            let map = khatma_engine::build_page_map(&input, &output)
                .with_context(|| format!("build page map from {}", input.display()))?;
            Ok(format!(
                "Wrote {} ({} verse keys)",
                output.display(),
                map.map.len()
            ))
        }
        BuildStep::Pages {
            corpus,
            page_map,
            output,
        } => {
            let artifact = khatma_engine::build_pages(&corpus, &page_map, &output, Utc::now())
                .context("build page dataset")?;
            Ok(format!(
                "Wrote {} ({} pages)",
                output.display(),
                artifact.meta.pages
            ))
        }
    }
}

fn emit(text: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match writeln!(handle, "{text}").and_then(|_| handle.flush()) {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("write to stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
