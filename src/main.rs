use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use scrollpool::config::{self, CliOverrides, Config};
use scrollpool::controller::{ListConfig, ListController};
use scrollpool::renderer::RenderTemplate;
use scrollpool::source::{DataSource, JsonFileSource};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SCROLLPOOL_BUILD_GIT_HASH"),
    " ",
    env!("SCROLLPOOL_BUILD_PROFILE"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "scrollpool",
    about = "Scroll through a large entry sheet with a recycled, virtualized list",
    version,
    long_version = LONG_VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input data sheet (JSON array of {type, content} records)
    #[arg(global = true)]
    input: Option<PathBuf>,

    /// Shuffle entries once on every load
    #[arg(long, global = true)]
    shuffle: bool,

    /// Seed for --shuffle (random per load when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Gap between entries, in rows
    #[arg(long, global = true)]
    spacing: Option<f64>,

    /// Backward prefetch margin, in viewport heights
    #[arg(long, global = true)]
    margin: Option<f64>,

    /// Disable automatic reload when the sheet changes
    #[arg(long, global = true)]
    no_watch: bool,

    /// Log output file path (enables logging when specified)
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Replay scroll offsets without a terminal and print the window after each
    Dump {
        /// Input data sheet
        input: PathBuf,

        /// Viewport height in rows
        #[arg(long, default_value_t = 24.0)]
        viewport: f64,

        /// Content width in columns
        #[arg(long, default_value_t = 74)]
        width: usize,

        /// Scroll offsets to deliver, in order (repeatable)
        #[arg(long = "offset", allow_negative_numbers = true)]
        offsets: Vec<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        let file = std::fs::File::create(log_path).expect("failed to open log file");
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    } else if cli.command.is_some() {
        env_logger::init();
    }
    // viewer mode + no --log → logger not initialized (the terminal is ours)

    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_cli(&CliOverrides {
        spacing: cli.spacing,
        backward_margin: cli.margin,
        shuffle: cli.shuffle,
        seed: cli.seed,
    });
    let config = cfg.resolve();

    let result = match cli.command {
        Some(Command::Dump {
            input,
            viewport,
            width,
            offsets,
        }) => cmd_dump(input, &config, viewport, width, &offsets),
        None => match cli.input {
            Some(path) => {
                let source = JsonFileSource::new(path, config.order());
                scrollpool::viewer::run(source, config, !cli.no_watch)
            }
            None => {
                eprintln!("Error: input data sheet required");
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_dump(
    input: PathBuf,
    config: &Config,
    viewport: f64,
    width: usize,
    offsets: &[f64],
) -> Result<()> {
    let source = JsonFileSource::new(input, config.order());
    let entries = source.provide()?;

    let mut template = RenderTemplate::new(width, config.render.line_height);
    if let Some(path) = &config.render.image_art {
        let art = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        template = template.with_image_art(&art);
    }

    let mut controller = ListController::new(
        ListConfig {
            viewport_extent: viewport,
            spacing: config.spacing,
            backward_margin: config.backward_margin,
        },
        template,
    );
    controller.fetch_data(entries);
    info!("dump: {} offsets", offsets.len());

    print_step(&controller, "fetch");
    for &offset in offsets {
        controller.on_scroll_offset_changed(offset);
        print_step(&controller, &format!("offset {offset}"));
    }
    Ok(())
}

fn print_step(controller: &ListController, label: &str) {
    let range = controller.window_range();
    let pool: Vec<String> = controller
        .pool_stats()
        .iter()
        .map(|s| {
            format!(
                "{}(active={} idle={} constructed={})",
                s.variant, s.active, s.idle, s.constructed
            )
        })
        .collect();
    println!(
        "{label}: window={}..{} len={} spacer={:.1} extent={:.1} pool: {}",
        range.start,
        range.end,
        controller.window_len(),
        controller.spacer(),
        controller.content_extent(),
        pool.join(" ")
    );
}
