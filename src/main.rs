use clap::{Parser, ValueEnum};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wifiglyph::{
    FixedSignal, GlyphConfig, PipeSignal, RandomWalkSignal, SignalSample, SignalSource,
    WifiSignalView, WindowConfig, LEVELS,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Levels read line by line from stdin (`0`-`4`, or `none`)
    Pipe,
    /// A random walk with occasional dropouts
    Random,
    /// A constant level, see --fixed-level
    Fixed,
}

/// Shows a wifi signal-strength glyph driven by a live signal source.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = "Wifi signal")]
    title: String,

    /// Window edge length in logical pixels
    #[arg(long, default_value_t = 240)]
    size: u32,

    #[arg(long, value_enum, default_value_t = SourceKind::Random)]
    source: SourceKind,

    /// Level reported by the fixed source
    #[arg(long, default_value_t = LEVELS - 1)]
    fixed_level: u8,

    /// Show this fill fraction instead of polling
    #[arg(long, conflicts_with = "disconnected")]
    level: Option<f32>,

    /// Show the disconnected glyph instead of polling
    #[arg(long)]
    disconnected: bool,

    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let source: Box<dyn SignalSource> = match args.source {
        SourceKind::Pipe => Box::new(PipeSignal::stdin()),
        SourceKind::Random => Box::new(RandomWalkSignal::new()),
        SourceKind::Fixed => Box::new(FixedSignal(SignalSample::level(args.fixed_level))),
    };

    let config = GlyphConfig::builder()
        .poll_interval(std::time::Duration::from_millis(args.interval_ms.max(1)))
        .auto_start(args.level.is_none() && !args.disconnected)
        .build();
    let window = WindowConfig {
        title: args.title,
        width: args.size,
        height: args.size,
        ..WindowConfig::default()
    };

    let mut view = WifiSignalView::new(&config, source);
    let mut startup = wifiglyph::window::WindowHost::new();
    let now = std::time::Instant::now();
    if let Some(level) = args.level {
        view.set_level(level, now, &mut startup);
    } else if args.disconnected {
        view.set_disconnected(now, &mut startup);
    }
    view.jump_to_current_state(&mut startup);

    if let Err(e) = view.show(&window) {
        error!("{}", e);
        process::exit(1);
    }
}
