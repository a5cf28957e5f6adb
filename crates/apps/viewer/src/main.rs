use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::Parser;
use runtime::animation::SystemTimeSource;
use streaming::source::open_source;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{Args, Controller, Event, JsonLinesSink, ViewerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Scenes go to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = ViewerConfig::from_args(Args::parse())?;

    let out: Box<dyn Write> = match &config.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    let mut sink = JsonLinesSink::new(out);

    let mut controller = Controller::new(config.clock, config.trail_length);
    controller.dispatch(Event::Resize {
        width: config.width,
        height: config.height,
    });
    controller.start(
        open_source(&config.data),
        config.paths.clone(),
        config.retry,
        config.frame_cadence,
        SystemTimeSource,
    );

    let summary = controller
        .run(&mut sink, config.max_frames, config.emit_every, ctrl_c())
        .await?;

    info!(
        frames = summary.frames,
        emitted = summary.emitted,
        status = %controller.state().status().line(),
        "viewer stopped"
    );
    Ok(())
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C, running until the frame limit: {err}");
        std::future::pending::<()>().await;
    }
}
