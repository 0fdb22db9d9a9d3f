mod config;

use anyhow::Context;
use choreo::{Ensemble, Event, EventDispatcher, ScriptListener, ScriptRunner, Show, Timeline, TimelineFile, TracingTransport, SCRIPT_PATH_KEY};
use clap::Parser;
use config::Config;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();

	init_tracing(&config);

	let show_config = config.show_config();
	show_config.validate()?;

	tracing::info!("Loading timeline from {}", config.timeline.display());
	let timeline = TimelineFile::load(&config.timeline)
		.await
		.with_context(|| format!("failed to load timeline {}", config.timeline.display()))?
		.into_timeline()?;

	let shutdown_token = CancellationToken::new();
	let ensemble = Arc::new(Ensemble::spawn(show_config.actors, Arc::new(TracingTransport), &shutdown_token));
	ensemble.reset_all().await?;

	let dispatcher = Arc::new(EventDispatcher::new(show_config.dispatcher.clone()));
	register_listeners(&dispatcher, &timeline, &ensemble, &config.script_root());

	// Setup signal handling for graceful shutdown
	let signal_token = shutdown_token.clone();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				tracing::info!("Received shutdown signal (Ctrl+C)");
				signal_token.cancel();
			}
			Err(e) => {
				tracing::error!("Failed to listen for shutdown signal: {}", e);
			}
		}
	});

	let mut show = Show::new(show_config, timeline, Arc::clone(&dispatcher))?;
	let result = show.run(&shutdown_token).await;

	shutdown_token.cancel();
	ensemble.shutdown().await;

	let summary = result.context("show aborted")?;
	tracing::info!(
		"Show stopped: {} ticks, {} events handled, {} dropped, {} listener errors{}",
		summary.ticks,
		summary.events_handled,
		summary.events_dropped,
		summary.listener_errors,
		if summary.cancelled { " (cancelled)" } else { "" }
	);
	Ok(())
}

/// One script listener per waypoint name that names a script; the rest are only logged
fn register_listeners(dispatcher: &EventDispatcher, timeline: &Timeline, ensemble: &Arc<Ensemble>, script_root: &Path) {
	let listener = Arc::new(ScriptListener::new(ScriptRunner::new(Arc::clone(ensemble)), script_root));

	for waypoint in timeline.waypoints() {
		if dispatcher.listener_count(&waypoint.name) > 0 {
			continue;
		}
		if waypoint.args.contains_key(SCRIPT_PATH_KEY) {
			dispatcher.add_listener(waypoint.name.clone(), listener.clone());
		} else {
			dispatcher.add_listener_fn(waypoint.name.clone(), |event: &Event| {
				tracing::info!("{}", event);
				Ok(())
			});
		}
	}

	tracing::info!("Registered listeners for {} waypoints, scripts under {}", timeline.len(), script_root.display());
}

fn init_tracing(config: &Config) {
	let filter = config.rust_log.as_deref().and_then(|directives| directives.parse::<EnvFilter>().ok()).unwrap_or_else(|| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.with_target(true)
					.with_thread_ids(true)
					.with_line_number(true)
					.with_filter(filter),
			)
		})
		.init();
}
