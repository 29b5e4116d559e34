#[macro_use]
extern crate tracing;

use std::{process::ExitCode, sync::Arc};

use kube_event_exporter::{
    cli::{LogFormat, Opts},
    config::{self, Config},
    get_version,
    kubernetes::{KubeClient, KubeEventSource},
    pipeline::{EventPipeline, EventProcessor},
    signal::{self, SignalTo},
    sinks, trace,
};

fn main() -> ExitCode {
    let opts = Opts::get_matches().unwrap_or_else(|error| error.exit());

    let config = match &opts.config {
        Some(path) => config::load_from_path(path),
        None => Ok(Config::default()),
    };

    let log_format = opts
        .log_format
        .or_else(|| config.as_ref().ok().and_then(|config| config.log_format))
        .unwrap_or_default();
    trace::init(
        opts.color.use_color(),
        log_format == LogFormat::Json,
        &opts.log_level(),
    );

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            error!(message = "Configuration error.", %error);
            return code(exitcode::CONFIG);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("exporter-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(message = "Failed to start the runtime.", %error);
            return code(exitcode::OSERR);
        }
    };

    code(runtime.block_on(run(config)))
}

async fn run(config: Config) -> exitcode::ExitCode {
    info!(
        message = "Starting kube-event-exporter.",
        version = %get_version(),
        namespace = config.watched_namespace().unwrap_or("*"),
        sink = config.sink.sink_type(),
    );

    let client = match kube::Client::try_default().await {
        Ok(client) => client,
        Err(error) => {
            error!(message = "Failed to configure the Kubernetes client.", %error);
            return exitcode::CONFIG;
        }
    };

    let cluster = Arc::new(KubeClient::new(client.clone()));
    let source = KubeEventSource::new(client, config.watched_namespace().map(str::to_owned));
    let processor = EventProcessor::new(
        Arc::clone(&cluster) as _,
        cluster,
        Arc::from(sinks::build(&config.sink)),
    );
    let mut pipeline = EventPipeline::new(Arc::new(source), processor);

    if let Err(error) = pipeline.start().await {
        error!(message = "Failed to watch events.", %error);
        return exitcode::UNAVAILABLE;
    }

    match signal::signal().await {
        Ok(SignalTo::Shutdown) => {
            info!(message = "Shutting down.");
            pipeline.stop().await;
        }
        Ok(SignalTo::Quit) => info!(message = "Quitting."),
        Err(error) => {
            error!(message = "Failed to listen for signals.", %error);
            pipeline.stop().await;
            return exitcode::OSERR;
        }
    }

    exitcode::OK
}

fn code(code: exitcode::ExitCode) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
