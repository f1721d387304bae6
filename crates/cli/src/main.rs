use clap::Parser;
use config::Config;
use flume::bounded;
use orchestrator::{
    ControlEvent, JsonFileRepository, MonitorEngine, RollingStore, Services, SystemClock,
    SystemPlatform,
};
use statbot::cli::Cli;
use statbot::console::{ConsoleTransport, forward_commands};
use statbot::signals::{SignalEvent, wait_for_signal};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let config = load_config(&cli)?;
    let store = RollingStore::open(Box::new(JsonFileRepository::new(&config.state_path)?)).await;
    info!(
        state = %config.state_path.display(),
        history = store.history().len(),
        alerts = store.alerts().len(),
        "state loaded"
    );

    let services = Services {
        platform: Box::new(SystemPlatform::new()),
        transport: Box::new(ConsoleTransport::stdout()),
        clock: Box::new(SystemClock),
    };
    let mut engine = MonitorEngine::new(config.clone(), services, store);
    if let Some(path) = &cli.conffile {
        engine = engine.with_config_path(path);
    }

    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    if !cli.no_console {
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
        let replies = ConsoleTransport::stdout();
        tokio::spawn(async move {
            while let Some(reply) = reply_rx.recv().await {
                if let Err(err) = replies.write(&reply).await {
                    warn!(%err, "failed to print reply");
                }
            }
        });

        let actor = config.console_actor.clone();
        let control_tx = control_tx.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(err) = forward_commands(stdin, actor, control_tx, reply_tx).await {
                warn!(%err, "console input failed");
            }
        });
    }

    let engine_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { engine.run_until(cancel, control_rx).await }
    });

    let (events_tx, events_rx) = bounded(8);
    let signals = wait_for_signal(&events_tx);
    tokio::pin!(signals);

    loop {
        tokio::select! {
            res = &mut signals => {
                if let Err(err) = res {
                    error!(error = ?err, "Error while waiting for signal");
                    cancel.cancel();
                    return Err(err.into());
                }
            }
            res = events_rx.recv_async() => {
                let event = res?;
                debug!(?event, "Received signal event");
                match event {
                    SignalEvent::SigUSR1 => {
                        let _ = control_tx.send(ControlEvent::DumpState);
                    }
                    SignalEvent::SigUSR2 => match load_config(&cli) {
                        Ok(config) => {
                            let _ = control_tx.send(ControlEvent::Reload(Box::new(config)));
                        }
                        Err(err) => warn!(%err, "failed to reload config, keeping the current one"),
                    },
                    SignalEvent::Terminate => {
                        info!("terminating");
                        cancel.cancel();
                        break;
                    }
                }
            }
        }
    }

    engine_task.await?;
    Ok(())
}

/// Read the configuration file, applying command line overrides.
fn load_config(cli: &Cli) -> Result<Config, config::Error> {
    let mut config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };
    if let Some(statefile) = &cli.statefile {
        config.state_path = statefile.clone();
    }
    Ok(config)
}
