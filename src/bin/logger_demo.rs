use rapport::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap()?;
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "rapport=trace,debug".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");

    // invalid directives are rejected and the previous filter stays active
    let bad = LogConfig {
        filter: "rapport=loud".to_string(),
    };
    if let Err(e) = logger.reload_from_config(&bad) {
        warn!("filter rejected: {e}");
    }

    Ok(())
}
