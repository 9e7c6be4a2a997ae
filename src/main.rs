use statically_served::server::shutdown_signal;
use statically_served::{logger, Settings, StaticServer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    logger::init(&settings.logging)?;

    // Create the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = settings.server.workers {
        runtime_builder.worker_threads(workers);
        if settings.logging.enabled {
            logger::log_worker_threads(workers);
        }
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(settings))
}

async fn async_main(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.socket_addr()?;
    let server = StaticServer::new(settings.server_config())?;

    server
        .bind_with(addr, settings.listen_options())?
        .serve_with_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
