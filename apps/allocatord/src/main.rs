// [apps/allocatord/src/main.rs]
//! Punto de entrada del daemon: carga configuracion, inicializa
//! observabilidad, conecta el Store y el driver BMP, y corre hasta que el
//! proceso reciba una senal de apagado.

use spalloc_allocatord::kernel::AllocatorKernel;
use spalloc_shared_config::Config;
use spalloc_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("spalloc_allocatord");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let config = Config::from_env();

        let database_url = std::env::var("SPALLOC_DATABASE_URL").expect("SPALLOC_DATABASE_URL must be set");
        let auth_token = std::env::var("SPALLOC_DATABASE_AUTH_TOKEN").ok();

        let kernel = match AllocatorKernel::ignite(&database_url, auth_token, config).await {
            Ok(kernel) => kernel,
            Err(error) => {
                error!(%error, "failed to connect to store");
                std::process::exit(1);
            }
        };

        info!("allocator daemon online");
        if let Err(error) = kernel.run().await {
            error!(%error, "daemon terminated with error");
            std::process::exit(1);
        }

        Ok(())
    })
}
