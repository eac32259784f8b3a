// [apps/allocatord/src/bin/migrator.rs]
//! Binario de mantenimiento: aplica el esquema de tres estratos contra la
//! base configurada. `StoreClient::connect` ya aplica el esquema al abrir
//! la conexion, asi que este binario es, en esencia, un disparador manual
//! para CI o despliegues que quieran nivelar el esquema sin levantar el
//! daemon completo.

use dotenvy::dotenv;
use spalloc_infra_store::StoreClient;
use spalloc_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("spalloc_migrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let database_url = std::env::var("SPALLOC_DATABASE_URL").expect("SPALLOC_DATABASE_URL must be set");
        let auth_token = std::env::var("SPALLOC_DATABASE_AUTH_TOKEN").ok();

        match StoreClient::connect(&database_url, auth_token).await {
            Ok(_) => {
                info!("schema applied");
                Ok(())
            }
            Err(error) => {
                error!(%error, "schema application failed");
                std::process::exit(1);
            }
        }
    })
}
