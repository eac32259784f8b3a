// [libs/shared/heimdall/src/lib.rs]
//! Inicializacion de tracing compartida por el daemon y sus tareas
//! periodicas. Desarrollo obtiene un formateador compacto y legible;
//! produccion obtiene lineas JSON planas consumibles por un agregador sin
//! un side-car de parseo. Tambien instala un panic hook que pasa por
//! `tracing::error!` antes del hook por defecto, para que una tarea
//! periodica que entra en panico deje un rastro estructurado en vez de
//! solo un volcado de stderr.

use std::panic;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Instala el subscriber global de tracing para `service_name`.
///
/// # Panics
/// Propaga el panico de `tracing_subscriber` si un subscriber global ya fue
/// instalado en este proceso; se espera llamarla una sola vez, cerca del
/// inicio de `main`.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
        format!("{service_name}={default_level},libsql=warn").into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");

        error!(target: "panic", service = %service, location = %location, "{payload}");
    }));
}
