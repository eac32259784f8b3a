// [apps/allocatord/src/lib.rs]
//! Raiz de la libreria del daemon: estado compartido, tareas periodicas,
//! la fachada de envio/keepalive/destruccion, y el kernel que las conecta.

/// Fachada de envio/keepalive/destruccion/consulta (spec §6).
pub mod api;
/// Taxonomia de errores de la fachada (spec §7).
pub mod errors;
/// Punto de ignicion del daemon: conecta el Store, el driver BMP y el Scheduler.
pub mod kernel;
/// Las tareas periodicas (spec §4) y el supervisor que las programa.
pub mod services;
/// Estado compartido entre todas las tareas.
pub mod state;

pub mod prelude {
    pub use crate::api::{Api, SubmitRequest};
    pub use crate::errors::AllocatorError;
    pub use crate::kernel::AllocatorKernel;
    pub use crate::state::AppState;
}
