//! [libs/domain/models/src/lib.rs]
//!
//! APARATO: SPALLOC DOMAIN MODELS
//! CLASIFICACION: DOMAIN MODELS (ESTRATO L2)
//! RESPONSABILIDAD: definiciones de entidades compartidas por el Store, la
//! busqueda de geometria y los servicios del allocator.
//!
//! Todas las entidades son DTOs puros: no contienen logica de persistencia
//! ni acceso a red. Los identificadores son enteros opacos salvo donde el
//! dominio exige texto (direcciones IP, razones de muerte).

/// Direcciones de enlace del lattice hexagonal y utilidades de bits FPGA.
pub mod direction;
/// Maquina: dimensiones en triadas y banderas de wrap derivadas.
pub mod machine;
/// Placa fisica: coordenadas logicas/fisicas y predicado de disponibilidad.
pub mod board;
/// Enlace no dirigido entre dos placas.
pub mod link;
/// Board Management Processor: agrupa placas para el control de energia.
pub mod bmp;
/// Trabajo de usuario y su maquina de estados.
pub mod job;
/// Solicitud de asignacion pendiente (una de las cuatro variantes de forma).
pub mod request;
/// Cambio de energia/enlace pendiente, unidad de trabajo del PowerController.
pub mod pending_change;
/// Operaciones de blacklist encoladas hacia el driver BMP.
pub mod blacklist;
/// Cuotas por grupo y el uso derivado por trabajo.
pub mod quota;
/// Copias historicas escritas al tombstoning.
pub mod historical;

pub use blacklist::{BlacklistOp, BlacklistOpKind};
pub use board::Board;
pub use bmp::Bmp;
pub use direction::Direction;
pub use historical::{HistoricalAllocation, HistoricalJob};
pub use job::{Job, JobState};
pub use link::Link;
pub use machine::Machine;
pub use pending_change::PendingChange;
pub use quota::{GroupQuota, JobUsage};
pub use request::{Request, RequestShape};
