// [libs/infra/store/src/repositories/mod.rs]
//! Un modulo por entidad; cada uno expone un struct sin estado cuyas
//! funciones asociadas toman `&Tx` explicito en vez de guardar su propia
//! conexion, para que la composicion de varias escrituras dentro de una
//! misma transaccion sea sintacticamente obvia en el sitio de llamada.

pub mod bmp;
pub mod blacklist;
pub mod board;
pub mod historical;
pub mod job;
pub mod link;
pub mod machine;
pub mod pending_change;
pub mod quota;
pub mod request;

pub use blacklist::BlacklistRepository;
pub use bmp::BmpRepository;
pub use board::BoardRepository;
pub use historical::HistoricalRepository;
pub use job::JobRepository;
pub use link::LinkRepository;
pub use machine::MachineRepository;
pub use pending_change::PendingChangeRepository;
pub use quota::QuotaRepository;
pub use request::RequestRepository;
