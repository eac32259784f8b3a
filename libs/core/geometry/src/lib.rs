//! [libs/core/geometry/src/lib.rs]
//!
//! APARATO: SPALLOC GEOMETRY ENGINE
//! CLASIFICACION: CORE ALGORITHM (ESTRATO L1)
//! RESPONSABILIDAD: busqueda de rectangulos de triadas satisfaciendo
//! tamano y tolerancia de placas muertas, conectividad a la raiz, y el
//! calculo de perimetro usado por el PowerController.
//!
//! Este crate es deliberadamente stateless: no toca el Store. Cada funcion
//! recibe una foto (`SearchSpace`) tomada dentro de la transaccion del
//! Allocator y devuelve una decision pura; la persistencia de esa decision
//! es responsabilidad de quien llama (spec §4.A "Ownership").

mod connectivity;
mod errors;
mod search;

pub use connectivity::{connected_board_ids, perimeter};
pub use errors::GeometryError;
pub use search::{BoardSlot, LiveLink, Placement, SearchSpace};

use spalloc_domain_models::Direction;

/// Un unico criterio de busqueda por placa especifica (spec §4.B "By board").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCriterion {
    BoardId(i64),
    Triad { x: u32, y: u32, z: u32 },
    Physical { cabinet: u32, frame: u32, board_num: u32 },
}

/// Busca un rectangulo `width x height` (con la profundidad completa de la
/// maquina) en cualquier origen, prefiriendo menos placas muertas y luego
/// el origen `(x, y)` mas bajo (spec §4.B "By size"). Cuando `width ==
/// height == 1`, el desempate real es la placa apagada hace mas tiempo
/// en vez del origen (spec §8 "Boundary behaviours").
pub fn find_by_size(
    space: &SearchSpace,
    width: u32,
    height: u32,
    max_dead_boards: u32,
) -> Result<Placement, GeometryError> {
    search::find_rectangle(space, width, height, max_dead_boards)
}

/// Ancla el rectangulo a una raiz especifica (spec §4.B "By root + size").
pub fn find_by_root(
    space: &SearchSpace,
    root_board_id: i64,
    width: u32,
    height: u32,
    max_dead_boards: u32,
) -> Result<Placement, GeometryError> {
    search::find_rectangle_at_root(space, root_board_id, width, height, max_dead_boards)
}

/// Busca la unica placa identificada por `criterion` (un id, una triada o
/// una posicion fisica) y comprueba que este `may_be_allocated` (spec §4.B
/// "By board"). No hay nada que desempatar aqui: el criterio ya selecciona
/// a lo sumo una placa. La preferencia por la apagada hace mas tiempo (spec
/// §8) aplica a `find_by_size` cuando colapsa a una busqueda de una sola
/// placa, no a esta funcion.
pub fn find_board(space: &SearchSpace, criterion: BoardCriterion) -> Result<Placement, GeometryError> {
    search::find_single_board(space, criterion)
}

/// Re-exporta la tabla de direcciones para que los consumidores no deban
/// depender directamente del crate de modelos solo para esto.
pub type Dir = Direction;
