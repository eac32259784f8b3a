//! [libs/core/geometry/src/errors.rs]

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// El rectangulo pedido no cabe en la maquina bajo ninguna traslacion;
    /// el caller (Allocator) debe tratar esto como `BadRequest`, no como
    /// un fallo reintentable (spec §8 "Boundary behaviours").
    #[error("requested rectangle does not fit in this machine")]
    DoesNotFit,
    /// Cupo en principio, pero ningun origen cumple la tolerancia de placas
    /// muertas o la conectividad exigida; reintentable en el siguiente tick.
    #[error("no placement satisfies the dead-board tolerance")]
    NoFit,
    /// La placa/triada/posicion fisica pedida no existe en esta maquina.
    #[error("requested board not found")]
    BoardNotFound,
    /// La placa existe pero no esta disponible para asignar.
    #[error("requested board is not available for allocation")]
    BoardUnavailable,
}
