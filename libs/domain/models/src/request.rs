//! [libs/domain/models/src/request.rs]
//! Una tarea de asignacion pendiente: exactamente una de las cuatro formas
//! descritas en spec §3/§4.B.

use serde::{Deserialize, Serialize};

/// La forma geometrica que el usuario pidio. `num_boards` se traduce a
/// `ByDimensions` antes de llegar a la busqueda de geometria (spec §4.B,
/// "By count N").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestShape {
    /// N placas en cualquier forma razonable; la capa de Geometry la
    /// convierte a un rectangulo `ceil(sqrt(n)) x ceil(n / ceil(sqrt(n)))`.
    NumBoards { count: u32 },
    /// Un rectangulo explicito de triadas, en cualquier parte de la maquina.
    Dimensions { width: u32, height: u32 },
    /// Una placa especifica, identificada por id opaco.
    SpecificBoard { board_id: i64 },
    /// Un rectangulo anclado en una placa raiz especifica.
    RootAndDimensions { board_id: i64, width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub req_id: i64,
    pub job_id: i64,
    pub shape: RequestShape,
    pub max_dead_boards: u32,
    pub priority: i64,
    pub importance: i64,
}

impl Request {
    /// Convierte `NumBoards` a `(width, height)` mas la tolerancia derivada
    /// `width * height - count`, tal como pide spec §4.B. Las demas formas
    /// ya son rectangulos y se devuelven sin cambios.
    pub fn as_dimensions(&self) -> Option<(u32, u32, u32)> {
        match self.shape {
            RequestShape::NumBoards { count } => {
                let side = (count as f64).sqrt().ceil() as u32;
                let side = side.max(1);
                let height = (count + side - 1) / side;
                let tolerance = side * height - count;
                Some((side, height, tolerance))
            }
            RequestShape::Dimensions { width, height } => Some((width, height, 0)),
            RequestShape::RootAndDimensions { width, height, .. } => Some((width, height, 0)),
            RequestShape::SpecificBoard { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(shape: RequestShape) -> Request {
        Request {
            req_id: 1,
            job_id: 1,
            shape,
            max_dead_boards: 0,
            priority: 1,
            importance: 1,
        }
    }

    #[test]
    fn num_boards_one_collapses_to_one_by_one() {
        let (w, h, tol) = req(RequestShape::NumBoards { count: 1 }).as_dimensions().unwrap();
        assert_eq!((w, h, tol), (1, 1, 0));
    }

    #[test]
    fn num_boards_uses_ceil_sqrt_rectangle() {
        // N=5 -> side=ceil(sqrt(5))=3, height=ceil(5/3)=2, tolerance=6-5=1
        let (w, h, tol) = req(RequestShape::NumBoards { count: 5 }).as_dimensions().unwrap();
        assert_eq!((w, h, tol), (3, 2, 1));
    }

    #[test]
    fn specific_board_has_no_dimensions() {
        assert!(req(RequestShape::SpecificBoard { board_id: 4 }).as_dimensions().is_none());
    }
}
