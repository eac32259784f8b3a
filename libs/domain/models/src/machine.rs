//! [libs/domain/models/src/machine.rs]
//! Una maquina: la unidad de asignacion de nivel superior, compuesta por
//! `width x height x depth` triadas. Creada por el cargador de definicion de
//! maquina (fuera de alcance); el core solo la lee.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: i64,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub board_model: String,
    pub in_service: bool,
    pub max_chip_x: u32,
    pub max_chip_y: u32,
}

impl Machine {
    /// Bandera de wrap horizontal derivada: una maquina "torus" envuelve en
    /// X cuando su ancho cubre el rango completo de triadas en esa dimension.
    pub fn wraps_x(&self) -> bool {
        self.width > 1
    }

    /// Bandera de wrap vertical derivada, analoga a `wraps_x`.
    pub fn wraps_y(&self) -> bool {
        self.height > 1
    }

    /// Numero total de placas logicas (`width * height * depth`).
    pub fn board_capacity(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.depth)
    }

    /// Rechaza peticiones de rectangulo que no puedan caber bajo ninguna
    /// traslacion, sin necesidad de ejecutar la busqueda de geometria.
    pub fn can_possibly_fit(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Machine {
        Machine {
            machine_id: 1,
            name: "spinn-4".into(),
            width: 4,
            height: 4,
            depth: 3,
            board_model: "spin5".into(),
            in_service: true,
            max_chip_x: 7,
            max_chip_y: 7,
        }
    }

    #[test]
    fn capacity_multiplies_dimensions() {
        assert_eq!(sample().board_capacity(), 48);
    }

    #[test]
    fn rejects_oversized_rectangle() {
        let machine = sample();
        assert!(!machine.can_possibly_fit(5, 1));
        assert!(machine.can_possibly_fit(4, 4));
    }
}
