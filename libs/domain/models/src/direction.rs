//! [libs/domain/models/src/direction.rs]
//! Seis direcciones fijas de vecindad en el lattice hexagonal de triadas.
//!
//! La especificacion deja abierta la cuenta historica de direcciones (6 vs
//! 18 en revisiones previas del sistema origen); esta implementacion fija
//! el valor en 6, que es lo que el esquema de enlaces y la tabla de bits
//! FPGA (`fpga_n, fpga_e, fpga_se, fpga_s, fpga_w, fpga_nw`) requieren.

use serde::{Deserialize, Serialize};

/// Una de las seis direcciones de enlace entre placas vecinas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    SouthEast = 2,
    South = 3,
    West = 4,
    NorthWest = 5,
}

/// Todas las direcciones, en el orden de almacenamiento 0..5.
pub const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::North,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::West,
    Direction::NorthWest,
];

impl Direction {
    /// Decodifica el entero pequeno almacenado en la columna `direction`.
    pub fn from_ordinal(value: u8) -> Option<Self> {
        ALL_DIRECTIONS.get(value as usize).copied()
    }

    /// El entero 0..5 que se persiste en el Store.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// La direccion opuesta: todo enlace es recorrido en ambos sentidos.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }
}

/// Mascara de bits FPGA por enlace, tal como se persiste en `pending_changes`
/// y se envia al driver BMP. Cada campo habilita el FPGA del enlace saliente
/// en esa direccion para la placa objetivo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBitmap {
    pub n: bool,
    pub e: bool,
    pub se: bool,
    pub s: bool,
    pub w: bool,
    pub nw: bool,
}

impl LinkBitmap {
    /// Bitmap vacio: ningun FPGA de enlace habilitado (placa interior).
    pub fn none() -> Self {
        Self::default()
    }

    /// Activa el bit correspondiente a `direction`.
    pub fn set(&mut self, direction: Direction) {
        match direction {
            Direction::North => self.n = true,
            Direction::East => self.e = true,
            Direction::SouthEast => self.se = true,
            Direction::South => self.s = true,
            Direction::West => self.w = true,
            Direction::NorthWest => self.nw = true,
        }
    }

    /// Lee el bit correspondiente a `direction`.
    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.n,
            Direction::East => self.e,
            Direction::SouthEast => self.se,
            Direction::South => self.s,
            Direction::West => self.w,
            Direction::NorthWest => self.nw,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.n || self.e || self.se || self.s || self.w || self.nw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        for direction in ALL_DIRECTIONS {
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn ordinal_round_trips() {
        for direction in ALL_DIRECTIONS {
            assert_eq!(Direction::from_ordinal(direction.ordinal()), Some(direction));
        }
        assert_eq!(Direction::from_ordinal(6), None);
    }

    #[test]
    fn bitmap_set_get() {
        let mut bitmap = LinkBitmap::none();
        assert!(bitmap.is_empty());
        bitmap.set(Direction::SouthEast);
        assert!(bitmap.get(Direction::SouthEast));
        assert!(!bitmap.get(Direction::North));
        assert!(!bitmap.is_empty());
    }
}
