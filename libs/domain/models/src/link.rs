//! [libs/domain/models/src/link.rs]
//! Enlace no dirigido entre dos placas vecinas, cada una vista desde su
//! propia direccion de salida (`direction_1` sale de `board_1` hacia
//! `board_2`; `direction_2` es, por construccion, su opuesta).

use crate::direction::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub board_1: i64,
    pub direction_1: Direction,
    pub board_2: i64,
    pub direction_2: Direction,
    pub live: bool,
}

impl Link {
    /// El otro extremo del enlace visto desde `board_id`, si participa en el.
    pub fn other_end(&self, board_id: i64) -> Option<i64> {
        if board_id == self.board_1 {
            Some(self.board_2)
        } else if board_id == self.board_2 {
            Some(self.board_1)
        } else {
            None
        }
    }

    /// La direccion de salida desde `board_id` hacia el otro extremo.
    pub fn direction_from(&self, board_id: i64) -> Option<Direction> {
        if board_id == self.board_1 {
            Some(self.direction_1)
        } else if board_id == self.board_2 {
            Some(self.direction_2)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_end_and_direction_are_symmetric() {
        let link = Link {
            board_1: 1,
            direction_1: Direction::North,
            board_2: 2,
            direction_2: Direction::South,
            live: true,
        };
        assert_eq!(link.other_end(1), Some(2));
        assert_eq!(link.other_end(2), Some(1));
        assert_eq!(link.other_end(3), None);
        assert_eq!(link.direction_from(1), Some(Direction::North));
        assert_eq!(link.direction_from(2), Some(Direction::South));
    }
}
