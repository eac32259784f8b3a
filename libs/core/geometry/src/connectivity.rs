//! [libs/core/geometry/src/connectivity.rs]
//! Conteo de conectividad por BFS y calculo de perimetro (spec §4.B).
//!
//! Resolucion de la pregunta abierta en spec §9: un enlace se trata como
//! vivo para efectos de conectividad si y solo si `link.live == true` y
//! ambos extremos tienen `functioning != 0` (no roto). Esa comprobacion de
//! `functioning` ya esta incorporada en `BoardSlot::allocatable`, asi que
//! aqui solo se exige `live` mas "ambos extremos estan dentro del conjunto
//! asignable que se nos paso".

use crate::search::{BoardSlot, LiveLink};
use spalloc_domain_models::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// BFS desde `root_board_id` sobre los enlaces vivos, restringido a los
/// board_id en `allocatable`. Devuelve el conjunto alcanzado (incluye la
/// raiz si esta en `allocatable`).
pub fn connected_board_ids(
    root_board_id: i64,
    allocatable: &HashSet<i64>,
    links: &[LiveLink],
) -> HashSet<i64> {
    let mut reached = HashSet::new();
    if !allocatable.contains(&root_board_id) {
        return reached;
    }

    let adjacency = build_adjacency(links);
    let mut queue = VecDeque::new();
    queue.push_back(root_board_id);
    reached.insert(root_board_id);

    while let Some(current) = queue.pop_front() {
        if let Some(neighbours) = adjacency.get(&current) {
            for &(neighbour, _direction) in neighbours {
                if allocatable.contains(&neighbour) && reached.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
    }
    reached
}

/// El conjunto de `(board_id, direction)` donde `board_id` esta dentro de
/// `allocation` y el vecino en esa direccion esta fuera (o no existe),
/// segun la definicion de perimetro de spec §4.B.
pub fn perimeter(allocation: &HashSet<i64>, boards: &[BoardSlot], links: &[LiveLink]) -> Vec<(i64, Direction)> {
    let adjacency = build_adjacency(links);
    let mut edges = Vec::new();

    for board in boards {
        if !allocation.contains(&board.board_id) {
            continue;
        }
        for direction in spalloc_domain_models::direction::ALL_DIRECTIONS {
            let crosses_boundary = match adjacency
                .get(&board.board_id)
                .and_then(|neighbours| neighbours.iter().find(|(_, dir)| *dir == direction))
            {
                Some((neighbour, _)) => !allocation.contains(neighbour),
                None => true, // no live link in that direction: edge of the world counts as perimeter too.
            };
            if crosses_boundary {
                edges.push((board.board_id, direction));
            }
        }
    }
    edges
}

fn build_adjacency(links: &[LiveLink]) -> HashMap<i64, Vec<(i64, Direction)>> {
    let mut adjacency: HashMap<i64, Vec<(i64, Direction)>> = HashMap::new();
    for link in links {
        adjacency.entry(link.board_1).or_default().push((link.board_2, link.direction_1));
        adjacency.entry(link.board_2).or_default().push((link.board_1, link.direction_2));
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(a: i64, da: Direction, b: i64, db: Direction) -> LiveLink {
        LiveLink { board_1: a, direction_1: da, board_2: b, direction_2: db }
    }

    #[test]
    fn bfs_does_not_cross_dead_boards() {
        // 1 -- 2 -- 3, but 2 is not allocatable: 3 must be unreachable from 1.
        let links = vec![
            link(1, Direction::East, 2, Direction::West),
            link(2, Direction::East, 3, Direction::West),
        ];
        let allocatable: HashSet<i64> = [1, 3].into_iter().collect();
        let reached = connected_board_ids(1, &allocatable, &links);
        assert_eq!(reached, [1].into_iter().collect());
    }

    #[test]
    fn bfs_reaches_full_connected_component() {
        let links = vec![
            link(1, Direction::East, 2, Direction::West),
            link(2, Direction::East, 3, Direction::West),
        ];
        let allocatable: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let reached = connected_board_ids(1, &allocatable, &links);
        assert_eq!(reached, [1, 2, 3].into_iter().collect());
    }

    #[test]
    fn perimeter_flags_boundary_but_not_interior() {
        let boards = vec![
            BoardSlot { board_id: 1, x: 0, y: 0, z: 0, allocatable: true, power_off_timestamp: None },
            BoardSlot { board_id: 2, x: 1, y: 0, z: 0, allocatable: true, power_off_timestamp: None },
        ];
        let links = vec![link(1, Direction::East, 2, Direction::West)];
        let allocation: HashSet<i64> = [1, 2].into_iter().collect();
        let edges = perimeter(&allocation, &boards, &links);
        // The East/West link between 1 and 2 is interior and must not appear.
        assert!(!edges.contains(&(1, Direction::East)));
        assert!(!edges.contains(&(2, Direction::West)));
        // Every other direction off either board has no live link: perimeter.
        assert!(edges.contains(&(1, Direction::West)));
        assert!(edges.contains(&(2, Direction::East)));
    }
}
