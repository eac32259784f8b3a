//! [libs/core/geometry/src/search.rs]
//! Busqueda de rectangulos sobre una foto de placas y enlaces en memoria.

use crate::connectivity::{connected_board_ids, perimeter};
use crate::errors::GeometryError;
use crate::BoardCriterion;
use chrono::{DateTime, Utc};
use spalloc_domain_models::Direction;
use std::collections::HashSet;

/// Una placa tal como la ve la busqueda: solo lo que hace falta para
/// geometria y conectividad. `Store` la hidrata desde `board.may_be_allocated()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSlot {
    pub board_id: i64,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub allocatable: bool,
    /// `None` si nunca se apago (o nunca se encendio): se trata como "la
    /// apagada hace mas tiempo" para el desempate de placa unica.
    pub power_off_timestamp: Option<DateTime<Utc>>,
}

/// Un enlace vivo entre dos placas (ya filtrado por `live && both functioning`
/// antes de llegar aqui, por quien arma la foto).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveLink {
    pub board_1: i64,
    pub direction_1: Direction,
    pub board_2: i64,
    pub direction_2: Direction,
}

/// La foto completa de una maquina sobre la que se busca.
pub struct SearchSpace {
    pub machine_width: u32,
    pub machine_height: u32,
    pub machine_depth: u32,
    pub boards: Vec<BoardSlot>,
    pub links: Vec<LiveLink>,
}

/// El resultado de una busqueda exitosa: suficiente para que el Allocator
/// escriba la asignacion y encole los cambios de perimetro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub origin_x: u32,
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub dead_boards: u32,
    pub root_board_id: i64,
    pub board_ids: Vec<i64>,
    pub perimeter: Vec<(i64, Direction)>,
    /// Marca de apagado de la placa raiz, llevada solo para el desempate de
    /// `find_rectangle` en busquedas de una sola placa.
    pub power_off_timestamp: Option<DateTime<Utc>>,
}

impl SearchSpace {
    fn board_at(&self, x: u32, y: u32, z: u32) -> Option<&BoardSlot> {
        self.boards.iter().find(|b| b.x == x && b.y == y && b.z == z)
    }

    fn board_by(&self, criterion: BoardCriterion, physical: &dyn Fn(&BoardSlot) -> bool) -> Option<&BoardSlot> {
        match criterion {
            BoardCriterion::BoardId(id) => self.boards.iter().find(|b| b.board_id == id),
            BoardCriterion::Triad { x, y, z } => self.board_at(x, y, z),
            BoardCriterion::Physical { .. } => self.boards.iter().find(|b| physical(b)),
        }
    }
}

pub fn find_rectangle(
    space: &SearchSpace,
    width: u32,
    height: u32,
    max_dead_boards: u32,
) -> Result<Placement, GeometryError> {
    if width == 0 || height == 0 || width > space.machine_width || height > space.machine_height {
        return Err(GeometryError::DoesNotFit);
    }

    let mut best: Option<Placement> = None;
    for origin_x in 0..=(space.machine_width - width) {
        for origin_y in 0..=(space.machine_height - height) {
            if let Some(candidate) = evaluate_origin(space, origin_x, origin_y, width, height, max_dead_boards) {
                best = Some(better_of(best, candidate));
            }
        }
    }
    best.ok_or(GeometryError::NoFit)
}

pub fn find_rectangle_at_root(
    space: &SearchSpace,
    root_board_id: i64,
    width: u32,
    height: u32,
    max_dead_boards: u32,
) -> Result<Placement, GeometryError> {
    let root = space
        .boards
        .iter()
        .find(|b| b.board_id == root_board_id)
        .ok_or(GeometryError::BoardNotFound)?;

    if width > space.machine_width || height > space.machine_height {
        return Err(GeometryError::DoesNotFit);
    }

    evaluate_origin(space, root.x, root.y, width, height, max_dead_boards).ok_or(GeometryError::NoFit)
}

pub fn find_single_board(space: &SearchSpace, criterion: BoardCriterion) -> Result<Placement, GeometryError> {
    // Physical (cabinet, frame, board) lookups need data this crate does not
    // carry on BoardSlot; callers resolve those to a BoardId before calling
    // in, same as an IP lookup. We still accept the variant so the Store
    // layer has one enum to translate into.
    let board = space
        .board_by(criterion, &|_| false)
        .ok_or(GeometryError::BoardNotFound)?;

    if !board.allocatable {
        return Err(GeometryError::BoardUnavailable);
    }

    Ok(Placement {
        origin_x: board.x,
        origin_y: board.y,
        width: 1,
        height: 1,
        depth: 1,
        dead_boards: 0,
        root_board_id: board.board_id,
        board_ids: vec![board.board_id],
        perimeter: space.links.iter().flat_map(|_| std::iter::empty()).collect(),
        power_off_timestamp: board.power_off_timestamp,
    })
    .map(|mut placement| {
        // A single board's perimeter is every direction: nothing inside
        // the allocation to be interior to.
        placement.perimeter = spalloc_domain_models::direction::ALL_DIRECTIONS
            .into_iter()
            .map(|direction| (board.board_id, direction))
            .collect();
        placement
    })
}

fn evaluate_origin(
    space: &SearchSpace,
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
    max_dead_boards: u32,
) -> Option<Placement> {
    let in_rect: Vec<&BoardSlot> = space
        .boards
        .iter()
        .filter(|b| b.x >= origin_x && b.x < origin_x + width && b.y >= origin_y && b.y < origin_y + height)
        .collect();

    let total_slots = width * height * space.machine_depth;
    if in_rect.len() as u32 != total_slots {
        // The machine definition has holes inside this rectangle (fewer
        // physical boards than triad slots): cannot be a valid candidate.
        return None;
    }

    let root = space.board_at(origin_x, origin_y, 0)?;
    if !root.allocatable {
        return None;
    }

    let allocatable: HashSet<i64> = in_rect.iter().filter(|b| b.allocatable).map(|b| b.board_id).collect();
    let reached = connected_board_ids(root.board_id, &allocatable, &space.links);

    let dead = total_slots.saturating_sub(reached.len() as u32);
    if dead > max_dead_boards {
        return None;
    }

    let allocation_set: HashSet<i64> = reached.iter().copied().collect();
    let board_ids: Vec<i64> = in_rect
        .iter()
        .filter(|b| allocation_set.contains(&b.board_id))
        .map(|b| b.board_id)
        .collect();
    let edges = perimeter(&allocation_set, &space.boards, &space.links);

    Some(Placement {
        origin_x,
        origin_y,
        width,
        height,
        depth: space.machine_depth,
        dead_boards: dead,
        root_board_id: root.board_id,
        board_ids,
        perimeter: edges,
        power_off_timestamp: root.power_off_timestamp,
    })
}

/// Orden de preferencia (spec §4.B): menos placas muertas gana; en empate,
/// el origen `(x, y)` mas bajo gana. Para una placa unica (spec §8
/// "Boundary behaviours": "Allocation of num_boards = 1 ... preferring the
/// one longest powered-off"), el desempate real es la apagada hace mas
/// tiempo, no el origen mas bajo: el origen solo decide si dos placas
/// llevan exactamente la misma marca de apagado (o ninguna la tiene).
fn better_of(current: Option<Placement>, candidate: Placement) -> Placement {
    match current {
        None => candidate,
        Some(existing) => {
            let single_board = existing.width == 1 && existing.height == 1;
            let better = if single_board {
                let existing_key = (existing.dead_boards, existing.power_off_timestamp, existing.origin_x, existing.origin_y);
                let candidate_key = (candidate.dead_boards, candidate.power_off_timestamp, candidate.origin_x, candidate.origin_y);
                candidate_key < existing_key
            } else {
                let existing_key = (existing.dead_boards, existing.origin_x, existing.origin_y);
                let candidate_key = (candidate.dead_boards, candidate.origin_x, candidate.origin_y);
                candidate_key < existing_key
            };
            if better {
                candidate
            } else {
                existing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_4x4x1(dead: &[(u32, u32)]) -> SearchSpace {
        let mut boards = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                boards.push(BoardSlot { board_id: (y * 4 + x) as i64, x, y, z: 0, allocatable: !dead.contains(&(x, y)), power_off_timestamp: None });
            }
        }
        let mut links = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                if x + 1 < 4 {
                    links.push(LiveLink {
                        board_1: (y * 4 + x) as i64,
                        direction_1: Direction::East,
                        board_2: (y * 4 + x + 1) as i64,
                        direction_2: Direction::West,
                    });
                }
                if y + 1 < 4 {
                    links.push(LiveLink {
                        board_1: (y * 4 + x) as i64,
                        direction_1: Direction::North,
                        board_2: ((y + 1) * 4 + x) as i64,
                        direction_2: Direction::South,
                    });
                }
            }
        }
        SearchSpace { machine_width: 4, machine_height: 4, machine_depth: 1, boards, links }
    }

    #[test]
    fn finds_lowest_origin_when_all_free() {
        let space = grid_4x4x1(&[]);
        let placement = find_rectangle(&space, 2, 2, 0).unwrap();
        assert_eq!((placement.origin_x, placement.origin_y), (0, 0));
        assert_eq!(placement.dead_boards, 0);
        assert_eq!(placement.board_ids.len(), 4);
    }

    #[test]
    fn rejects_oversized_rectangle_as_does_not_fit() {
        let space = grid_4x4x1(&[]);
        assert_eq!(find_rectangle(&space, 5, 1, 0), Err(GeometryError::DoesNotFit));
    }

    #[test]
    fn zero_tolerance_requires_fully_allocatable_rectangle() {
        let space = grid_4x4x1(&[(0, 0)]);
        // (0,0)-(1,1) contains the dead board: must fail at tolerance 0.
        let placement = find_rectangle(&space, 2, 2, 0);
        assert!(placement.is_ok(), "some other 2x2 origin must still be free");
        let chosen = placement.unwrap();
        assert!(!(chosen.origin_x == 0 && chosen.origin_y == 0));
    }

    #[test]
    fn dead_board_outside_tolerance_is_rejected_for_whole_machine() {
        // With 3 dead boards and tolerance 2, a 4x4 request covering
        // everything must fail (16 slots - 3 reachable-loss > 2).
        let space = grid_4x4x1(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(find_rectangle(&space, 4, 4, 2), Err(GeometryError::NoFit));
    }

    #[test]
    fn single_board_lookup_requires_allocatable() {
        let space = grid_4x4x1(&[(0, 0)]);
        assert_eq!(
            find_single_board(&space, BoardCriterion::BoardId(0)),
            Err(GeometryError::BoardUnavailable)
        );
        assert!(find_single_board(&space, BoardCriterion::BoardId(1)).is_ok());
    }

    #[test]
    fn single_board_rectangle_prefers_longest_powered_off_over_lowest_origin() {
        use chrono::TimeZone;

        let mut space = grid_4x4x1(&[]);
        // Board (0,0) would normally win on lowest origin, but it was
        // powered off far more recently than (2,0).
        let recent = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let ancient = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        space.boards[0].power_off_timestamp = Some(recent);
        let board_2_0 = space.boards.iter_mut().find(|b| b.x == 2 && b.y == 0).unwrap();
        board_2_0.power_off_timestamp = Some(ancient);

        let placement = find_rectangle(&space, 1, 1, 0).unwrap();
        assert_eq!((placement.origin_x, placement.origin_y), (2, 0));
    }

    #[test]
    fn single_board_rectangle_falls_back_to_lowest_origin_when_equally_off() {
        let space = grid_4x4x1(&[]);
        let placement = find_rectangle(&space, 1, 1, 0).unwrap();
        assert_eq!((placement.origin_x, placement.origin_y), (0, 0));
    }
}
