// [libs/infra/store/src/testing.rs]
//! Semillas de datos para pruebas de integracion de los crates
//! consumidores: una maquina rectangular plana con un unico BMP y una
//! reticula de enlaces N/S/E/W, sin pasar por el cargador de definiciones
//! de maquina (fuera de alcance, spec §13). No usa `z`: cada posicion
//! `(x, y)` tiene exactamente una placa, para que las geometrias de prueba
//! no dependan de la interpretacion de la profundidad de triada.

use crate::client::Tx;
use crate::errors::StoreError;
use libsql::params;
use spalloc_domain_models::Direction;

/// Resultado de sembrar una maquina de prueba: los identificadores que un
/// llamador necesita para construir solicitudes concretas.
pub struct SeededMachine {
    pub machine_id: i64,
    pub bmp_id: i64,
    /// Indexado `[x][y]`.
    pub board_ids: Vec<Vec<i64>>,
}

/// Crea una maquina `width x height x 1`, todas las placas `functioning`
/// salvo las listadas en `dead`, con enlaces vivos entre vecinos
/// ortogonales.
pub async fn seed_flat_machine(tx: &Tx, name: &str, width: u32, height: u32, dead: &[(u32, u32)]) -> Result<SeededMachine, StoreError> {
    tx.raw()
        .execute(
            "INSERT INTO machines (name, width, height, depth, max_chip_x, max_chip_y) VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            params![name, width, height, width * 8, height * 8],
        )
        .await
        .map_err(StoreError::classify)?;
    let machine_id = tx.raw().last_insert_rowid();

    tx.raw()
        .execute("INSERT INTO bmps (machine_id, cabinet, frame, address) VALUES (?1, 0, 0, '10.0.0.1')", params![machine_id])
        .await
        .map_err(StoreError::classify)?;
    let bmp_id = tx.raw().last_insert_rowid();

    let mut board_ids = vec![vec![0i64; height as usize]; width as usize];
    let mut board_num = 0u32;
    for x in 0..width {
        for y in 0..height {
            let functioning: Option<i64> = if dead.contains(&(x, y)) { Some(0) } else { Some(1) };
            tx.raw()
                .execute(
                    "INSERT INTO boards (machine_id, x, y, z, cabinet, frame, board_num, root_x, root_y, bmp_id, functioning) \
                     VALUES (?1, ?2, ?3, 0, 0, 0, ?4, ?2, ?3, ?5, ?6)",
                    params![machine_id, x, y, board_num, bmp_id, functioning],
                )
                .await
                .map_err(StoreError::classify)?;
            board_ids[x as usize][y as usize] = tx.raw().last_insert_rowid();
            board_num += 1;
        }
    }

    for x in 0..width {
        for y in 0..height {
            let board_id = board_ids[x as usize][y as usize];
            if x + 1 < width {
                insert_link(tx, board_id, Direction::East, board_ids[(x + 1) as usize][y as usize], Direction::West).await?;
            }
            if y + 1 < height {
                insert_link(tx, board_id, Direction::North, board_ids[x as usize][(y + 1) as usize], Direction::South).await?;
            }
        }
    }

    Ok(SeededMachine { machine_id, bmp_id, board_ids })
}

async fn insert_link(tx: &Tx, board_1: i64, direction_1: Direction, board_2: i64, direction_2: Direction) -> Result<(), StoreError> {
    tx.raw()
        .execute(
            "INSERT INTO links (board_1, direction_1, board_2, direction_2, live) VALUES (?1, ?2, ?3, ?4, 1)",
            params![board_1, direction_1.ordinal(), board_2, direction_2.ordinal()],
        )
        .await
        .map_err(StoreError::classify)?;
    tx.raw()
        .execute(
            "INSERT INTO links (board_1, direction_1, board_2, direction_2, live) VALUES (?1, ?2, ?3, ?4, 1)",
            params![board_2, direction_2.ordinal(), board_1, direction_1.ordinal()],
        )
        .await
        .map_err(StoreError::classify)?;
    Ok(())
}
