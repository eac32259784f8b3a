// [libs/infra/store/src/repositories/link.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::{Direction, Link};

pub struct LinkRepository;

impl LinkRepository {
    pub async fn list_for_machine(tx: &Tx, machine_id: i64) -> Result<Vec<Link>, StoreError> {
        let mut rows = tx.raw().query(queries::LINK_LIST_FOR_MACHINE, params![machine_id]).await.map_err(StoreError::classify)?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            links.push(map_row(&row)?);
        }
        Ok(links)
    }

    pub async fn set_live(tx: &Tx, board_id: i64, direction: Direction, live: bool) -> Result<(), StoreError> {
        tx.raw()
            .execute(queries::LINK_SET_LIVE, params![board_id, direction.ordinal(), live])
            .await
            .map_err(StoreError::classify)?;
        Ok(())
    }
}

fn map_row(row: &Row) -> Result<Link, StoreError> {
    let direction_1 = Direction::from_ordinal(row.get::<i64>(1).map_err(StoreError::classify)? as u8)
        .ok_or_else(|| StoreError::MappingError("invalid direction_1 ordinal".into()))?;
    let direction_2 = Direction::from_ordinal(row.get::<i64>(3).map_err(StoreError::classify)? as u8)
        .ok_or_else(|| StoreError::MappingError("invalid direction_2 ordinal".into()))?;
    Ok(Link {
        board_1: row.get(0).map_err(StoreError::classify)?,
        direction_1,
        board_2: row.get(2).map_err(StoreError::classify)?,
        direction_2,
        live: row.get::<i64>(4).map_err(StoreError::classify)? != 0,
    })
}
