// [libs/infra/store/src/repositories/request.rs]

use crate::client::Tx;
use crate::errors::StoreError;
use crate::queries;
use libsql::{params, Row};
use spalloc_domain_models::{Request, RequestShape};

const SHAPE_NUM_BOARDS: i64 = 0;
const SHAPE_DIMENSIONS: i64 = 1;
const SHAPE_SPECIFIC_BOARD: i64 = 2;
const SHAPE_ROOT_AND_DIMENSIONS: i64 = 3;

pub struct RequestRepository;

impl RequestRepository {
    pub async fn insert(tx: &Tx, job_id: i64, shape: &RequestShape, max_dead_boards: u32, priority: i64) -> Result<i64, StoreError> {
        let (kind, num_boards, width, height, board_id) = match *shape {
            RequestShape::NumBoards { count } => (SHAPE_NUM_BOARDS, Some(count), None, None, None),
            RequestShape::Dimensions { width, height } => (SHAPE_DIMENSIONS, None, Some(width), Some(height), None),
            RequestShape::SpecificBoard { board_id } => (SHAPE_SPECIFIC_BOARD, None, None, None, Some(board_id)),
            RequestShape::RootAndDimensions { board_id, width, height } => {
                (SHAPE_ROOT_AND_DIMENSIONS, None, Some(width), Some(height), Some(board_id))
            }
        };
        tx.raw()
            .execute(queries::REQUEST_INSERT, params![job_id, kind, num_boards, width, height, board_id, max_dead_boards, priority, priority])
            .await
            .map_err(StoreError::classify)?;
        Ok(tx.raw().last_insert_rowid())
    }

    /// Las solicitudes pendientes, en el orden de despacho exacto del spec
    /// §4.A ("importance DESC, req_id ASC").
    pub async fn list_queued(tx: &Tx) -> Result<Vec<Request>, StoreError> {
        let mut rows = tx.raw().query(queries::REQUEST_LIST_QUEUED, ()).await.map_err(StoreError::classify)?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::classify)? {
            requests.push(map_row(&row)?);
        }
        Ok(requests)
    }

    pub async fn get_latest_for_job(tx: &Tx, job_id: i64) -> Result<Request, StoreError> {
        let mut rows = tx.raw().query(queries::REQUEST_GET_FOR_JOB, params![job_id]).await.map_err(StoreError::classify)?;
        let row = rows.next().await.map_err(StoreError::classify)?.ok_or(StoreError::NotFound)?;
        map_row(&row)
    }

    /// Envejece la importancia en cada tick sin asignar (spec §4.A: las
    /// peticiones que fallan repetidamente ganan prioridad con el tiempo).
    pub async fn age_importance(tx: &Tx, req_id: i64, delta: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::REQUEST_AGE_IMPORTANCE, params![req_id, delta]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn delete(tx: &Tx, req_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::REQUEST_DELETE, params![req_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }

    pub async fn delete_for_job(tx: &Tx, job_id: i64) -> Result<(), StoreError> {
        tx.raw().execute(queries::REQUEST_DELETE_FOR_JOB, params![job_id]).await.map_err(StoreError::classify)?;
        Ok(())
    }
}

fn map_row(row: &Row) -> Result<Request, StoreError> {
    let kind = row.get::<i64>(2).map_err(StoreError::classify)?;
    let num_boards: Option<i64> = row.get(3).map_err(StoreError::classify)?;
    let width: Option<i64> = row.get(4).map_err(StoreError::classify)?;
    let height: Option<i64> = row.get(5).map_err(StoreError::classify)?;
    let board_id: Option<i64> = row.get(6).map_err(StoreError::classify)?;

    let shape = match kind {
        SHAPE_NUM_BOARDS => RequestShape::NumBoards {
            count: num_boards.ok_or_else(|| StoreError::MappingError("NumBoards row missing count".into()))? as u32,
        },
        SHAPE_DIMENSIONS => RequestShape::Dimensions {
            width: width.ok_or_else(|| StoreError::MappingError("Dimensions row missing width".into()))? as u32,
            height: height.ok_or_else(|| StoreError::MappingError("Dimensions row missing height".into()))? as u32,
        },
        SHAPE_SPECIFIC_BOARD => RequestShape::SpecificBoard {
            board_id: board_id.ok_or_else(|| StoreError::MappingError("SpecificBoard row missing board_id".into()))?,
        },
        SHAPE_ROOT_AND_DIMENSIONS => RequestShape::RootAndDimensions {
            board_id: board_id.ok_or_else(|| StoreError::MappingError("RootAndDimensions row missing board_id".into()))?,
            width: width.ok_or_else(|| StoreError::MappingError("RootAndDimensions row missing width".into()))? as u32,
            height: height.ok_or_else(|| StoreError::MappingError("RootAndDimensions row missing height".into()))? as u32,
        },
        other => return Err(StoreError::MappingError(format!("unknown shape_kind {other}"))),
    };

    Ok(Request {
        req_id: row.get(0).map_err(StoreError::classify)?,
        job_id: row.get(1).map_err(StoreError::classify)?,
        shape,
        max_dead_boards: row.get::<i64>(7).map_err(StoreError::classify)? as u32,
        priority: row.get(8).map_err(StoreError::classify)?,
        importance: row.get(9).map_err(StoreError::classify)?,
    })
}
