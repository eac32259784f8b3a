// [apps/allocatord/src/services/allocator.rs]
//! El tick del Allocator (spec §4.C): por pasada, despacha todas las
//! solicitudes encoladas en orden `(importance DESC, req_id ASC)`, coloca
//! las que caben, envejece las que no, y destruye los trabajos cuya
//! solicitud es irrecuperable.

use crate::errors::AllocatorError;
use crate::state::AppState;
use chrono::Utc;
use spalloc_core_geometry::{find_board, find_by_root, find_by_size, BoardCriterion, BoardSlot, GeometryError, LiveLink, SearchSpace};
use spalloc_domain_models::board::Functioning;
use spalloc_domain_models::direction::LinkBitmap;
use spalloc_domain_models::{Board, JobState, Link, Machine, PendingChange, Request, RequestShape};
use spalloc_infra_store::repositories::{BoardRepository, JobRepository, LinkRepository, MachineRepository, PendingChangeRepository, RequestRepository};
use spalloc_infra_store::Tx;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

pub struct Allocator;

impl Allocator {
    /// Una pasada completa del Allocator. Dos pasadas nunca corren
    /// concurrentemente: el llamador (el Scheduler) es quien garantiza la
    /// exclusion mutua por tarea nombrada (spec §4.C, §4.G).
    #[instrument(skip(state))]
    pub async fn tick(state: &AppState) -> Result<(), AllocatorError> {
        let tx = state.store.begin().await?;
        let requests = RequestRepository::list_queued(&tx).await?;

        if requests.is_empty() {
            tx.commit().await?;
            return Ok(());
        }

        debug!(count = requests.len(), "allocator tick dispatching queued requests");
        let mut touched_machines = HashSet::new();

        for request in requests {
            match Self::place_one(&tx, &request).await {
                Ok(machine_id) => {
                    touched_machines.insert(machine_id);
                }
                Err(AllocatorError::NoFit) => {
                    // `NoFit` lumps two very different situations together:
                    // boards busy with other jobs (transient, worth aging
                    // and retrying) and boards permanently `functioning=0`
                    // past the request's tolerance (spec §8, scenario 3:
                    // must reject immediately, not spin forever). Re-run the
                    // same search pretending every non-broken board is free
                    // to tell them apart.
                    if Self::exceeds_dead_tolerance(&tx, &request).await? {
                        warn!(req_id = request.req_id, job_id = request.job_id, "request exceeds the machine's dead-board tolerance, destroying job");
                        RequestRepository::delete(&tx, request.req_id).await?;
                        JobRepository::set_death(&tx, request.job_id, Some("requested shape exceeds the machine's dead-board tolerance"), Utc::now()).await?;
                        JobRepository::update_state(&tx, request.job_id, JobState::Destroyed).await?;
                    } else {
                        RequestRepository::age_importance(&tx, request.req_id, request.priority).await?;
                    }
                }
                Err(AllocatorError::Store(store_error)) => {
                    // Infraestructura, no semantica de la peticion: aborta la
                    // pasada entera para que el Scheduler reintente de cero.
                    return Err(AllocatorError::Store(store_error));
                }
                Err(other) => {
                    warn!(req_id = request.req_id, job_id = request.job_id, error = %other, "request rejected, destroying job");
                    RequestRepository::delete(&tx, request.req_id).await?;
                    JobRepository::set_death(&tx, request.job_id, Some(&other.to_string()), Utc::now()).await?;
                    JobRepository::update_state(&tx, request.job_id, JobState::Destroyed).await?;
                }
            }
        }

        tx.commit().await?;

        for machine_id in touched_machines {
            info!(machine_id, "allocator placed boards, waking power controller");
            state.notify_power_change(machine_id);
        }

        Ok(())
    }

    /// Intenta colocar una unica solicitud. `Ok(machine_id)` significa que
    /// la asignacion se escribio dentro de `tx`; `Err(NoFit)` significa que
    /// debe reintentarse en una pasada futura; cualquier otro error implica
    /// que la solicitud es irrecuperable.
    async fn place_one(tx: &Tx, request: &Request) -> Result<i64, AllocatorError> {
        let job = JobRepository::get(tx, request.job_id).await?;
        let machine = MachineRepository::get(tx, job.machine_id).await?;
        let boards = BoardRepository::list_for_machine(tx, job.machine_id).await?;
        let links = LinkRepository::list_for_machine(tx, job.machine_id).await?;
        let space = build_search_space(&machine, &boards, &links);

        let placement = Self::search(&machine, &space, request)?;

        for &board_id in &placement.board_ids {
            BoardRepository::set_allocated_job(tx, board_id, Some(job.job_id)).await?;
        }

        let now = Utc::now();
        JobRepository::set_allocation(
            tx,
            job.job_id,
            placement.root_board_id,
            placement.width,
            placement.height,
            placement.depth,
            placement.board_ids.len() as u32,
            now,
        )
        .await?;

        let perimeter_bitmaps = group_perimeter_by_board(&placement.perimeter);
        for (board_id, bitmap) in &perimeter_bitmaps {
            PendingChangeRepository::insert(tx, &PendingChange::power_on(job.job_id, *board_id, *bitmap)).await?;
        }
        JobRepository::adjust_pending(tx, job.job_id, perimeter_bitmaps.len() as i64).await?;

        Ok(job.machine_id)
    }

    /// Responde si, incluso suponiendo que cada placa no rota estuviera
    /// libre ahora mismo, la solicitud seguiria sin caber. `true` implica
    /// que ninguna cantidad de espera la va a resolver.
    async fn exceeds_dead_tolerance(tx: &Tx, request: &Request) -> Result<bool, AllocatorError> {
        let job = JobRepository::get(tx, request.job_id).await?;
        let machine = MachineRepository::get(tx, job.machine_id).await?;
        let boards = BoardRepository::list_for_machine(tx, job.machine_id).await?;
        let links = LinkRepository::list_for_machine(tx, job.machine_id).await?;
        let space = build_best_case_space(&machine, &boards, &links);
        Ok(Self::search(&machine, &space, request).is_err())
    }

    /// Resuelve la forma de la solicitud contra la busqueda de geometria
    /// correspondiente (spec §4.B).
    fn search(machine: &Machine, space: &SearchSpace, request: &Request) -> Result<spalloc_core_geometry::Placement, AllocatorError> {
        let placement = match &request.shape {
            RequestShape::SpecificBoard { board_id } => find_board(space, BoardCriterion::BoardId(*board_id)),
            RequestShape::RootAndDimensions { board_id, width, height } => {
                if !machine.can_possibly_fit(*width, *height) {
                    return Err(GeometryError::DoesNotFit.into());
                }
                find_by_root(space, *board_id, *width, *height, request.max_dead_boards)
            }
            RequestShape::NumBoards { .. } | RequestShape::Dimensions { .. } => {
                let (width, height, tolerance) = request.as_dimensions().expect("dimensioned shape always resolves");
                if !machine.can_possibly_fit(width, height) {
                    return Err(GeometryError::DoesNotFit.into());
                }
                find_by_size(space, width, height, request.max_dead_boards.max(tolerance))
            }
        };
        placement.map_err(AllocatorError::from)
    }
}

/// Traduce el censo de placas/enlaces del Store a la foto en memoria que
/// consume `spalloc-core-geometry`, aplicando la resolucion de vivacidad de
/// enlaces fijada en spec §9: vivo si y solo si `link.live` y ambos
/// extremos no estan rotos.
fn build_search_space(machine: &Machine, boards: &[Board], links: &[Link]) -> SearchSpace {
    let slots: Vec<BoardSlot> = boards
        .iter()
        .map(|board| BoardSlot {
            board_id: board.board_id,
            x: board.x,
            y: board.y,
            z: board.z,
            allocatable: board.may_be_allocated(),
            power_off_timestamp: board.power_off_timestamp,
        })
        .collect();

    let functioning: HashMap<i64, bool> = boards.iter().map(|board| (board.board_id, !matches!(board.functioning, Functioning::Broken))).collect();

    let live_links: Vec<LiveLink> = links
        .iter()
        .filter(|link| link.live && *functioning.get(&link.board_1).unwrap_or(&false) && *functioning.get(&link.board_2).unwrap_or(&false))
        .map(|link| LiveLink {
            board_1: link.board_1,
            direction_1: link.direction_1,
            board_2: link.board_2,
            direction_2: link.direction_2,
        })
        .collect();

    SearchSpace {
        machine_width: machine.width,
        machine_height: machine.height,
        machine_depth: machine.depth,
        boards: slots,
        links: live_links,
    }
}

/// Como `build_search_space`, pero ignora quien tiene cada placa asignada
/// ahora mismo: solo el censo de hardware (`functioning`) descarta una
/// placa. Usada para distinguir un `NoFit` transitorio de uno permanente.
fn build_best_case_space(machine: &Machine, boards: &[Board], links: &[Link]) -> SearchSpace {
    let slots: Vec<BoardSlot> = boards
        .iter()
        .map(|board| BoardSlot {
            board_id: board.board_id,
            x: board.x,
            y: board.y,
            z: board.z,
            allocatable: !matches!(board.functioning, Functioning::Broken),
            power_off_timestamp: board.power_off_timestamp,
        })
        .collect();

    let functioning: HashMap<i64, bool> = boards.iter().map(|board| (board.board_id, !matches!(board.functioning, Functioning::Broken))).collect();

    let live_links: Vec<LiveLink> = links
        .iter()
        .filter(|link| link.live && *functioning.get(&link.board_1).unwrap_or(&false) && *functioning.get(&link.board_2).unwrap_or(&false))
        .map(|link| LiveLink {
            board_1: link.board_1,
            direction_1: link.direction_1,
            board_2: link.board_2,
            direction_2: link.direction_2,
        })
        .collect();

    SearchSpace {
        machine_width: machine.width,
        machine_height: machine.height,
        machine_depth: machine.depth,
        boards: slots,
        links: live_links,
    }
}

/// Agrupa los bordes de perimetro `(board_id, direction)` en un bitmap FPGA
/// por placa (spec §4.C paso 2: "Insert one PendingChange per perimeter
/// board ... plus the appropriate per-direction FPGA link-enable bits").
fn group_perimeter_by_board(perimeter: &[(i64, spalloc_domain_models::Direction)]) -> Vec<(i64, LinkBitmap)> {
    let mut bitmaps: HashMap<i64, LinkBitmap> = HashMap::new();
    for (board_id, direction) in perimeter {
        bitmaps.entry(*board_id).or_default().set(*direction);
    }
    bitmaps.into_iter().collect()
}
