//! Host wiring of catalog, pool and orchestrator around a synthetic renderer.

use std::{cell::Cell, rc::Rc, sync::Arc, time::Duration};

use liminal_core::{Direction, RoomConfig, RoomIndex, TransitionTrigger};
use liminal_system_transition::{
    StartOutcome, TransitionEvent, TransitionInputs, TransitionOrchestrator,
};
use liminal_world::{BufferId, BufferRegistry, RealizedRoom, RoomCatalog, RoomPool};
use tracing::{debug, trace};

use crate::config::LiminalConfig;

const FLOOR_BYTES_PER_SQUARE_METRE: f32 = 64.0 * 1024.0;
const WALL_BYTES_PER_SQUARE_METRE: f32 = 48.0 * 1024.0;
const PATTERN_TEXTURE_BYTES: u64 = 2 * 1024 * 1024;

const FLOOR_BUFFER: BufferId = BufferId::new(0);
const PATTERN_BUFFER: BufferId = BufferId::new(16);

/// Stand-in for the GPU resources a renderer would build for a room.
#[derive(Debug)]
pub(crate) struct SimulatedRoom {
    index: RoomIndex,
    buffers: Vec<(BufferId, u64)>,
    disposed: bool,
    disposals: Rc<Cell<u64>>,
}

impl SimulatedRoom {
    fn build(config: &RoomConfig, disposals: &Rc<Cell<u64>>) -> Self {
        let dimensions = config.dimensions();
        let floor = dimensions.width() * dimensions.depth() * FLOOR_BYTES_PER_SQUARE_METRE;
        let mut buffers = vec![(FLOOR_BUFFER, floor as u64)];
        for wall in Direction::ALL {
            let area = dimensions.wall_length(wall) * dimensions.height();
            let bytes = (area * WALL_BYTES_PER_SQUARE_METRE) as u64;
            buffers.push((BufferId::new(1 + u64::from(wall.code())), bytes));
        }
        Self {
            index: config.index(),
            buffers,
            disposed: false,
            disposals: Rc::clone(disposals),
        }
    }
}

impl RealizedRoom for SimulatedRoom {
    fn register_buffers(&self, registry: &mut BufferRegistry) {
        // Floor and walls share one pattern texture.
        for (buffer, bytes) in &self.buffers {
            let _ = registry.record(*buffer, *bytes);
            let _ = registry.record(PATTERN_BUFFER, PATTERN_TEXTURE_BYTES);
        }
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.buffers.retain(|(candidate, _)| *candidate != buffer);
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.buffers.clear();
        self.disposals.set(self.disposals.get() + 1);
        trace!(room = self.index.get(), "simulated room disposed");
    }
}

/// Everything a frame loop needs to walk through rooms.
#[derive(Debug)]
pub(crate) struct Session {
    catalog: RoomCatalog,
    pool: RoomPool<SimulatedRoom>,
    orchestrator: TransitionOrchestrator,
    current: Arc<RoomConfig>,
    events: Vec<TransitionEvent>,
    realizations_per_frame: usize,
    disposals: Rc<Cell<u64>>,
    midpoint_hooks: Rc<Cell<u32>>,
    peak_realized_bytes: u64,
}

impl Session {
    pub(crate) fn new(config: &LiminalConfig) -> Self {
        let mut catalog = RoomCatalog::new(
            config.seed,
            config.generation.clone(),
            config.variation.clone(),
        );
        let mut pool = RoomPool::new(config.pool.clone());
        pool.set_current(RoomIndex::ORIGIN, &mut catalog);
        let current = pool.config(RoomIndex::ORIGIN, &mut catalog);
        let mut session = Self {
            catalog,
            pool,
            orchestrator: TransitionOrchestrator::new(config.seed, config.transition.clone()),
            current,
            events: Vec::new(),
            realizations_per_frame: config.walk.realizations_per_frame.max(1),
            disposals: Rc::default(),
            midpoint_hooks: Rc::default(),
            peak_realized_bytes: 0,
        };
        session.realize_pending();
        session
    }

    pub(crate) fn current(&self) -> &Arc<RoomConfig> {
        &self.current
    }

    pub(crate) fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    pub(crate) fn pool(&self) -> &RoomPool<SimulatedRoom> {
        &self.pool
    }

    pub(crate) fn begin(
        &mut self,
        trigger: TransitionTrigger,
        to_index: RoomIndex,
        inputs: TransitionInputs,
    ) -> StartOutcome {
        let hooks = Rc::clone(&self.midpoint_hooks);
        self.orchestrator.start(
            trigger,
            Arc::clone(&self.current),
            to_index,
            &mut self.catalog,
            inputs,
            Some(Box::new(move |index: RoomIndex, _: &Arc<RoomConfig>| {
                hooks.set(hooks.get() + 1);
                trace!(room = index.get(), "midpoint hook fired");
            })),
        )
    }

    /// Runs one frame. Returns `true` when the active transition completed.
    pub(crate) fn frame(&mut self, delta: Duration) -> bool {
        let completed = self.orchestrator.update(delta, &mut self.events);
        for event in self.events.drain(..) {
            match event {
                TransitionEvent::MidpointSwap { to_index, config } => {
                    self.pool.set_current(to_index, &mut self.catalog);
                    self.current = config;
                }
                TransitionEvent::PhaseChanged { from, to } => {
                    trace!(?from, ?to, "transition phase changed");
                }
                TransitionEvent::Completed { to_index, effect } => {
                    debug!(room = to_index.get(), ?effect, "arrived");
                }
            }
        }
        let _ = self.pool.touch(self.current.index());
        self.realize_pending();
        completed
    }

    pub(crate) fn emergency_flush(&mut self) -> usize {
        self.pool.emergency_flush()
    }

    pub(crate) fn disposed_rooms(&self) -> u64 {
        self.disposals.get()
    }

    pub(crate) fn midpoint_hooks(&self) -> u32 {
        self.midpoint_hooks.get()
    }

    pub(crate) fn peak_realized_bytes(&self) -> u64 {
        self.peak_realized_bytes
    }

    /// Tears the pool down, disposing every realized room.
    pub(crate) fn shutdown(&mut self) {
        let _ = self.orchestrator.cancel();
        self.pool.dispose();
    }

    fn realize_pending(&mut self) {
        for request in self.pool.drain_realization_requests(self.realizations_per_frame) {
            let room = SimulatedRoom::build(&request.config, &self.disposals);
            let _ = self.pool.attach_realized(request.index, room);
            self.peak_realized_bytes = self.peak_realized_bytes.max(self.pool.realized_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liminal_world::PoolConfig;

    fn frames_until_done(session: &mut Session) -> u32 {
        let mut frames = 1;
        while !session.frame(Duration::from_millis(16)) {
            frames += 1;
        }
        frames
    }

    #[test]
    fn pattern_texture_is_counted_once() {
        let config = RoomConfig::new(
            RoomIndex::new(1),
            liminal_core::RoomDimensions::new(4.0, 4.0, 3.0),
            Vec::new(),
            0,
            0,
            None,
            None,
        );
        let room = SimulatedRoom::build(&config, &Rc::default());
        let mut registry = BufferRegistry::new();
        room.register_buffers(&mut registry);
        assert_eq!(registry.len(), 6);
        let floor = 16.0 * FLOOR_BYTES_PER_SQUARE_METRE;
        let walls = 4.0 * 12.0 * WALL_BYTES_PER_SQUARE_METRE;
        assert_eq!(
            registry.total_bytes(),
            floor as u64 + walls as u64 + PATTERN_TEXTURE_BYTES
        );
    }

    #[test]
    fn midpoint_swap_moves_the_window() {
        let mut session = Session::new(&LiminalConfig::default());
        let outcome = session.begin(
            TransitionTrigger::Forced,
            RoomIndex::new(1),
            TransitionInputs::default(),
        );
        assert!(matches!(outcome, StartOutcome::Started { .. }));
        let _ = frames_until_done(&mut session);

        assert_eq!(session.current().index(), RoomIndex::new(1));
        assert_eq!(session.pool().current(), Some(RoomIndex::new(1)));
        let indices: Vec<u32> = session.pool().indices().iter().map(RoomIndex::get).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(session.midpoint_hooks(), 1);
    }

    #[test]
    fn tight_budget_keeps_current_room_realized() {
        let config = LiminalConfig {
            pool: PoolConfig::new(2, 1),
            ..LiminalConfig::default()
        };
        let mut session = Session::new(&config);
        for _ in 0..4 {
            let _ = session.frame(Duration::from_millis(16));
        }
        assert_eq!(
            session.pool().realized_indices(),
            vec![RoomIndex::ORIGIN],
            "only the current room may stay over budget"
        );
        assert!(session.disposed_rooms() >= 2);

        session.shutdown();
        assert!(session.pool().indices().is_empty());
    }
}
