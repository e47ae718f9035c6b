//! Maze task: solves blocked spans one request at a time.
//!
//! Solves are never interrupted. A reply for a request that was stopped or
//! superseded meanwhile is dropped by the executor.

use crossbeam_channel::{Receiver, Sender};

use marga::maze::{MazeLimits, MazeSolver};
use marga::{PathStatus, Prober, WorldPoint};

use crate::error::{NavError, Result};
use crate::messages::{ExecutorInput, MazeReply, MazeRequest};

use super::SharedWorld;

/// Maze task state and logic.
pub struct MazeTask {
    world: SharedWorld,
    limits: MazeLimits,
    requests: Receiver<MazeRequest>,
    executor: Sender<ExecutorInput>,
    solved: usize,
}

impl MazeTask {
    /// Create a new maze task.
    pub fn new(
        limits: MazeLimits,
        world: SharedWorld,
        requests: Receiver<MazeRequest>,
        executor: Sender<ExecutorInput>,
    ) -> Self {
        Self {
            world,
            limits,
            requests,
            executor,
            solved: 0,
        }
    }

    /// Run until the request channel closes.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Maze task started");

        while let Ok(request) = self.requests.recv() {
            let reply = self.solve(request);
            self.executor
                .send(ExecutorInput::Maze(reply))
                .map_err(|_| NavError::ChannelClosed("executor"))?;
        }

        tracing::info!("Maze task shutting down after {} detours", self.solved);
        Ok(())
    }

    /// Solve one span. Each solve owns its grid; nothing carries over.
    pub fn solve(&mut self, request: MazeRequest) -> MazeReply {
        let outcome = self.detour(&request);
        MazeReply {
            path_id: request.path_id,
            seq: request.seq,
            outcome,
        }
    }

    fn detour(&mut self, request: &MazeRequest) -> std::result::Result<Vec<WorldPoint>, PathStatus> {
        let prober = Prober::new(&*self.world, request.capsule, request.probe);
        let layout = request.layout;
        tracing::debug!(
            "Request {} segment {}: {}x{} grid, cell {:.2}m",
            request.path_id,
            request.seq,
            layout.width,
            layout.height,
            layout.frame.cell_size()
        );

        match MazeSolver::new(&prober, layout, self.limits.clone()).and_then(|s| s.solve()) {
            Ok(solution) => {
                self.solved += 1;
                tracing::debug!(
                    "Request {} segment {}: detour of {:.2}m in {} iterations",
                    request.path_id,
                    request.seq,
                    solution.length(),
                    solution.iterations
                );
                Ok(solution.points)
            }
            Err(e) if e.is_invariant() => {
                tracing::error!(
                    "Request {} segment {}: {}; maze state reset",
                    request.path_id,
                    request.seq,
                    e
                );
                Err(e.status())
            }
            Err(e) => {
                tracing::info!(
                    "Request {} segment {}: maze failed: {}",
                    request.path_id,
                    request.seq,
                    e
                );
                Err(e.status())
            }
        }
    }
}
