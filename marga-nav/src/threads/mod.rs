//! Task threads for MargaNav.
//!
//! Four tasks, each on its own named thread, talking only over channels:
//! - Planner: verifies endpoints, prepares and segments paths
//! - Maze: solves blocked spans
//! - Executor: orders segments and drives the motion sink
//! - Recovery: picks a position to return to after a recoverable failure
//!
//! Every task handles one message to completion before taking the next.
//! Tasks exit when their input channels close.

mod executor;
mod maze;
mod planner;
mod recovery;

pub use executor::{ExecutorTask, MotionSink, TracingSink};
pub use maze::MazeTask;
pub use planner::PlannerTask;
pub use recovery::RecoveryTask;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use marga::World;

use crate::config::NavConfig;
use crate::messages::{ExecutorInput, MazeRequest, Outcome, PlanRequest, RecoveryRequest};
use crate::shared::SharedPose;

/// World shared by every task.
pub type SharedWorld = Arc<dyn World>;

/// Thread handles for the task runtime.
pub struct TaskHandles {
    pub planner: JoinHandle<()>,
    pub maze: JoinHandle<()>,
    pub executor: JoinHandle<()>,
    pub recovery: JoinHandle<()>,
}

impl TaskHandles {
    /// Wait for every task to exit.
    pub fn join(self) {
        for (name, handle) in [
            ("planner", self.planner),
            ("maze", self.maze),
            ("executor", self.executor),
            ("recovery", self.recovery),
        ] {
            if let Err(e) = handle.join() {
                tracing::error!("{} thread panicked: {:?}", name, e);
            }
        }
    }
}

/// Caller ends of the task channels.
pub struct TaskLinks {
    pub plans: Sender<PlanRequest>,
    pub recoveries: Sender<RecoveryRequest>,
    pub executor: Sender<ExecutorInput>,
    pub outcomes: Receiver<Outcome>,
}

/// Spawn all tasks and return their handles and channel ends.
pub fn spawn_tasks<S: MotionSink + 'static>(
    config: &NavConfig,
    world: SharedWorld,
    pose: Arc<SharedPose>,
    sink: S,
) -> (TaskHandles, TaskLinks) {
    // Caller-facing queues are bounded; task-to-task traffic must never block
    let (plan_tx, plan_rx) = bounded::<PlanRequest>(config.tasks.queue_depth);
    let (recovery_tx, recovery_rx) = bounded::<RecoveryRequest>(config.tasks.queue_depth);
    let (maze_tx, maze_rx) = unbounded::<MazeRequest>();
    let (executor_tx, executor_rx) = unbounded::<ExecutorInput>();
    let (outcome_tx, outcome_rx) = unbounded::<Outcome>();

    let planning = &config.planning;

    let mut planner = PlannerTask::new(
        planning,
        Arc::clone(&world),
        plan_rx,
        executor_tx.clone(),
        maze_tx,
    );
    let planner_handle = thread::Builder::new()
        .name("planner".into())
        .spawn(move || {
            if let Err(e) = planner.run() {
                tracing::error!("Planner task error: {}", e);
            }
        })
        .expect("Failed to spawn planner thread");

    let mut maze = MazeTask::new(
        planning.maze_limits(),
        Arc::clone(&world),
        maze_rx,
        executor_tx.clone(),
    );
    let maze_handle = thread::Builder::new()
        .name("maze".into())
        .spawn(move || {
            if let Err(e) = maze.run() {
                tracing::error!("Maze task error: {}", e);
            }
        })
        .expect("Failed to spawn maze thread");

    let mut recovery = RecoveryTask::new(
        planning.recovery_settings(),
        planning.probe_config(),
        world,
        Arc::clone(&pose),
        recovery_rx,
        executor_tx.clone(),
        outcome_tx.clone(),
    );
    let recovery_handle = thread::Builder::new()
        .name("recovery".into())
        .spawn(move || {
            if let Err(e) = recovery.run() {
                tracing::error!("Recovery task error: {}", e);
            }
        })
        .expect("Failed to spawn recovery thread");

    let mut executor = ExecutorTask::new(config.settle_delay(), pose, sink, executor_rx, outcome_tx);
    let executor_handle = thread::Builder::new()
        .name("executor".into())
        .spawn(move || {
            if let Err(e) = executor.run() {
                tracing::error!("Executor task error: {}", e);
            }
        })
        .expect("Failed to spawn executor thread");

    (
        TaskHandles {
            planner: planner_handle,
            maze: maze_handle,
            executor: executor_handle,
            recovery: recovery_handle,
        },
        TaskLinks {
            plans: plan_tx,
            recoveries: recovery_tx,
            executor: executor_tx,
            outcomes: outcome_rx,
        },
    )
}
