//! Async session driver.
//!
//! One task owns the [`PuzzleSession`] together with its two periodic
//! timers. Commands arrive over a channel, timer callbacks are handled in
//! the same loop, so the session is never touched concurrently. Every
//! transition event is also published on the event channel.

use crate::action::{Interaction, InteractionOutcome};
use crate::grid::{Coord, Grid};
use crate::phases::SessionEvent;
use crate::session::{PuzzleSession, SessionError, SessionSnapshot};
use crate::timer::{CLOCK_PERIOD, LEAK_CHECK_PERIOD, PeriodicTimer};
use derive_more::{Display, Error};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Errors from [`SessionHandle`] requests.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DriverError {
    /// The driver task has stopped.
    #[display("Session driver is no longer running")]
    Closed,

    /// The session refused the command.
    #[display("{}", _0)]
    Session(SessionError),
}

impl From<SessionError> for DriverError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

type Transition = Result<Option<SessionEvent>, SessionError>;

#[derive(Debug)]
enum Command {
    Start {
        level: usize,
        reply: oneshot::Sender<Transition>,
    },
    StartWithGrid {
        level: usize,
        grid: Grid,
        reply: oneshot::Sender<Transition>,
    },
    Interact {
        interaction: Interaction,
        reply: oneshot::Sender<InteractionOutcome>,
    },
    Restart {
        reply: oneshot::Sender<Transition>,
    },
    NextLevel {
        reply: oneshot::Sender<Transition>,
    },
    ExitToMenu {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Owns a session and drives its clock and leak check.
pub struct SessionDriver {
    session: PuzzleSession,
    clock: PeriodicTimer,
    leak_check: PeriodicTimer,
    armed_epoch: Option<u64>,
    commands: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionDriver {
    /// Spawns the driver task.
    ///
    /// Returns a handle for commands, the receiving end of the event
    /// channel, and the task handle. The task ends once every handle is
    /// dropped.
    #[instrument(skip(session), fields(state = %session.state()))]
    pub fn spawn(
        session: PuzzleSession,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<()>,
    ) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let driver = Self {
            session,
            clock: PeriodicTimer::new("clock", CLOCK_PERIOD),
            leak_check: PeriodicTimer::new("leak-check", LEAK_CHECK_PERIOD),
            armed_epoch: None,
            commands,
            event_tx,
        };
        let task = tokio::spawn(driver.run());

        (SessionHandle { command_tx }, event_rx, task)
    }

    async fn run(mut self) {
        info!("Session driver started");
        self.sync_timers();

        loop {
            // Timers go first so a burst of queued commands cannot hold back
            // the clock.
            tokio::select! {
                biased;

                _ = self.clock.tick() => {
                    let event = self.session.tick();
                    self.publish(event);
                }
                _ = self.leak_check.tick() => {
                    let event = self.session.check_leaks();
                    self.publish(event);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
            self.sync_timers();
        }

        self.clock.cancel();
        self.leak_check.cancel();
        info!("Session driver stopped");
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "Handling command");
        match command {
            Command::Start { level, reply } => {
                let result = self.session.start(level);
                self.reply_transition(reply, result);
            }
            Command::StartWithGrid { level, grid, reply } => {
                let result = self.session.start_with_grid(level, grid);
                self.reply_transition(reply, result);
            }
            Command::Interact { interaction, reply } => {
                let outcome = self.session.interact(interaction);
                self.publish(outcome.event());
                respond(reply, outcome);
            }
            Command::Restart { reply } => {
                let result = self.session.restart();
                self.reply_transition(reply, result);
            }
            Command::NextLevel { reply } => {
                let result = self.session.next_level();
                self.reply_transition(reply, result);
            }
            Command::ExitToMenu { reply } => {
                self.session.exit_to_menu();
                respond(reply, ());
            }
            Command::Snapshot { reply } => {
                respond(reply, self.session.snapshot());
            }
        }
    }

    fn reply_transition(&self, reply: oneshot::Sender<Transition>, result: Transition) {
        if let Ok(event) = &result {
            self.publish(*event);
        }
        respond(reply, result);
    }

    fn publish(&self, event: Option<SessionEvent>) {
        let Some(event) = event else {
            return;
        };
        info!(%event, "Publishing session event");
        if self.event_tx.send(event).is_err() {
            debug!("No event subscriber");
        }
    }

    /// Keeps both timers running exactly while the session plays.
    ///
    /// A new epoch (start or restart) re-arms them from zero.
    fn sync_timers(&mut self) {
        let wanted = self
            .session
            .state()
            .is_playing()
            .then(|| self.session.epoch());
        if wanted == self.armed_epoch {
            return;
        }

        self.clock.cancel();
        self.leak_check.cancel();
        if wanted.is_some() {
            self.clock.start();
            self.leak_check.start();
        }
        debug!(?wanted, previous = ?self.armed_epoch, "Timers synchronized");
        self.armed_epoch = wanted;
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("Caller went away before the reply");
    }
}

/// Cloneable handle to a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Starts `level` on a generated grid.
    #[instrument(skip(self))]
    pub async fn start(&self, level: usize) -> Result<Option<SessionEvent>, DriverError> {
        Ok(self.request(|reply| Command::Start { level, reply }).await??)
    }

    /// Starts `level` on a prepared grid.
    #[instrument(skip(self, grid))]
    pub async fn start_with_grid(
        &self,
        level: usize,
        grid: Grid,
    ) -> Result<Option<SessionEvent>, DriverError> {
        Ok(self
            .request(|reply| Command::StartWithGrid { level, grid, reply })
            .await??)
    }

    /// Submits an interaction.
    #[instrument(skip(self))]
    pub async fn interact(
        &self,
        interaction: Interaction,
    ) -> Result<InteractionOutcome, DriverError> {
        self.request(|reply| Command::Interact { interaction, reply })
            .await
    }

    /// Swaps two cells.
    pub async fn swap(&self, a: Coord, b: Coord) -> Result<InteractionOutcome, DriverError> {
        self.interact(Interaction::swap(a, b)).await
    }

    /// Rotates one cell.
    pub async fn rotate(&self, at: Coord) -> Result<InteractionOutcome, DriverError> {
        self.interact(Interaction::rotate(at)).await
    }

    /// Shuffles every movable rotation.
    pub async fn shuffle(&self) -> Result<InteractionOutcome, DriverError> {
        self.interact(Interaction::Shuffle).await
    }

    /// Replays the current level.
    #[instrument(skip(self))]
    pub async fn restart(&self) -> Result<Option<SessionEvent>, DriverError> {
        Ok(self.request(|reply| Command::Restart { reply }).await??)
    }

    /// Advances after a completed level.
    #[instrument(skip(self))]
    pub async fn next_level(&self) -> Result<Option<SessionEvent>, DriverError> {
        Ok(self.request(|reply| Command::NextLevel { reply }).await??)
    }

    /// Returns to the menu.
    #[instrument(skip(self))]
    pub async fn exit_to_menu(&self) -> Result<(), DriverError> {
        self.request(|reply| Command::ExitToMenu { reply }).await
    }

    /// Current session snapshot.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, DriverError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .map_err(|_| DriverError::Closed)?;
        response.await.map_err(|_| DriverError::Closed)
    }
}
