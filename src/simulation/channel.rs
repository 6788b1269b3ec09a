use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use crate::config::{COMMAND_CAPACITY, FRAME_CAPACITY};
use crate::pattern::Pattern;
use crate::simulation::Frame;

/// Requests understood by the simulation loop.
#[derive(Clone, Debug)]
pub enum Command {
    /// Re-roll every cell.
    Randomize,
    /// Halt or resume stepping; commands keep being processed either way.
    TogglePause,
    /// Swap in a new pattern with freshly sized planes, then randomize.
    Reconfigure(Arc<Pattern>),
    /// Leave the loop at the top of the next iteration.
    Shutdown,
}

/// Creates the presentation -> simulation command queue.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (sender, receiver) = bounded(COMMAND_CAPACITY);
    (CommandSender { sender }, CommandReceiver { receiver })
}

/// Creates the simulation -> presentation frame mailbox.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (sender, receiver) = bounded(FRAME_CAPACITY);
    (
        FrameSender {
            sender,
            evict: receiver.clone(),
        },
        FrameReceiver { receiver },
    )
}

/// Handle for issuing commands (clone for multiple producers).
#[derive(Clone)]
pub struct CommandSender {
    sender: Sender<Command>,
}

impl CommandSender {
    /// Queues a command without blocking.
    ///
    /// Returns `false` if the command was dropped.
    pub fn send(&self, command: Command) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                log::warn!("command queue full, dropping {:?}", command);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn randomize(&self) -> bool {
        self.send(Command::Randomize)
    }

    pub fn toggle_pause(&self) -> bool {
        self.send(Command::TogglePause)
    }

    pub fn reconfigure(&self, pattern: Pattern) -> bool {
        self.send(Command::Reconfigure(Arc::new(pattern)))
    }

    /// Queues a shutdown, waiting for room if the queue is full.
    ///
    /// Returns `false` if the simulation is already gone.
    pub fn shutdown(&self) -> bool {
        self.sender.send(Command::Shutdown).is_ok()
    }
}

/// Simulation end of the command queue.
pub struct CommandReceiver {
    receiver: Receiver<Command>,
}

impl CommandReceiver {
    /// Takes every pending command, in arrival order.
    ///
    /// Once all senders are gone a trailing [`Command::Shutdown`] is reported.
    pub fn drain(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("all command senders dropped");
                    commands.push(Command::Shutdown);
                    break;
                }
            }
        }
        commands
    }
}

/// Simulation end of the frame mailbox.
pub struct FrameSender {
    sender: Sender<Frame>,
    /// Same channel, used to throw away the stalest frame when full
    evict: Receiver<Frame>,
}

impl FrameSender {
    /// Publishes a frame, evicting older ones as needed.
    pub fn publish(&self, mut frame: Frame) {
        loop {
            match self.sender.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.evict.try_recv();
                    frame = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

/// Presentation end of the frame mailbox.
pub struct FrameReceiver {
    receiver: Receiver<Frame>,
}

impl FrameReceiver {
    /// Newest pending frame, discarding any older ones. `None` if nothing arrived.
    pub fn latest(&self) -> Option<Frame> {
        self.receiver.try_iter().last()
    }

    /// Next frame in order, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Frame> {
        match self.receiver.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of frames waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{rasterize, GridBuffer};

    fn frame(generation_commits: u64) -> Frame {
        let pattern = Pattern::builder().size(2, 2).build().unwrap();
        let mut grid = GridBuffer::new(&pattern);
        for _ in 0..generation_commits {
            grid.commit();
        }
        rasterize(&grid, 2)
    }

    #[test]
    fn test_commands_arrive_in_order() {
        let (tx, rx) = command_channel();
        assert!(tx.randomize());
        assert!(tx.toggle_pause());
        assert!(tx.reconfigure(Pattern::default()));

        let commands = rx.drain();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], Command::Randomize));
        assert!(matches!(commands[1], Command::TogglePause));
        assert!(matches!(commands[2], Command::Reconfigure(_)));
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_full_queue_drops_commands() {
        let (tx, rx) = command_channel();
        for _ in 0..COMMAND_CAPACITY {
            assert!(tx.toggle_pause());
        }
        assert!(!tx.randomize());
        assert_eq!(rx.drain().len(), COMMAND_CAPACITY);
    }

    #[test]
    fn test_dropped_senders_report_shutdown() {
        let (tx, rx) = command_channel();
        tx.randomize();
        drop(tx);

        let commands = rx.drain();
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], Command::Randomize));
        assert!(matches!(commands[1], Command::Shutdown));
    }

    #[test]
    fn test_shutdown_after_receiver_gone() {
        let (tx, rx) = command_channel();
        drop(rx);
        assert!(!tx.shutdown());
    }

    #[test]
    fn test_latest_frame_wins() {
        let (tx, rx) = frame_channel();
        for generation in 1..=10 {
            tx.publish(frame(generation));
        }

        assert!(rx.pending() <= FRAME_CAPACITY);
        let latest = rx.latest().unwrap();
        assert_eq!(latest.generation(), 10);
        assert!(rx.latest().is_none());
    }

    #[test]
    fn test_recv_timeout() {
        let (tx, rx) = frame_channel();
        assert!(rx.recv_timeout(Duration::from_millis(5)).is_none());
        tx.publish(frame(3));
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)).unwrap().generation(), 3);
    }
}
