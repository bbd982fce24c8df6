// display.rs - Hand-off of finished generations to the display-owning context
//
// The run loop sends each frame with a one-shot acknowledgement and waits
// for it, so frames are shown strictly in order and one at a time.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::grid::Grid;

/// One complete generation, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub generation: u64,
    pub grid: Grid,
}

impl Frame {
    pub fn of(grid: &Grid) -> Self {
        Self { generation: grid.generation(), grid: grid.clone() }
    }
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display queue has been closed")]
    Closed,
    #[error("display dropped generation {generation} without acknowledging it")]
    Dropped { generation: u64 },
    #[error("display did not acknowledge generation {generation} within {timeout:?}")]
    Timeout { generation: u64, timeout: Duration },
    #[error("display rejected generation {generation}")]
    Rejected {
        generation: u64,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

/// Something that renders frames on the display context.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> anyhow::Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame) -> anyhow::Result<()>,
{
    fn present(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self(frame)
    }
}

struct Delivery {
    frame: Frame,
    ack: oneshot::Sender<anyhow::Result<()>>,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sending half, held by the simulation.
#[derive(Clone)]
pub struct DisplayHandle {
    tx: mpsc::Sender<Delivery>,
    waker: Option<Waker>,
}

/// Receiving half, held by whatever owns the display.
pub struct DisplayQueue {
    rx: mpsc::Receiver<Delivery>,
}

pub fn channel(capacity: usize) -> (DisplayHandle, DisplayQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (DisplayHandle { tx, waker: None }, DisplayQueue { rx })
}

impl DisplayHandle {
    /// Calls `waker` every time a frame is queued, e.g. to request a repaint.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Queues `frame` and waits until the display has rendered it.
    pub async fn present(&self, frame: Frame, timeout: Duration) -> Result<(), DisplayError> {
        let generation = frame.generation;
        let (ack, done) = oneshot::channel();

        let delivery = async {
            self.tx
                .send(Delivery { frame, ack })
                .await
                .map_err(|_| DisplayError::Closed)?;
            if let Some(waker) = &self.waker {
                waker();
            }
            match done.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(DisplayError::Rejected { generation, source: err.into() }),
                Err(_) => Err(DisplayError::Dropped { generation }),
            }
        };

        tokio::time::timeout(timeout, delivery)
            .await
            .map_err(|_| DisplayError::Timeout { generation, timeout })?
    }
}

/// A received frame whose acknowledgement is still owed.
/// Dropping it unacknowledged fails the hand-off.
pub struct FramePermit {
    frame: Frame,
    ack: oneshot::Sender<anyhow::Result<()>>,
}

impl FramePermit {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn complete(self, result: anyhow::Result<()>) {
        // The sender may have timed out and gone away; nothing left to tell it.
        let _ = self.ack.send(result);
    }
}

impl DisplayQueue {
    /// Waits for the next frame. `None` once every handle is gone.
    pub async fn next_frame(&mut self) -> Option<FramePermit> {
        self.rx.recv().await.map(|Delivery { frame, ack }| FramePermit { frame, ack })
    }

    /// Renders every frame already queued without waiting. For immediate-mode UIs
    /// that poll once per repaint. Returns how many frames were handled.
    pub fn drain(&mut self, mut sink: impl FrameSink) -> usize {
        let mut handled = 0;
        while let Ok(Delivery { frame, ack }) = self.rx.try_recv() {
            let _ = ack.send(sink.present(&frame));
            handled += 1;
        }
        handled
    }

    /// Drives `sink` until the channel closes, then hands it back.
    pub async fn run<S: FrameSink>(mut self, mut sink: S) -> S {
        while let Some(permit) = self.next_frame().await {
            let result = sink.present(permit.frame());
            permit.complete(result);
        }
        sink
    }

    /// Runs `sink` on its own task, which then acts as the display context.
    pub fn spawn<S>(self, sink: S) -> JoinHandle<S>
    where
        S: FrameSink + Send + 'static,
    {
        tokio::spawn(self.run(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame(generation: u64) -> Frame {
        let mut grid = Grid::new(3).unwrap();
        for _ in 0..generation {
            grid.step();
        }
        Frame::of(&grid)
    }

    #[tokio::test]
    async fn present_waits_for_acknowledgement() {
        let (handle, queue) = channel(1);
        let sink = queue.spawn(Recorder::default());

        handle.present(frame(1), Duration::from_secs(1)).await.unwrap();
        handle.present(frame(2), Duration::from_secs(1)).await.unwrap();
        drop(handle);

        assert_eq!(sink.await.unwrap().0, vec![1, 2]);
    }

    #[tokio::test]
    async fn rejected_frame_carries_sink_error() {
        let (handle, queue) = channel(1);
        queue.spawn(|_: &Frame| -> anyhow::Result<()> { anyhow::bail!("surface lost") });

        let err = handle.present(frame(4), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DisplayError::Rejected { generation: 4, .. }));
        assert_eq!(err.source().unwrap().to_string(), "surface lost");
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_display_times_out() {
        let (handle, _queue) = channel(1);
        let err = handle.present(frame(0), Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, DisplayError::Timeout { generation: 0, .. }));
    }

    #[tokio::test]
    async fn closed_queue_is_reported() {
        let (handle, queue) = channel(1);
        drop(queue);
        let err = handle.present(frame(0), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DisplayError::Closed));
    }

    #[tokio::test]
    async fn dropped_permit_is_reported() {
        let (handle, mut queue) = channel(1);
        tokio::spawn(async move {
            let permit = queue.next_frame().await;
            drop(permit);
        });
        let err = handle.present(frame(2), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DisplayError::Dropped { generation: 2 }));
    }

    #[tokio::test]
    async fn drain_handles_queued_frames_and_wakes() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (handle, mut queue) = channel(1);
        let handle = handle.with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let pending =
            tokio::spawn(async move { handle.present(frame(1), Duration::from_secs(1)).await });
        while wakes.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let mut seen = Vec::new();
        let handled = queue.drain(|frame: &Frame| -> anyhow::Result<()> {
            seen.push(frame.generation);
            Ok(())
        });
        assert_eq!(handled, 1);
        assert_eq!(seen, vec![1]);
        pending.await.unwrap().unwrap();
    }

    #[derive(Default)]
    struct Recorder(Vec<u64>);

    impl FrameSink for Recorder {
        fn present(&mut self, frame: &Frame) -> anyhow::Result<()> {
            self.0.push(frame.generation);
            Ok(())
        }
    }
}
