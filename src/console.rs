//! Console presentation layer: renders kitchen events and measures how long it
//! was kept from drawing a frame.

use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::events::KitchenEvent;

/// Target interval between presentation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Records presentation frames and the longest gap between two of them.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
    max_stall: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            max_stall: Duration::ZERO,
            frames: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.max_stall = self.max_stall.max(now - self.last);
        self.last = now;
        self.frames += 1;
    }

    /// Longest time the presentation context went without a frame.
    pub fn max_stall(&self) -> Duration {
        self.max_stall
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Line-oriented renderer standing in for the kitchen window.
pub struct Console<W: Write> {
    out: W,
    show_progress: bool,
    clock: FrameClock,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_progress: false,
            clock: FrameClock::new(),
        }
    }

    /// Also render progress at every quarter.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &KitchenEvent) -> io::Result<()> {
        match event {
            KitchenEvent::Started { slot, order } => {
                writeln!(self.out, "cook {} started: {order}", slot + 1)
            }
            KitchenEvent::Progress {
                slot,
                order,
                percent,
            } => {
                if self.show_progress && percent % 25 == 0 {
                    writeln!(self.out, "cook {} at {percent:>3}%: {order}", slot + 1)
                } else {
                    Ok(())
                }
            }
            KitchenEvent::Completed {
                slot,
                order,
                elapsed,
            } => writeln!(
                self.out,
                "cook {} finished: {order} ({:.1}s)",
                slot + 1,
                elapsed.as_secs_f64()
            ),
            KitchenEvent::Failed {
                slot,
                order,
                reason,
            } => writeln!(self.out, "cook {} failed: {order} ({reason})", slot + 1),
            KitchenEvent::SessionFinished {
                mode,
                elapsed,
                processed,
            } => {
                let secs = elapsed.as_secs_f64();
                let throughput = if secs > 0.0 {
                    *processed as f64 / secs
                } else {
                    0.0
                };
                writeln!(self.out, "{} finished!", mode.as_str().to_uppercase())?;
                writeln!(self.out, "{processed} orders in {secs:.1}s")?;
                writeln!(self.out, "throughput: {throughput:.1} orders/s")
            }
        }
    }

    /// Render everything waiting on `rx`, then count a frame.
    ///
    /// Returns `true` once the session-finished event has been rendered.
    pub fn frame(&mut self, rx: &Receiver<KitchenEvent>) -> io::Result<bool> {
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            finished |= matches!(event, KitchenEvent::SessionFinished { .. });
            self.render(&event)?;
        }
        self.clock.tick();
        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionMode, Order};
    use std::sync::mpsc;
    use std::thread;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).expect("console wrote invalid utf-8")
    }

    #[test]
    fn renders_lifecycle_lines() {
        let mut console = Console::new(Vec::new());
        let order = Order::new(3, "Table 03: Ramen");
        console
            .render(&KitchenEvent::Started {
                slot: 1,
                order: order.clone(),
            })
            .expect("render");
        console
            .render(&KitchenEvent::Progress {
                slot: 1,
                order: order.clone(),
                percent: 50,
            })
            .expect("render");
        console
            .render(&KitchenEvent::Completed {
                slot: 1,
                order,
                elapsed: Duration::from_millis(2500),
            })
            .expect("render");
        let text = output(console);
        assert!(text.contains("cook 2 started: Table 03: Ramen"));
        assert!(text.contains("cook 2 finished: Table 03: Ramen (2.5s)"));
        // Progress is hidden unless requested.
        assert!(!text.contains("50%"));
    }

    #[test]
    fn frame_reports_session_finish() {
        let (tx, rx) = mpsc::channel();
        let mut console = Console::new(Vec::new());
        assert!(!console.frame(&rx).expect("frame"));
        tx.send(KitchenEvent::SessionFinished {
            mode: ExecutionMode::Concurrent,
            elapsed: Duration::from_secs(2),
            processed: 4,
        })
        .expect("send");
        assert!(console.frame(&rx).expect("frame"));
        assert_eq!(console.clock().frames(), 2);
        let text = output(console);
        assert!(text.contains("CONCURRENT finished!"));
        assert!(text.contains("throughput: 2.0 orders/s"));
    }

    #[test]
    fn frame_clock_tracks_longest_gap() {
        let mut clock = FrameClock::new();
        clock.tick();
        thread::sleep(Duration::from_millis(30));
        clock.tick();
        clock.tick();
        assert!(clock.max_stall() >= Duration::from_millis(30));
        assert_eq!(clock.frames(), 3);
    }
}
