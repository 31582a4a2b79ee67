use std::fmt;
use std::time::Duration;

use instant::Instant;


const TICK: Duration = Duration::from_secs(1);

pub fn secs_to_mmss(secs: u64) -> String {
    let mut ret = String::new();
    format_secs_to_mmss(secs, &mut ret).unwrap();
    ret
}

fn format_secs_to_mmss(secs: u64, f: &mut impl fmt::Write) -> fmt::Result {
    let minutes = secs / 60;
    let seconds = secs % 60;
    write!(f, "{minutes:02}:{seconds:02}")
}


#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CountdownOutcome {
    // Nothing to do: either still counting or not running at all.
    Idle,
    // The countdown has just reached zero. Reported exactly once; the countdown is stopped
    // afterwards.
    Expired,
}

// Discussion countdown with one-second granularity.
//
// There is exactly one countdown per round and starting it again simply re-arms the next tick,
// so two timers can never run concurrently. Time is supplied by the caller: the countdown
// advances only when `advance` is called with a later instant.
#[derive(Clone, Debug)]
pub struct Countdown {
    remaining_secs: u64,
    next_tick: Option<Instant>,
}

impl Countdown {
    pub fn new(budget: Duration) -> Self {
        Countdown {
            remaining_secs: budget.as_secs(),
            next_tick: None,
        }
    }

    pub fn remaining_secs(&self) -> u64 { self.remaining_secs }
    pub fn is_running(&self) -> bool { self.next_tick.is_some() }

    // Starts or resumes counting from the current remaining value.
    pub fn start(&mut self, now: Instant) { self.next_tick = Some(now + TICK); }

    // Cancels any pending tick. Remaining time is preserved.
    pub fn stop(&mut self) { self.next_tick = None; }

    pub fn advance(&mut self, now: Instant) -> CountdownOutcome {
        let Some(mut next_tick) = self.next_tick else {
            return CountdownOutcome::Idle;
        };
        while next_tick <= now {
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            next_tick += TICK;
            if self.remaining_secs == 0 {
                self.next_tick = None;
                return CountdownOutcome::Expired;
            }
        }
        self.next_tick = Some(next_tick);
        CountdownOutcome::Idle
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmss_formatting() {
        assert_eq!(secs_to_mmss(0), "00:00");
        assert_eq!(secs_to_mmss(59), "00:59");
        assert_eq!(secs_to_mmss(180), "03:00");
        assert_eq!(secs_to_mmss(3661), "61:01");
    }

    #[test]
    fn counts_down_whole_seconds() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(Duration::from_secs(3));
        countdown.start(t0);
        assert_eq!(countdown.advance(t0 + Duration::from_millis(999)), CountdownOutcome::Idle);
        assert_eq!(countdown.remaining_secs(), 3);
        assert_eq!(countdown.advance(t0 + Duration::from_millis(2500)), CountdownOutcome::Idle);
        assert_eq!(countdown.remaining_secs(), 1);
        assert_eq!(countdown.advance(t0 + Duration::from_secs(3)), CountdownOutcome::Expired);
        assert!(!countdown.is_running());
        assert_eq!(countdown.advance(t0 + Duration::from_secs(10)), CountdownOutcome::Idle);
    }

    #[test]
    fn stopped_countdown_keeps_remaining_time() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(Duration::from_secs(10));
        countdown.start(t0);
        let _ = countdown.advance(t0 + Duration::from_secs(4));
        countdown.stop();
        assert_eq!(countdown.advance(t0 + Duration::from_secs(100)), CountdownOutcome::Idle);
        assert_eq!(countdown.remaining_secs(), 6);

        let t1 = t0 + Duration::from_secs(200);
        countdown.start(t1);
        let _ = countdown.advance(t1 + Duration::from_secs(2));
        assert_eq!(countdown.remaining_secs(), 4);
    }

    #[test]
    fn resuming_at_zero_expires_on_next_tick() {
        let t0 = Instant::now();
        let mut countdown = Countdown::new(Duration::ZERO);
        countdown.start(t0);
        assert_eq!(countdown.advance(t0), CountdownOutcome::Idle);
        assert_eq!(countdown.advance(t0 + Duration::from_secs(1)), CountdownOutcome::Expired);
    }
}
