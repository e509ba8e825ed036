//! Look-ahead step scheduling.
//!
//! The host polls at whatever rate it manages (roughly once per UI frame, with
//! jitter). Each poll schedules every step whose start falls inside the next
//! `LOOKAHEAD_SECS` of the audio clock, stamped with its exact audio-clock
//! time, so the voices land on the grid no matter when the poll happened.

use crate::shared::{DEFAULT_TEMPO, LOOKAHEAD_SECS, NUM_STEPS, clamp_tempo};

#[derive(Clone, Debug, PartialEq)]
pub struct Transport {
    pub tempo: f64,
    pub current_step: u8,    // the next step to schedule
    pub next_step_time: f64, // audio-clock time of `current_step`
    pub running: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            current_step: 0,
            next_step_time: 0.0,
            running: false,
        }
    }
}

/// A step that became due during one poll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DueStep {
    pub step: u8,
    pub time: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Sequencer {
    transport: Transport,
    last_scheduled: Option<u8>,
}

pub fn seconds_per_step(tempo: f64) -> f64 {
    60.0 / tempo / 4.0
}

impl Sequencer {
    pub fn new(tempo: f64) -> Self {
        Self {
            transport: Transport {
                tempo: clamp_tempo(tempo),
                ..Transport::default()
            },
            last_scheduled: None,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_running(&self) -> bool {
        self.transport.running
    }

    pub fn tempo(&self) -> f64 {
        self.transport.tempo
    }

    pub fn seconds_per_step(&self) -> f64 {
        seconds_per_step(self.transport.tempo)
    }

    /// The step most recently handed out, for display. `None` while stopped.
    pub fn playing_step(&self) -> Option<u8> {
        self.last_scheduled
    }

    /// Takes effect from the next step onward; steps already scheduled keep
    /// their times. Returns the tempo actually applied.
    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        self.transport.tempo = clamp_tempo(bpm);
        self.transport.tempo
    }

    pub fn start(&mut self, now: f64) {
        if self.transport.running {
            return;
        }
        self.transport.running = true;
        self.transport.next_step_time = now;
        tracing::info!(tempo = self.transport.tempo, at = now, "transport started");
    }

    /// Stops future scheduling and rewinds to step 0. Voices already handed
    /// to the audio thread are not recalled.
    pub fn stop(&mut self) {
        if !self.transport.running {
            return;
        }
        self.transport.running = false;
        self.transport.current_step = 0;
        self.last_scheduled = None;
        tracing::info!("transport stopped");
    }

    /// Every step starting before `now + LOOKAHEAD_SECS`, in order.
    pub fn poll(&mut self, now: f64) -> Vec<DueStep> {
        let mut due = Vec::new();
        if !self.transport.running {
            return due;
        }
        while self.transport.next_step_time < now + LOOKAHEAD_SECS {
            let step = self.transport.current_step;
            due.push(DueStep {
                step,
                time: self.transport.next_step_time,
            });
            self.last_scheduled = Some(step);
            self.transport.next_step_time += self.seconds_per_step();
            self.transport.current_step = ((step as usize + 1) % NUM_STEPS) as u8;
        }
        if !due.is_empty() {
            tracing::debug!(count = due.len(), next = self.transport.next_step_time, "steps scheduled");
        }
        due
    }
}
