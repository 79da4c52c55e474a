#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Which stage of an archive export is running.
pub enum ProgressPhase {
    /// Rendering and encoding items.
    Rendering,
    /// Writing entries into the compressed container.
    Compressing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Fractional progress of one phase, in `0.0..=100.0`.
pub struct Progress {
    pub phase: ProgressPhase,
    pub percent: f32,
}

impl Progress {
    pub fn new(phase: ProgressPhase, done: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            (done.min(total) as f32 / total as f32) * 100.0
        };
        Self { phase, percent }
    }

    /// Percent rounded to a whole number, for progress bars.
    pub fn rounded(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }
}
