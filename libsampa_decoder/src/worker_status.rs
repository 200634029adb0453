/// Progress report sent by the decode worker to whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    /// Fraction of the input consumed, in [0, 1].
    pub progress: f32,
    pub nevents: u64,
    pub npackets: u64,
}

impl WorkerStatus {
    pub fn new(progress: f32, nevents: u64, npackets: u64) -> Self {
        Self {
            progress,
            nevents,
            npackets,
        }
    }
}
