/// Navigation epoch counter.
///
/// Every navigation handled by the mounter advances the generation. Work that
/// was started under an older generation is stale and must be dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub const INITIAL: Generation = Generation(0);

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Animation frame counter driven by the embedding loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

impl FrameId {
    pub fn next(self) -> Self {
        FrameId(self.0.wrapping_add(1))
    }
}
