/// Latest drawable geometry reported by the host view, plus whether the core
/// has seen it yet.
///
/// Not synchronized on its own; it lives inside the coordinator lock so that
/// clearing `dirty` and pushing the size to the core form one critical
/// section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawableSize {
    width: u32,
    height: u32,
    dirty: bool,
}

impl DrawableSize {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resize. Returns `true` if the size differs from the stored
    /// one and a push to the core is now pending.
    ///
    /// Sizes reported between two pump iterations coalesce: only the last
    /// one is observed by [`consume`](Self::consume).
    pub fn set(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.dirty = true;
        true
    }

    /// Take the pending size, clearing the dirty flag.
    pub fn consume(&mut self) -> Option<(u32, u32)> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some((self.width, self.height))
    }

    /// Re-arm a size whose push to the core failed. Ignored if a newer size
    /// has been stored since.
    pub fn restore(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            self.dirty = true;
        }
    }

    #[inline]
    pub fn current(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
