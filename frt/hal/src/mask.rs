//! Interrupt mask critical sections

use frt_core::IrqLevel;

/// CPU interrupt mask level control
pub trait InterruptMask: Sync {
    /// Raise the mask to at least `level` and return the previous level.
    ///
    /// The mask is never lowered by this call.
    fn mask(&self, level: IrqLevel) -> IrqLevel;

    /// Put back a level previously returned by [`InterruptMask::mask`]
    fn restore(&self, previous: IrqLevel);
}

/// RAII guard for a masked region
///
/// Restores the saved mask level when dropped, so every exit path of the
/// guarded scope, early returns included, unmasks again.
pub struct MaskGuard<'a, M: InterruptMask + ?Sized> {
    mask: &'a M,
    previous: IrqLevel,
}

impl<'a, M: InterruptMask + ?Sized> MaskGuard<'a, M> {
    /// Mask interrupts up to `level`
    pub fn new(mask: &'a M, level: IrqLevel) -> Self {
        let previous = mask.mask(level);
        Self { mask, previous }
    }

    /// Level that will be restored on drop
    pub fn previous(&self) -> IrqLevel {
        self.previous
    }
}

impl<M: InterruptMask + ?Sized> Drop for MaskGuard<'_, M> {
    fn drop(&mut self) {
        self.mask.restore(self.previous);
    }
}

/// Run `f` with interrupts masked up to `level`
#[inline]
pub fn with_masked<M, R, F>(mask: &M, level: IrqLevel, f: F) -> R
where
    M: InterruptMask + ?Sized,
    F: FnOnce() -> R,
{
    let _guard = MaskGuard::new(mask, level);
    f()
}
