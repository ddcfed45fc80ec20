// Stable-Rust stand-ins for branch prediction hints. A call to a `#[cold]` function
// on one side of a branch steers the optimizer to lay out the other side as the hot path.

#[cold]
#[inline(always)]
pub fn cold() {}

#[inline(always)]
pub fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}
