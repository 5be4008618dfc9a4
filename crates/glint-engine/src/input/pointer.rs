/// Maps a pointer position in pixels to shader space.
///
/// `x` runs left to right and `y` bottom to top, both in `[0, 1]`:
/// `(x / width, 1 - y / height)`. Positions outside the surface clamp to its
/// edge. A zero-sized surface maps everything to the origin.
pub fn normalize_pointer(position: (f32, f32), size: (u32, u32)) -> [f32; 2] {
    if size.0 == 0 || size.1 == 0 {
        return [0.0, 0.0];
    }
    let x = position.0 / size.0 as f32;
    let y = 1.0 - position.1 / size.1 as f32;
    [x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]
}
