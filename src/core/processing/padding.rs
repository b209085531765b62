use ndarray::{Array3, ArrayView3, s};
use tracing::debug;

/// Map a possibly out-of-range coordinate back into `0..len` by mirroring
/// around the edge pixel without repeating it (`dcb|abcd|cba`). Coordinates
/// further out keep folding, so any `i` is valid; a single-pixel axis maps to 0.
#[inline]
pub fn reflect_101_index(i: isize, len: usize) -> usize {
    let last = len as isize - 1;
    if last <= 0 {
        return 0;
    }
    // Reflect-101 repeats with period 2 * last.
    let folded = i.rem_euclid(2 * last);
    let mirrored = if folded > last { 2 * last - folded } else { folded };
    mirrored as usize
}

/// Extend an HWC tile by `pad` pixels on all four sides using reflect-101.
/// `pad` may exceed the tile sides; the border then keeps reflecting.
/// `pad == 0` or an empty tile returns a copy.
pub fn pad_reflect_101(tile: &ArrayView3<f32>, pad: usize) -> Array3<f32> {
    let (rows, cols, channels) = tile.dim();
    if pad == 0 || rows == 0 || cols == 0 {
        return tile.to_owned();
    }

    let out_rows = rows + 2 * pad;
    let out_cols = cols + 2 * pad;
    debug!(
        "Reflect-padding tile {}x{} by {} -> {}x{}",
        rows, cols, pad, out_rows, out_cols
    );

    let mut padded = Array3::<f32>::zeros((out_rows, out_cols, channels));
    // Interior first as one block copy, then the border pixels.
    padded
        .slice_mut(s![pad..pad + rows, pad..pad + cols, ..])
        .assign(tile);
    for r in 0..out_rows {
        let src_r = reflect_101_index(r as isize - pad as isize, rows);
        let interior_row = r >= pad && r < pad + rows;
        for c in 0..out_cols {
            if interior_row && c >= pad && c < pad + cols {
                continue;
            }
            let src_c = reflect_101_index(c as isize - pad as isize, cols);
            padded
                .slice_mut(s![r, c, ..])
                .assign(&tile.slice(s![src_r, src_c, ..]));
        }
    }
    padded
}
