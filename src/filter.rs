/*!
The color-shift filter.

Every pixel's red, green, and blue components get bumped by a fixed amount,
wrapping around at 256; alpha is left alone.
*/

use image::RgbaImage;
use lazy_static::lazy_static;
use serde_derive::Deserialize;

lazy_static!{
    static ref N_THREADS: usize = num_cpus::get_physical();
}

// Images with fewer pixels than this get done in one pass on the calling
// thread; spinning up a pile of threads isn't worth it.
const MIN_PIXELS_PER_THREAD: usize = 64 * 1024;

const BYTES_PER_PIXEL: usize = 4;

/**
The amount by which each of the red, green, and blue channels gets shifted
by one application of the filter.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Shift {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Shift {
    pub const fn new(red: u8, green: u8, blue: u8) -> Shift {
        Shift { red, green, blue }
    }

    /**
    Return the single shift equivalent to applying `self` and then `other`.
    */
    #[cfg(test)]
    pub fn then(self, other: Shift) -> Shift {
        Shift {
            red:   self.red.wrapping_add(other.red),
            green: self.green.wrapping_add(other.green),
            blue:  self.blue.wrapping_add(other.blue),
        }
    }

    /**
    Return the single shift equivalent to applying `self` `n` times in
    succession.
    */
    pub fn times(self, n: u64) -> Shift {
        // Only n mod 256 matters for an 8-bit channel.
        let n = (n % 256) as u8;
        Shift {
            red:   self.red.wrapping_mul(n),
            green: self.green.wrapping_mul(n),
            blue:  self.blue.wrapping_mul(n),
        }
    }

    /** Shift a single `[R, G, B, A]` pixel in place. */
    #[inline]
    pub fn shift_pixel(&self, px: &mut [u8]) {
        px[0] = px[0].wrapping_add(self.red);
        px[1] = px[1].wrapping_add(self.green);
        px[2] = px[2].wrapping_add(self.blue);
    }
}

impl Default for Shift {
    fn default() -> Shift { Shift::new(8, 5, 12) }
}

fn shift_band(band: &mut [u8], shift: Shift) {
    for px in band.chunks_exact_mut(BYTES_PER_PIXEL) {
        shift.shift_pixel(px);
    }
}

/**
Apply `shift` to every pixel of `img` exactly once.

Big images get cut into horizontal bands which are done in parallel, one
band per physical core.
*/
pub fn apply(img: &mut RgbaImage, shift: Shift) {
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);
    let n_pix = width * height;
    let data: &mut [u8] = img;

    let n_threads = (n_pix / MIN_PIXELS_PER_THREAD).clamp(1, *N_THREADS);
    if n_threads < 2 {
        shift_band(data, shift);
        return;
    }

    // Bands are whole rows so no pixel straddles two of them.
    let rows_per_band = height.div_ceil(n_threads);
    let band_len = rows_per_band * width * BYTES_PER_PIXEL;

    std::thread::scope(|s| {
        for band in data.chunks_mut(band_len) {
            s.spawn(move || shift_band(band, shift));
        }
    });
}
