/*!
A pane that displays one image buffer, scaled to fill it.
*/

use fltk::{
    prelude::*,
    enums::{Color, ColorDepth, Font, FrameType},
    frame::Frame,
    image::RgbImage,
};
use image::{imageops::FilterType, RgbaImage};
use tracing::warn;

// Room left around the image so the pane's border stays visible.
const BORDER_INSET: i32 = 3;
const PLACEHOLDER_FONT_SIZE: i32 = 18;

/**
Return `img` resampled to exactly `width` by `height` pixels with a smooth
(bilinear) filter.
*/
pub fn scale_to_fit(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/**
The `ImgPane` shows a placeholder label until it is given an image, and
the most recently supplied image after that.
*/
pub struct ImgPane {
    frame: Frame,
}

impl ImgPane {
    /**
    Instantiate a new `ImgPane` in whatever group is currently open,
    showing `placeholder` until an image arrives.
    */
    pub fn new(placeholder: &str) -> ImgPane {
        let mut frame = Frame::default().with_label(placeholder);
        frame.set_frame(FrameType::RoundedFrame);
        frame.set_color(Color::Light2);
        frame.set_label_font(Font::Helvetica);
        frame.set_label_size(PLACEHOLDER_FONT_SIZE);
        frame.set_label_color(Color::Dark3);

        ImgPane { frame }
    }

    /**
    Scale `img` to the current size of the pane and display it.
    */
    pub fn set_image(&mut self, img: &RgbaImage) {
        let w = self.frame.w() - 2 * BORDER_INSET;
        let h = self.frame.h() - 2 * BORDER_INSET;
        if w < 1 || h < 1 || img.width() == 0 || img.height() == 0 {
            return;
        }

        let scaled = scale_to_fit(img, w as u32, h as u32);
        let frame_img = match RgbImage::new(scaled.as_raw(), w, h, ColorDepth::Rgba8) {
            Ok(fi) => fi,
            Err(e) => {
                warn!("unable to make {}x{} display image: {}", w, h, &e);
                return;
            },
        };

        self.frame.set_label("");
        self.frame.set_image(Some(frame_img));
        self.frame.redraw();
    }
}
