/*!
Reading image files into buffers.
*/

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Error loading image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/**
Decode the image at `path` and return two independent copies of it, one
for each pane.
*/
pub fn load_pair<P: AsRef<Path>>(path: P)
-> Result<(RgbaImage, RgbaImage), LoadError> {
    let path = path.as_ref();
    let img = match image::open(path) {
        Ok(img) => img.into_rgba8(),
        Err(e) => {
            return Err(LoadError::Decode {
                path: path.to_path_buf(),
                source: e,
            });
        },
    };
    let (w, h) = img.dimensions();
    info!(path = %path.display(), width = w, height = h, "image loaded");

    Ok((img.clone(), img))
}
