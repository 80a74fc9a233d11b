//! Texture loading without a GPU.
//!
//! The command-line front end has nothing to draw on, so a "texture" is the
//! decoded image's size. Decoding still runs, which catches corrupt banners
//! the same way a renderer would.

use std::path::Path;

use multilauncher_library::{ArtworkError, BannerHandle, TextureLoader};

/// Dimensions of a decoded banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default)]
pub struct HeadlessLoader {
    loaded: usize,
}

impl HeadlessLoader {
    pub fn loaded(&self) -> usize {
        self.loaded
    }
}

impl TextureLoader for HeadlessLoader {
    fn load(&mut self, path: &Path) -> Result<BannerHandle, ArtworkError> {
        let img = image::open(path)
            .map_err(|e| ArtworkError::Decode(format!("{}: {e}", path.display())))?;
        self.loaded += 1;
        Ok(Box::new(BannerSize {
            width: img.width(),
            height: img.height(),
        }))
    }
}

/// Size stored in a handle produced by [`HeadlessLoader`].
pub fn banner_size(handle: &BannerHandle) -> Option<BannerSize> {
    (**handle).downcast_ref::<BannerSize>().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_size() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("banner.png");
        image::RgbaImage::new(46, 21).save(&path).unwrap();

        let mut loader = HeadlessLoader::default();
        let handle = loader.load(&path).unwrap();
        assert_eq!(
            banner_size(&handle),
            Some(BannerSize {
                width: 46,
                height: 21
            })
        );
        assert_eq!(loader.loaded(), 1);
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let mut loader = HeadlessLoader::default();
        assert!(matches!(loader.load(&path), Err(ArtworkError::Decode(_))));
        assert_eq!(loader.loaded(), 0);
    }

    #[test]
    fn foreign_handle_has_no_size() {
        let handle: BannerHandle = Box::new(7u8);
        assert_eq!(banner_size(&handle), None);
    }
}
