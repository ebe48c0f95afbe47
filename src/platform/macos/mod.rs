// ABOUTME: macOS folder icon lookup through NSWorkspace
// ABOUTME: Converts the workspace icon's TIFF representation into a small RGBA image for menu entries

use crate::platform::{FolderIconProvider, folder_image_from_bytes};
use objc2_app_kit::NSWorkspace;
use objc2_foundation::NSString;
use image::RgbaImage;
use std::path::Path;

pub struct MacOSIconProvider;

impl MacOSIconProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FolderIconProvider for MacOSIconProvider {
    fn folder_image(&self, path: &Path) -> Option<RgbaImage> {
        let tiff = unsafe {
            let workspace = NSWorkspace::sharedWorkspace();
            let image = workspace.iconForFile(&NSString::from_str(&path.to_string_lossy()));
            image.TIFFRepresentation()
        };

        match tiff {
            Some(data) => folder_image_from_bytes(&data.to_vec()),
            None => {
                tracing::debug!("No icon representation for {}", path.display());
                None
            }
        }
    }
}
