// ABOUTME: Platform abstraction layer for the OS services the menu needs
// ABOUTME: Folder icon lookup for menu entries, check mark overlay, and the native folder picker dialog

use crate::menu::IconRequest;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tray_icon::menu::Icon;

#[cfg(target_os = "macos")]
pub mod macos;

/// Edge length of the icons shown next to menu entries.
pub const MENU_ICON_SIZE: u32 = 16;

/// Looks up the icon the OS shows for a folder, already scaled to
/// `MENU_ICON_SIZE`.
pub trait FolderIconProvider {
    fn folder_image(&self, path: &Path) -> Option<RgbaImage>;
}

/// Asks the user to choose a folder. `None` means the dialog was cancelled.
pub trait FolderPicker {
    fn pick_folder(&self) -> Option<PathBuf>;
}

/// Used where the OS offers no per-file icon lookup.
#[cfg(any(not(target_os = "macos"), test))]
pub struct NoIcons;

#[cfg(any(not(target_os = "macos"), test))]
impl FolderIconProvider for NoIcons {
    fn folder_image(&self, _path: &Path) -> Option<RgbaImage> {
        None
    }
}

/// Native open panel restricted to a single directory.
pub struct DialogFolderPicker {
    title: String,
}

impl DialogFolderPicker {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl FolderPicker for DialogFolderPicker {
    fn pick_folder(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title(self.title.as_str())
            .set_can_create_directories(true);
        if let Some(home) = dirs::home_dir() {
            dialog = dialog.set_directory(home);
        }
        dialog.pick_folder()
    }
}

/// Platform factory to get the appropriate implementations
pub struct Platform;

impl Platform {
    #[cfg(target_os = "macos")]
    pub fn icon_provider() -> Box<dyn FolderIconProvider> {
        Box::new(macos::MacOSIconProvider::new())
    }

    #[cfg(not(target_os = "macos"))]
    pub fn icon_provider() -> Box<dyn FolderIconProvider> {
        Box::new(NoIcons)
    }

    pub fn folder_picker() -> Box<dyn FolderPicker> {
        Box::new(DialogFolderPicker::new("Select a folder to receive screenshots"))
    }
}

/// Decodes any image format the `image` crate understands (the OS hands out
/// TIFF) and scales it down to menu icon size.
pub fn folder_image_from_bytes(bytes: &[u8]) -> Option<RgbaImage> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Failed to decode folder icon: {e}");
            return None;
        }
    };

    Some(
        decoded
            .resize_exact(
                MENU_ICON_SIZE,
                MENU_ICON_SIZE,
                image::imageops::FilterType::Lanczos3,
            )
            .to_rgba8(),
    )
}

/// Builds the icon for a menu entry. Without an OS image a checked entry
/// still gets its check mark on a transparent background.
pub fn entry_icon(icons: &dyn FolderIconProvider, request: &IconRequest) -> Option<Icon> {
    let mut image = match icons.folder_image(&request.path) {
        Some(image) => image,
        None if request.check_mark => RgbaImage::new(MENU_ICON_SIZE, MENU_ICON_SIZE),
        None => return None,
    };

    if request.check_mark {
        draw_check_mark(&mut image);
    }

    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height)
        .map_err(|e| tracing::debug!("Failed to build menu icon: {e}"))
        .ok()
}

const CHECK_STROKES: [((f32, f32), (f32, f32)); 2] =
    [((3.0, 9.0), (6.5, 12.5)), ((6.5, 12.5), (13.5, 3.5))];
const CHECK_COLOR: Rgba<u8> = Rgba([0, 122, 255, 255]);
const CHECK_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paints a check mark with a light outline so it reads on any folder artwork.
fn draw_check_mark(image: &mut RgbaImage) {
    let scale = image.width() as f32 / MENU_ICON_SIZE as f32;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let point = ((x as f32 + 0.5) / scale, (y as f32 + 0.5) / scale);
        let distance = CHECK_STROKES
            .iter()
            .map(|&(from, to)| distance_to_segment(point, from, to))
            .fold(f32::MAX, f32::min);

        if distance <= 1.1 {
            *pixel = CHECK_COLOR;
        } else if distance <= 2.1 {
            *pixel = CHECK_OUTLINE;
        }
    }
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
