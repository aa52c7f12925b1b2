//! Splash-screen preloader fade.

use crate::constants::{PRELOADER_HIDE_CLASS, PRELOADER_ID};
use crate::host::DomSurface;

/// Add the hide class to `#preloader`. Returns `false` when the page has no preloader.
pub fn hide_preloader<D: DomSurface + ?Sized>(dom: &D) -> bool {
    dom.set_class(&format!("#{PRELOADER_ID}"), PRELOADER_HIDE_CLASS, true)
}
