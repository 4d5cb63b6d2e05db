use std::env;

use opencv::highgui::destroy_all_windows;
use opencv::highgui::imshow;
use opencv::highgui::named_window;
use opencv::highgui::wait_key;
use opencv::highgui::WINDOW_AUTOSIZE;
use opencv::prelude::Mat;

use crate::error::Result;

pub const WINDOW_TITLE: &str = "Live License Plate Detection";
const QUIT_KEY: i32 = 'q' as i32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayControl {
    Continue,
    Quit,
}

/// Where finished frames go. Polled once per frame for a quit request.
pub trait Display {
    fn show(&mut self, frame: &Mat) -> Result<DisplayControl>;

    fn close(&mut self) {}
}

pub struct WindowDisplay {
    title: String,
}

impl WindowDisplay {
    pub fn open() -> Result<Self> {
        named_window(WINDOW_TITLE, WINDOW_AUTOSIZE)?;
        Ok(Self {
            title: WINDOW_TITLE.to_string(),
        })
    }
}

impl Display for WindowDisplay {
    fn show(&mut self, frame: &Mat) -> Result<DisplayControl> {
        imshow(&self.title, frame)?;
        let key = wait_key(1)?;
        if key != -1 && (key & 0xFF) == QUIT_KEY {
            return Ok(DisplayControl::Quit);
        }
        Ok(DisplayControl::Continue)
    }

    fn close(&mut self) {
        let _ = destroy_all_windows();
    }
}

/// Runs without a window and never asks to quit.
#[derive(Default)]
pub struct HeadlessDisplay;

impl Display for HeadlessDisplay {
    fn show(&mut self, _frame: &Mat) -> Result<DisplayControl> {
        Ok(DisplayControl::Continue)
    }
}

/// Whether a display surface is around to host a window.
pub fn display_available() -> bool {
    if cfg!(target_os = "linux") {
        env::var_os("DISPLAY").is_some() || env::var_os("WAYLAND_DISPLAY").is_some()
    } else {
        true
    }
}

pub fn open_display(force_headless: bool) -> Box<dyn Display> {
    if force_headless || !display_available() {
        log::info!("Display not available, running in headless mode.");
        return Box::new(HeadlessDisplay);
    }
    match WindowDisplay::open() {
        Ok(window) => {
            log::info!("Showing frames in window '{WINDOW_TITLE}'");
            Box::new(window)
        }
        Err(e) => {
            log::debug!("Cannot open window: {e}");
            log::info!("Display not available, running in headless mode.");
            Box::new(HeadlessDisplay)
        }
    }
}
