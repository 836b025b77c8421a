//! Terminal rendering of the controller's UI surface

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use roomcall_core::ui::mute_label;
use roomcall_core::{DebugLog, StatusBoard, UiSurface};

const DEBUG_LINES: usize = 200;

/// Prints banners as they arrive and keeps them for `status`
pub struct ConsoleUi {
    board: Mutex<StatusBoard>,
    debug_log: Mutex<DebugLog>,
    view: Mutex<Option<(String, String)>>,
    mute_label: Mutex<&'static str>,
    echo_debug: bool,
}

impl ConsoleUi {
    pub fn new(status_ttl: Duration, echo_debug: bool) -> Self {
        Self {
            board: Mutex::new(StatusBoard::new(status_ttl)),
            debug_log: Mutex::new(DebugLog::new(DEBUG_LINES)),
            view: Mutex::new(None),
            mute_label: Mutex::new(mute_label(false)),
            echo_debug,
        }
    }

    /// Print the current view and any banners that have not expired
    pub fn print_status(&self) {
        match &*self.view.lock() {
            Some((room, name)) => println!("Room: {}  User: {}  [{}]", room, name, self.mute_label.lock()),
            None => println!("Not in a room"),
        }

        let now = Instant::now();
        let mut board = self.board.lock();
        board.prune(now);
        for banner in board.visible(now) {
            println!("  ({}) {}", banner.class(), banner.text);
        }
    }

    pub fn print_debug(&self) {
        for line in self.debug_log.lock().lines() {
            println!("{}", line);
        }
    }
}

impl UiSurface for ConsoleUi {
    fn report_status(&self, message: &str, is_error: bool) {
        if is_error {
            eprintln!("! {}", message);
        } else {
            println!("* {}", message);
        }
        self.board.lock().push(message, is_error, Instant::now());
    }

    fn set_connected_view(&self, room: &str, display_name: &str) {
        *self.view.lock() = Some((room.to_string(), display_name.to_string()));
    }

    fn set_disconnected_view(&self) {
        *self.view.lock() = None;
    }

    fn set_mute_label(&self, muted: bool) {
        *self.mute_label.lock() = mute_label(muted);
    }

    fn debug(&self, message: &str) {
        let mut log = self.debug_log.lock();
        log.push(message);
        if self.echo_debug {
            if let Some(line) = log.lines().last() {
                println!("{}", line);
            }
        }
    }
}
