//! Terminal logging with colored module prefixes and progress bars.
//!
//! - `log!` prints `[module] message`, clipped to the terminal width
//! - `ProgressBars` draws one in-place bar per pipeline stage
//!
//! ```ignore
//! log!("search"; "indexed {} pages", count);
//!
//! let progress = ProgressBars::new(&[("pages", pages.len())]);
//! progress.inc(0);
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Terminal width, queried once.
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

// ============================================================================
// Layout
// ============================================================================
//
// "[pages] [████░░░░] 42/100"
//  ^-----^ ^-------^ ^----^
//  prefix  bar       count

/// "[" and "]" around the module name
const BRACKET_LEN: usize = 2;
/// Space following the prefix
const SPACE_AFTER_PREFIX: usize = 1;
/// " []" around the bar itself
const BAR_WRAPPER_LEN: usize = 3;
/// Space before the counter
const SPACE_BEFORE_COUNT: usize = 1;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;
/// Width used when the terminal cannot be queried (pipes, CI)
const FALLBACK_WIDTH: u16 = 120;

#[inline]
const fn prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

fn terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("build"; "wrote {} files", n);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Progress Bars
// ============================================================================

/// Several progress bars, one terminal line each, updated in place.
///
/// Bars are addressed by creation order. Updates from rayon workers are
/// serialized through an internal mutex.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    row: usize,
}

impl ProgressBars {
    /// Reserve one line per `(name, total)` pair and start every bar at zero.
    pub fn new(stages: &[(&'static str, usize)]) -> Self {
        let mut out = stdout().lock();
        for _ in stages {
            writeln!(out).ok();
        }
        out.flush().ok();

        let bars = stages
            .iter()
            .enumerate()
            .map(|(row, &(name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name, &name.to_ascii_lowercase()),
                prefix_len: prefix_len(name.len()),
                total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
        }
    }

    /// Advance the bar at `index` by one.
    #[inline]
    pub fn inc(&self, index: usize) {
        if let Some(bar) = self.bars.get(index) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.draw(bar, current);
        }
    }

    /// Advance the bar registered under `name` by one.
    pub fn inc_by_name(&self, name: &str) {
        if let Some(index) = self.bars.iter().position(|bar| bar.name == name) {
            self.inc(index);
        }
    }

    fn draw(&self, bar: &ProgressBar, current: usize) {
        let _guard = self.lock.lock().ok();

        let counter = format!("{}/{}", current, bar.total);
        let bar_width = bar_width(terminal_width() as usize, bar.prefix_len, counter.len());
        let filled = filled_cells(current, bar.total, bar_width);
        let cells = "█".repeat(filled) + &"░".repeat(bar_width - filled);

        let mut out = stdout().lock();
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(out, cursor::MoveUp(lines_up)).ok();
        execute!(out, Clear(ClearType::CurrentLine)).ok();
        write!(out, "{} [{}] {}", bar.prefix, cells, counter).ok();
        execute!(out, cursor::MoveDown(lines_up)).ok();
        write!(out, "\r").ok();
        out.flush().ok();
    }

    /// Erase every bar and put the cursor back where the bars started.
    pub fn finish(&self) {
        let _guard = self.lock.lock().ok();
        let rows = self.bars.len() as u16;

        let mut out = stdout().lock();
        execute!(out, cursor::MoveUp(rows)).ok();
        for _ in &self.bars {
            execute!(out, Clear(ClearType::CurrentLine)).ok();
            execute!(out, cursor::MoveDown(1)).ok();
        }
        execute!(out, cursor::MoveUp(rows)).ok();
        out.flush().ok();
    }
}

/// Width of the bar body once prefix and counter are accounted for.
fn bar_width(terminal: usize, prefix_len: usize, counter_len: usize) -> usize {
    let overhead = prefix_len + BAR_WRAPPER_LEN + SPACE_BEFORE_COUNT + counter_len;
    terminal
        .saturating_sub(overhead)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}

fn filled_cells(current: usize, total: usize, width: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (current.min(total) * width) / total
}

// ============================================================================
// Output
// ============================================================================

/// Print `[module] message`, clipped to the terminal width.
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let max_len = (terminal_width() as usize).saturating_sub(prefix_len(module.len()));

    // Multi-line messages (excerpts, listings) are printed unclipped
    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, max_len)
    };

    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "search" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
