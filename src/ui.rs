use colored::Colorize;
use parking_lot::Mutex;

// RGB tuples for `colored`'s `.truecolor()`
pub mod rgb {
    pub const MONEY_GREEN: (u8, u8, u8) = (80, 250, 123);
    pub const NEON_CYAN: (u8, u8, u8) = (128, 255, 234);
    pub const CORAL: (u8, u8, u8) = (255, 106, 193);
    pub const DIM_WHITE: (u8, u8, u8) = (180, 180, 190);
}

static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

/// Enable or disable quiet mode
pub fn set_quiet_mode(enabled: bool) {
    *QUIET_MODE.lock() = enabled;
}

pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.cyan().bold());
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.yellow().bold());
    }
}

pub fn print_error(message: &str) {
    // Always print errors, even in quiet mode
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.green().bold());
    }
}

/// Print a `label: value` line
pub fn print_field(label: &str, value: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::DIM_WHITE;
        let (vr, vg, vb) = rgb::NEON_CYAN;
        println!("  {} {}", format!("{label}:").truecolor(r, g, b), value.truecolor(vr, vg, vb));
    }
}

pub fn print_version(version: &str) {
    let (r, g, b) = rgb::MONEY_GREEN;
    let (cr, cg, cb) = rgb::CORAL;
    println!(
        "{} {}",
        "💸 Hagglz".truecolor(r, g, b).bold(),
        format!("v{version}").truecolor(cr, cg, cb)
    );
}
