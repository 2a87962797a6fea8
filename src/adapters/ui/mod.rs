pub mod banner;

/// Prints the startup banner. Call once after tracing init.
pub fn init_ui(bind_addr: &str) {
    banner::print_welcome(bind_addr);
}
