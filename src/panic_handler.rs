use std::io::{self, Write};
use std::panic;

pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Flush pending JSON output before the report lands on stderr
        let _ = io::stdout().flush();
        log::error!("panic: {panic_info}");

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
