mod app;
mod commands;
mod logging;
mod signals;

use commands::cli;

#[tokio::main]
async fn main() {
    logging::init_logging();

    let invocation = match cli::parse_invocation(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };

    let exit = app::run_app(invocation).await;
    std::process::exit(exit);
}
