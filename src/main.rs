use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

mod aircraft;
mod app;
mod config;
mod display;
mod fetch;
mod geo;

fn main() {
    setup_logging();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(1);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    if let Err(error) = ctrlc::set_handler(move || stop_flag.store(true, Ordering::Relaxed)) {
        log::error!("Unable to install Ctrl-C handler: {}", error);
        std::process::exit(1);
    }

    app::run(config, &stop);
}

fn setup_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                record.level(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout)
        .init();
}
