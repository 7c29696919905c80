mod app;
mod audio;
mod config;
mod dispatcher;
mod error;
mod library;
mod runtime;
mod song;
mod store;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()?;
    Ok(())
}
