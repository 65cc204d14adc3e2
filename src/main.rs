#[cfg(target_os = "macos")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("starting rotating cube");
    metal_cube::app::App::run()
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("metal-cube renders with Metal and only runs on macOS");
    std::process::exit(1);
}
