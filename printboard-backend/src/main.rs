use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Err(e) = printboard_backend::run(config_path).await {
        log::error!("[printboard.startup] Backend failed: {}", e);
        eprintln!("printboard-backend: {}", e);
        std::process::exit(1);
    }
}
