use clap::Parser;
use localrag_cli::cli::{execute, Cli};
use localrag_cli::{init_tracing, load_service};

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match load_service() {
        Ok(service) => execute(cli, &service).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
