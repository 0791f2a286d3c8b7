#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tripcast::cli::run().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    std::process::exit(1);
}
