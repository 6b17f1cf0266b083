use colored::Colorize;
use quickread::cmd::CliApp;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = CliApp::run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
