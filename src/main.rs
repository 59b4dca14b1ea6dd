use shulker::cli::{self, Args};
use shulker_logger::{log, LogSeverity::*};

#[tokio::main]
async fn main() {
    log("Shulker init".to_string(), Info);
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            log(err.to_string(), Fatal);
            std::process::exit(2);
        }
    };

    match cli::run(args).await {
        Ok(summary) => {
            log(
                format!(
                    "Loaded {} chunk(s), {} section(s); {} section(s) and {} file(s) failed",
                    summary.chunks, summary.sections, summary.failed_sections, summary.failed_files
                ),
                Info,
            );
            if summary.failed_files > 0 {
                std::process::exit(1);
            }
        }
        Err(err) => {
            log(err.to_string(), Fatal);
            std::process::exit(1);
        }
    }
}
