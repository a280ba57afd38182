//! Workflow worker entry point
//!
//! One process per workflow job; the job id is the single argument.

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = linkout_worker::main_with_args(args).await;
    std::process::exit(code);
}
