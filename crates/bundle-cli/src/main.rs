use clap::Parser;

mod args;
mod cmd;
mod errors;
mod io;
mod output;
mod report;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = args::Cli::parse();
    output::init(cli.json);

    match cmd::dispatch(cli).await {
        Ok(()) => std::process::ExitCode::from(0),
        Err(e) => {
            output::eprintln_line(&format!("error: {e}"));
            let code = e
                .downcast_ref::<errors::CliError>()
                .map(|ce| ce.exit_code())
                .unwrap_or(1);
            std::process::ExitCode::from(code as u8)
        }
    }
}
