use std::process::ExitCode;

use recoverlette::cli::{App, Args, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is normal
    dotenvy::dotenv().ok();

    let args = Args::parse_args();
    let config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(config);
    match app.run(args).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
