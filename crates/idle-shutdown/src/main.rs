use clap::Parser;
use idle_shutdown::cmd;
use idle_shutdown::config::Cli;
use idle_shutdown::config::Commands;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_global_hooks();

    let cli = Cli::parse();
    let guard = utils::logging::init(cli.log_path.as_ref());

    tracing::info!("Starting gpu-idle-shutdown {}", &**version::VERSION);

    let result = match cli.command {
        Commands::Run(run_args) => cmd::run_monitor(run_args).await,
        Commands::Check(check_args) => cmd::run_check(check_args),
    };

    if let Err(e) = result {
        tracing::error!("Fatal error: {e:?}");
        drop(guard);
        std::process::exit(1);
    }
}
