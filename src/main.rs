use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use lodefroll::{
    client,
    decoder,
    deployment::{
        self,
        Deployment,
        DeploymentRecord,
    },
    gateway::{
        LottoGateway,
        rpc::RpcGateway,
    },
    session::Sourced,
    wallets,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    sync::OnceLock,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};
use url::Url;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "lodefroll",
    about = "Play the LoDeFROLL lottery on Viction from the terminal",
    version
)]
struct Cli {
    /// Override the RPC URL of the deployment
    #[arg(long, global = true)]
    rpc_url: Option<Url>,

    /// Keystore name to play with
    #[arg(long, global = true)]
    wallet: Option<String>,

    /// Override the keystore directory (defaults to ~/.foundry/keystores)
    #[arg(long, global = true)]
    wallet_dir: Option<String>,

    /// JSON deployment record to use instead of the built-in Viction one
    #[arg(long, global = true)]
    deployment: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive betting terminal (default)
    Tui,
    /// Decode a transaction hash or raw event payload
    Decode { input: String },
    /// Print the lottery's payout constants
    Constants,
    /// List keystores in the wallet directory
    Wallets,
    /// Record the lottery's deployed bytecode hash to a deployment file
    PinDeployment { path: PathBuf },
}

fn init_file_logging() {
    let appender = rolling::daily("logs", "lodefroll.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

fn init_stderr_logging() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn resolve_deployment(cli: &Cli) -> Result<Deployment> {
    let deployment = deployment::resolve(cli.deployment.as_deref())?;
    Ok(match &cli.rpc_url {
        Some(url) => deployment.with_rpc_url(url.clone()),
        None => deployment,
    })
}

fn read_only_gateway(deployment: &Deployment) -> RpcGateway {
    RpcGateway::read_only(
        deployment.chain.rpc_url.clone(),
        deployment.token,
        deployment.lotto,
    )
}

async fn run_tui(cli: &Cli) -> Result<()> {
    let deployment = resolve_deployment(cli)?;
    let name = cli
        .wallet
        .as_deref()
        .ok_or_else(|| eyre!("Specify --wallet <name> to select a keystore"))?;
    let dir = wallets::resolve_wallet_dir(cli.wallet_dir.as_deref())?;
    let descriptor = wallets::find_wallet(&dir, name)?;
    let signer = wallets::unlock_wallet(&descriptor)?;
    tracing::info!(wallet = %descriptor.name, address = %signer.address(), "wallet unlocked");
    client::run_app(client::AppConfig { deployment, signer }).await
}

async fn run_decode(cli: &Cli, input: &str) -> Result<()> {
    let deployment = resolve_deployment(cli)?;
    let gateway = read_only_gateway(&deployment);
    let report = decoder::decode_input(&gateway, &deployment.chain.explorer_url, input)
        .await
        .wrap_err("Failed to decode input")?;
    println!("{}", report.render());
    Ok(())
}

async fn run_constants(cli: &Cli) -> Result<()> {
    let deployment = resolve_deployment(cli)?;
    let gateway = read_only_gateway(&deployment);
    match gateway.payout_constants().await {
        Sourced::Live(constants) => println!("{}", constants.describe()),
        Sourced::Default { value, reason } => {
            println!("{} (defaults)", value.describe());
            eprintln!("Could not read constants from chain: {reason}");
        }
    }
    Ok(())
}

fn run_wallets(cli: &Cli) -> Result<()> {
    let dir = wallets::resolve_wallet_dir(cli.wallet_dir.as_deref())?;
    let found = wallets::list_wallets(&dir)?;
    if found.is_empty() {
        println!("No keystores found in {}", dir.display());
    }
    for wallet in found {
        println!("{}\t{}", wallet.name, wallet.path.display());
    }
    Ok(())
}

async fn run_pin_deployment(cli: &Cli, path: &Path) -> Result<()> {
    let deployment = resolve_deployment(cli)?;
    let gateway = read_only_gateway(&deployment);
    let code = gateway
        .deployed_code(deployment.lotto)
        .await
        .wrap_err("Failed to read lottery bytecode")?;
    if code.is_empty() {
        return Err(eyre!("No contract deployed at {}", deployment.lotto));
    }
    let record = DeploymentRecord {
        chain_id: deployment.chain.chain_id,
        rpc_url: deployment.chain.rpc_url.to_string(),
        explorer_url: deployment.chain.explorer_url.clone(),
        token_address: deployment.token,
        lotto_address: deployment.lotto,
        ..DeploymentRecord::default()
    }
    .pinned(&code);
    deployment::write_record(path, &record)?;
    println!(
        "Pinned {} bytecode {} to {}",
        deployment.lotto,
        record.bytecode_hash.as_deref().unwrap_or_default(),
        path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        None | Some(Command::Tui) => {
            init_file_logging();
            tracing::info!("starting lodefroll client");
            run_tui(&cli).await
        }
        Some(Command::Decode { input }) => {
            init_stderr_logging();
            run_decode(&cli, input).await
        }
        Some(Command::Constants) => {
            init_stderr_logging();
            run_constants(&cli).await
        }
        Some(Command::Wallets) => {
            init_stderr_logging();
            run_wallets(&cli)
        }
        Some(Command::PinDeployment { path }) => {
            init_stderr_logging();
            run_pin_deployment(&cli, path).await
        }
    }
}
