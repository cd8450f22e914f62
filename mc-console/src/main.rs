use std::{env, time::Duration};

use console::{
    ApiClient, ConsoleApp, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PUSH_PORT, DeliveryConfig,
    DeliveryMode, init_logging,
};
use tracing::info;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match parse_cli_args() {
        Ok(CliAction::Run(cli)) => cli,
        Ok(CliAction::Help) => {
            print_cli_help();
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("{}", binary_version_text());
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {err}\n");
            print_cli_help();
            return Err(err.into());
        }
    };

    init_logging()?;

    let api_url = cli
        .api_url
        .unwrap_or_else(|| "http://127.0.0.1:5050/api".to_string());
    let mode = cli.delivery.unwrap_or(DeliveryMode::Poll);
    let poll_interval =
        Duration::from_millis(cli.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS));
    let push_port = cli.ws_port.unwrap_or(DEFAULT_PUSH_PORT);
    let push_host = push_host_from_api_url(&api_url)?;
    let request_timeout = Duration::from_millis(cli.request_timeout_ms.unwrap_or(5_000));

    let client = ApiClient::new(&api_url, request_timeout);
    let delivery = DeliveryConfig {
        mode,
        poll_interval,
        push_host,
        push_port,
    };

    info!("loading module catalog from {api_url}");
    let mut app = ConsoleApp::connect(client, delivery).await?;
    app.run_shell().await?;
    Ok(())
}

#[derive(Clone, Debug, Default)]
struct CliArgs {
    api_url: Option<String>,
    delivery: Option<DeliveryMode>,
    poll_interval_ms: Option<u64>,
    ws_port: Option<u16>,
    request_timeout_ms: Option<u64>,
}

enum CliAction {
    Run(CliArgs),
    Help,
    Version,
}

fn parse_cli_args() -> Result<CliAction, String> {
    let mut args = env::args().skip(1).peekable();
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--api-url" => {
                cli.api_url = Some(next_arg_value("--api-url", &mut args)?);
            }
            "--delivery" => {
                let value = next_arg_value("--delivery", &mut args)?;
                cli.delivery = Some(value.parse()?);
            }
            "--poll-interval-ms" => {
                let value = next_arg_value("--poll-interval-ms", &mut args)?;
                cli.poll_interval_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --poll-interval-ms: {value}"))?,
                );
            }
            "--ws-port" => {
                let value = next_arg_value("--ws-port", &mut args)?;
                cli.ws_port = Some(
                    value
                        .parse::<u16>()
                        .map_err(|_| format!("invalid --ws-port: {value}"))?,
                );
            }
            "--request-timeout-ms" => {
                let value = next_arg_value("--request-timeout-ms", &mut args)?;
                cli.request_timeout_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --request-timeout-ms: {value}"))?,
                );
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }
    Ok(CliAction::Run(cli))
}

fn next_arg_value(
    flag: &str,
    args: &mut std::iter::Peekable<impl Iterator<Item = String>>,
) -> Result<String, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {flag}"))?;
    if value.trim().is_empty() {
        return Err(format!("value for {flag} cannot be empty"));
    }
    Ok(value)
}

fn push_host_from_api_url(api_url: &str) -> Result<String, String> {
    let parsed = Url::parse(api_url).map_err(|_| format!("invalid --api-url: {api_url}"))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| format!("--api-url has no host: {api_url}"))
}

fn print_cli_help() {
    eprintln!(concat!(
        "Usage: mc-console [options]\n\n",
        "Options:\n",
        "  --api-url <URL>             Backend API base URL (default: http://127.0.0.1:5050/api)\n",
        "  --delivery <poll|push>      Output delivery variant (default: poll)\n",
        "  --poll-interval-ms <MS>     Snapshot poll period (default: 2000)\n",
        "  --ws-port <PORT>            Live output port for push delivery (default: 8765)\n",
        "  --request-timeout-ms <MS>   Per-request timeout (default: 5000)\n",
        "  -V, --version               Show version\n",
        "  -h, --help                  Show this help\n"
    ));
}

fn binary_version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
