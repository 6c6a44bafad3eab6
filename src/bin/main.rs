//! Arkpanel CLI - JSON in, JSON out
//!
//! Pure engine commands (no backend needed):
//!   arkpanel classify <address>                   → {"domain": "onchain", ...}
//!   arkpanel fee --fee-rate 5                     → {"fee_sat": 1125, ...}
//!   arkpanel validate <address> <amount> --available 12000
//!
//! Panel paths against the in-memory backend (seeded with --state):
//!   arkpanel get /exit --state state.json
//!   arkpanel put /withdraw '{"address": "bc1q...", "amount": 10000}' --state state.json
//!   arkpanel serve --port 3000 --state state.json

use arkpanel::config::{load_dotenv, PanelConfig};
use arkpanel::logging::init_logging;
use arkpanel::{
    classify, estimate_fee, install_signal_handlers, suggest_method, validate, Balance, BalancePoller, FeeTier,
    MemoryBackend, MemoryState, Panel, PanelNamespace, SettlementMethod, WithdrawalIntent,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

fn main() {
    load_dotenv(Path::new(".env"));
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("arkpanel {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("classify") => cmd_classify(&opts),
        Some("fee") => cmd_fee(&opts),
        Some("tiers") => Ok(cmd_tiers()),
        Some("validate") => cmd_validate(&opts),
        Some("get") => cmd_get(&opts),
        Some("put") => cmd_put(&opts),
        Some("serve") => cmd_serve(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": e}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    method: Option<String>,
    fee_rate: Option<u64>,
    tier: Option<String>,
    size: Option<u64>,
    available: Option<u64>,
    state: Option<PathBuf>,
    port: Option<u16>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let next = args.get(i + 1);
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--pretty" => opts.pretty = true,
                "--method" | "-m" if next.is_some() => {
                    opts.method = next.cloned();
                    i += 1;
                }
                "--fee-rate" | "-f" if next.is_some() => {
                    opts.fee_rate = next.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--tier" | "-t" if next.is_some() => {
                    opts.tier = next.cloned();
                    i += 1;
                }
                "--size" if next.is_some() => {
                    opts.size = next.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--available" if next.is_some() => {
                    opts.available = next.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--state" | "-s" if next.is_some() => {
                    opts.state = next.map(PathBuf::from);
                    i += 1;
                }
                "--port" | "-p" if next.is_some() => {
                    opts.port = next.and_then(|v| v.parse().ok());
                    i += 1;
                }
                _ if !arg.starts_with('-') || arg.parse::<i64>().is_ok() => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.positional = positional;
        opts
    }

    fn arg(&self, index: usize, name: &str) -> Result<&str, String> {
        self.positional.get(index).map(String::as_str).ok_or_else(|| format!("Missing <{}>", name))
    }

    fn fee_rate_or(&self, default: u64) -> Result<u64, String> {
        if let Some(rate) = self.fee_rate {
            return Ok(rate);
        }
        match self.tier.as_deref() {
            Some(t) => FeeTier::from_str(t).map(|t| t.rate()).ok_or_else(|| format!("Unknown tier: {}", t)),
            None => Ok(default),
        }
    }
}

fn load_config(opts: &ParsedArgs) -> Result<PanelConfig, String> {
    let mut config = PanelConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(state) = &opts.state {
        config = config.with_state_path(state.clone());
    }
    if let Some(port) = opts.port {
        config = config.with_port(port);
    }
    Ok(config)
}

fn cmd_classify(opts: &ParsedArgs) -> Result<Value, String> {
    let address = opts.arg(0, "address")?;
    let domain = classify(address).map_err(|e| e.to_string())?;
    Ok(json!({"address": address, "domain": domain, "suggested_method": suggest_method(address)}))
}

fn cmd_fee(opts: &ParsedArgs) -> Result<Value, String> {
    let config = load_config(opts)?;
    let fee_rate = opts.fee_rate_or(config.fee_rate)?;
    let size = opts.size.unwrap_or(config.tx_vbytes);
    Ok(json!({"fee_rate": fee_rate, "size": size, "fee_sat": estimate_fee(fee_rate, size)}))
}

fn cmd_tiers() -> Value {
    json!(FeeTier::all()
        .iter()
        .map(|t| json!({"tier": t, "rate": t.rate(), "label": t.label(), "description": t.description()}))
        .collect::<Vec<_>>())
}

fn cmd_validate(opts: &ParsedArgs) -> Result<Value, String> {
    let config = load_config(opts)?;
    let address = opts.arg(0, "address")?;
    let amount: i64 = opts.arg(1, "amount")?.parse().map_err(|_| "Amount must be an integer".to_string())?;
    let method = match opts.method.as_deref() {
        Some(m) => SettlementMethod::from_str(m).ok_or_else(|| format!("Unknown method: {}", m))?,
        None => SettlementMethod::Auto,
    };
    let intent = WithdrawalIntent::new(address, amount).with_method(method).with_fee_rate(opts.fee_rate_or(config.fee_rate)?);
    let balance = opts.available.map(Balance::confirmed);
    match validate(&intent, balance.as_ref()) {
        Ok(plan) => Ok(json!({"valid": true, "plan": plan})),
        Err(e) => Ok(json!({"valid": false, "error": e.to_string(), "field": e.field()})),
    }
}

fn open_namespace(config: PanelConfig) -> Result<PanelNamespace<MemoryBackend>, String> {
    let state = match &config.state_path {
        Some(path) => MemoryState::load(path).map_err(|e| format!("{:#}", e))?,
        None => MemoryState::default(),
    };
    let backend = MemoryBackend::new(state).with_tx_vbytes(config.tx_vbytes);
    let panel = Panel::new(Arc::new(backend), config);
    Ok(PanelNamespace::new(Arc::new(panel)))
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))
}

fn cmd_get(opts: &ParsedArgs) -> Result<Value, String> {
    let path = opts.arg(0, "path")?.to_string();
    let namespace = open_namespace(load_config(opts)?)?;
    runtime()?.block_on(async move {
        namespace.read(&path).await.map_err(|e| e.to_string())?.ok_or_else(|| format!("Not found: {}", path))
    })
}

fn cmd_put(opts: &ParsedArgs) -> Result<Value, String> {
    let path = opts.arg(0, "path")?.to_string();
    let data: Value = match opts.positional.get(1) {
        Some(raw) => serde_json::from_str(raw).map_err(|e| format!("Invalid JSON: {}", e))?,
        None => json!({}),
    };
    let namespace = open_namespace(load_config(opts)?)?;
    runtime()?.block_on(async move {
        // Withdrawals validate against a snapshot, so load one first.
        namespace.panel().refresh_balance().await.map_err(|e| e.to_string())?;
        namespace.write(&path, data).await.map_err(|e| e.to_string())
    })
}

fn cmd_serve(opts: &ParsedArgs) -> Result<Value, String> {
    let config = load_config(opts)?;
    let port = config.port;
    let app_name = config.app.clone();
    let namespace = Arc::new(open_namespace(config)?);

    runtime()?.block_on(async move {
        let shutdown = install_signal_handlers();

        let poller = BalancePoller::new(namespace.panel().clone()).spawn(shutdown.subscribe());
        info!("Balance poller started");

        let router = arkpanel::create_router_with_name(namespace, &app_name);
        let addr = format!("0.0.0.0:{}", port);

        info!("Arkpanel server listening on http://{}", addr);
        info!("  GET  /health              - Health check");
        info!("  GET  /paths               - List panel paths");
        debug!("  GET  /panel/*path         - Read panel path");
        debug!("  POST /panel/*path         - Panel action");

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| format!("Failed to bind: {}", e))?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        let _ = poller.await;
        info!("Balance poller stopped");
        Ok::<(), String>(())
    })?;

    Ok(json!({"status": "stopped"}))
}

fn print_usage() {
    println!(
        r#"arkpanel - Bitcoin/Ark wallet panel engine

USAGE:
    arkpanel <command> [args] [options]

COMMANDS:
    classify <address>              Detect settlement domain from prefix
    fee                             Estimate fee for a fee rate and size
    tiers                           List fee tiers
    validate <address> <amount>     Validate a withdrawal intent
    get <path>                      Read panel path
    put <path> [json]               Run panel action
    serve                           Start HTTP server

OPTIONS:
    --method, -m <m>        auto|onchain|offchain (default: auto)
    --fee-rate, -f <n>      Fee rate in sat/vB (env: ARKPANEL_FEE_RATE)
    --tier, -t <tier>       economic|standard|priority
    --size <vbytes>         Transaction size for fee estimate (default: 225)
    --available <sats>      Spendable balance for validate
    --state, -s <file>      JSON seed for in-memory backend (env: ARKPANEL_STATE)
    --port, -p <port>       Server port (default: 3000, env: ARKPANEL_PORT)
    --pretty                Pretty-print JSON
    --version, -V           Print version

PANEL PATHS:
    /balance                → {{total, confirmed, unconfirmed, available}}
    /deposit                → {{onchain, offchain}}
    /fee-tiers              → {{tiers, default}}
    /exit                   → {{state, actions, progress, remaining_secs}}
    /exit/transactions      → {{transactions, count, total_sat}}
    /actions                → {{withdraw: idle|in_flight|settled, ...}}
    /withdraw               ← {{address, amount, method?, fee_rate?}}
    /withdraw/validate      ← {{address, amount, method?, fee_rate?}}
    /exit/execute           ← {{address?, fee_rate?}}
    /exit/timelock          ← {{address?, fee_rate?}}
    /exit/download          ← {{}}
    /exit/broadcast         ← {{id}}

EXAMPLES:
    arkpanel classify tark1qqellv77udfmr20tun8dvju5vgudpf9vxe8jwhthrkn26fz96pawqfdy8nk
    arkpanel validate bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq 10000 --available 12000
    arkpanel put /exit/broadcast '{{"id": "exit-1"}}' --state state.json
"#
    );
}
