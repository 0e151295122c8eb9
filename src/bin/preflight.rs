use account_wallet_service::infra::config::StorageBackend;
use account_wallet_service::{storage, AppConfig, TokenCodec};
use uuid::Uuid;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Requires env vars:\n\
           JWT_SECRET, and DATABASE_URL unless STORAGE_BACKEND=memory\n\
         Optional:\n\
           STORAGE_BACKEND, DATABASE_MAX_CONNECTIONS, TOKEN_TTL_SECS, BIND_ADDR, LOG_FORMAT\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  STORAGE_BACKEND={:?}", config.storage_backend);
    println!("  BIND_ADDR={}", config.bind_addr);
    if config.jwt_secret.len() < 32 {
        eprintln!("  Warning: JWT_SECRET is shorter than 32 bytes.");
    }

    // Storage reachability (also creates the tables for postgres)
    let storage = storage::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open storage: {}", e))?;
    storage
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Storage ping failed: {}", e))?;
    println!("  Storage `{}` is reachable.", storage.backend_name());
    if config.storage_backend == StorageBackend::Memory {
        eprintln!("  Warning: memory backend keeps no data across restarts.");
    }

    // Token codec round-trip with the configured key
    let tokens = TokenCodec::with_ttl(config.jwt_secret.as_bytes(), config.token_ttl());
    let probe = Uuid::new_v4();
    let token = tokens.issue(probe)?;
    let claims = tokens.verify(&token)?;
    if claims.sub != probe {
        return Err(anyhow::anyhow!("Token round-trip returned the wrong subject"));
    }
    println!(
        "  Session tokens sign and verify (ok, valid for {}s).",
        tokens.ttl().num_seconds()
    );

    println!("> Preflight OK.");
    Ok(())
}
