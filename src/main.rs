//! walletstore 命令行入口
//!
//! 用法：`walletstore <generate [version] | verify | info | backup | new-address | export-view <out-file>>`
//! 密码从 `WALLET_PASSWORD` 读取，配置文件路径可由 `CONFIG_PATH` 指定

use anyhow::{bail, Context, Result};
use serde_json::json;
use walletstore::{
    config::Config,
    domain::WalletVersion,
    infrastructure::logging::init_logging,
    WalletStorage,
};

const USAGE: &str =
    "usage: walletstore <generate [version] | verify | info | backup | new-address | export-view <out-file>>";

fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 可选）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // 3. 初始化日志，guard 持有到进程结束
    let _log_guard = init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let password = std::env::var("WALLET_PASSWORD").context("WALLET_PASSWORD must be set")?;
    let storage = WalletStorage::from_config(&config);
    tracing::debug!(path = %storage.path().display(), command = %command, "Running wallet command");

    match command.as_str() {
        "generate" => {
            let version = match args.get(1) {
                Some(v) => WalletVersion::try_from(
                    v.trim_start_matches('v')
                        .parse::<i32>()
                        .with_context(|| format!("invalid wallet version '{}'", v))?,
                )?,
                None => WalletVersion::V2,
            };
            let generated = storage.generate_with_version(&password, version)?;
            print_json(json!({
                "version": generated.version.as_i32(),
                "address": generated.address.to_base58(),
                "public_key": hex::encode(&generated.public_key),
            }))
        }
        "verify" => {
            storage.verify(&password)?;
            print_json(json!({ "valid": true }))
        }
        "info" => {
            storage.load(&password)?;
            print_json(json!({
                "version": storage.version()?.as_i32(),
                "viewing": storage.is_viewing()?,
                "wallet_id": storage.primary_address()?.wallet_id(),
                "primary_address": storage.primary_address()?.to_base58(),
                "last_address": storage.last_address()?.to_base58(),
                "keys": storage.key_count()?,
                "addresses": storage.my_addresses_base58()?,
            }))
        }
        "backup" => {
            storage.load(&password)?;
            let created = storage.backup()?;
            print_json(json!({ "created": created }))
        }
        "new-address" => {
            storage.load(&password)?;
            let primary = storage.primary_address()?;
            let step = storage.generate_new_address(&primary, None, true, true)?;
            print_json(json!({
                "address": step.address.to_base58(),
                "nonce": hex::encode(&step.nonce),
            }))
        }
        "export-view" => {
            let Some(out) = args.get(1) else {
                bail!(USAGE);
            };
            storage.load(&password)?;
            let bytes = storage.export_view_only(&password)?;
            std::fs::write(out, &bytes).with_context(|| format!("failed to write {}", out))?;
            print_json(json!({ "written": out, "bytes": bytes.len() }))
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn print_json(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
