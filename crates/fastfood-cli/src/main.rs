//! fastfood: seed the menu backend and browse what it holds.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use fastfood_api::{Api, GetMenuParams};
use fastfood_backend::{
    AppwriteBackend, Backend, HttpImageSource, ImageSource, MemoryBackend, PlaceholderImageSource,
};
use fastfood_core::{AppwriteConfig, MissingReferencePolicy, SeedConfig};
use fastfood_seed::{SeedData, Seeder};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Options accepted by `fastfood seed`.
#[derive(Debug, Default, PartialEq)]
struct SeedArgs {
    data: Option<PathBuf>,
    dry_run: bool,
    on_missing: Option<MissingReferencePolicy>,
    concurrency: Option<usize>,
}

fn parse_seed_args(args: &[String]) -> anyhow::Result<SeedArgs> {
    let mut parsed = SeedArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data" => {
                let path = iter.next().context("--data needs a path")?;
                parsed.data = Some(PathBuf::from(path));
            }
            "--dry-run" => parsed.dry_run = true,
            "--on-missing" => {
                let policy = iter.next().context("--on-missing needs proceed, skip or abort")?;
                parsed.on_missing = Some(policy.parse()?);
            }
            "--concurrency" => {
                let n = iter.next().context("--concurrency needs a number")?;
                let n: usize = n
                    .parse()
                    .with_context(|| format!("invalid --concurrency '{}'", n))?;
                parsed.concurrency = Some(n.max(1));
            }
            other => bail!("Unknown seed option: {}", other),
        }
    }

    Ok(parsed)
}

fn parse_menu_args(args: &[String]) -> anyhow::Result<GetMenuParams> {
    let mut params = GetMenuParams::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--category" => params.category = Some(iter.next().context("--category needs an id")?.clone()),
            "--query" => params.query = Some(iter.next().context("--query needs text")?.clone()),
            other => bail!("Unknown menu option: {}", other),
        }
    }

    Ok(params)
}

fn print_help() {
    println!("fastfood: seed and browse the fast-food menu backend");
    println!();
    println!("Usage: fastfood <command> [options]");
    println!();
    println!("Commands:");
    println!("  seed [options]             Wipe and reseed categories, customisations and menu");
    println!("      --data <path>          Seed from a JSON dataset instead of the bundled one");
    println!("      --dry-run              Seed an in-memory backend with placeholder images; no network");
    println!("      --on-missing <policy>  Unknown references: proceed (default), skip or abort");
    println!("      --concurrency <n>      Concurrent deletes while clearing (default 16)");
    println!("  categories                 List categories");
    println!("  menu [--category <id>] [--query <text>]");
    println!("                             List menu items");
    println!("  help                       Show this help message");
    println!();
    println!("Configuration comes from APPWRITE_ENDPOINT, APPWRITE_PROJECT_ID and APPWRITE_API_KEY.");
}

/// Backend and image source for a seed run. A dry run touches neither the
/// remote backend nor the network.
fn connect_seed_target(
    args: &SeedArgs,
    config: &Arc<AppwriteConfig>,
) -> anyhow::Result<(Arc<dyn Backend>, Box<dyn ImageSource>)> {
    if args.dry_run {
        info!("Dry run: seeding an in-memory backend with placeholder images");
        return Ok((
            Arc::new(MemoryBackend::new(config.clone())),
            Box::new(PlaceholderImageSource),
        ));
    }

    info!("Seeding {} (project {})", config.endpoint, config.project_id);
    Ok((
        Arc::new(AppwriteBackend::new(config.clone())?),
        Box::new(HttpImageSource::new()?),
    ))
}

async fn run_seed(args: SeedArgs) -> anyhow::Result<bool> {
    let config = match AppwriteConfig::from_env() {
        Ok(config) => config,
        Err(e) if args.dry_run => {
            info!("No backend configured ({}), using placeholder for dry run", e);
            AppwriteConfig::new("http://localhost/v1", "dry-run")?
        }
        Err(e) => return Err(e.into()),
    };
    let config = Arc::new(config);

    let mut seed_config = SeedConfig::from_env()?;
    if let Some(policy) = args.on_missing {
        seed_config.missing_references = policy;
    }
    if let Some(n) = args.concurrency {
        seed_config.clear_concurrency = n;
    }

    let data = match &args.data {
        Some(path) => SeedData::from_path(path)?,
        None => SeedData::bundled()?,
    };

    let (backend, images) = connect_seed_target(&args, &config)?;

    let seeder = Seeder::new(backend.as_ref(), images.as_ref(), &config).with_seed_config(seed_config);
    match seeder.seed(&data).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
        Err(e) => {
            error!("{}", e);
            if e.is_retryable() {
                eprintln!("Seeding failed ({}). The error looks transient; re-running starts over.", e);
            } else {
                eprintln!("Seeding failed: {}", e);
            }
            Ok(false)
        }
    }
}

fn connect() -> anyhow::Result<Api> {
    let config = Arc::new(AppwriteConfig::from_env()?);
    let backend = Arc::new(AppwriteBackend::new(config.clone())?);
    Ok(Api::new(backend, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_help();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "seed" => {
            let seed_args = parse_seed_args(&args[2..])?;
            let ok = run_seed(seed_args).await?;
            std::process::exit(if ok { 0 } else { 1 });
        }
        "categories" => {
            let categories = connect()?.get_categories().await?;
            for category in &categories {
                println!("{}  {}  {}", category.id, category.name, category.description);
            }
        }
        "menu" => {
            let params = parse_menu_args(&args[2..])?;
            let items = connect()?.get_menu(params).await?;
            for item in &items {
                println!(
                    "{}  {}  {:.2}  {}",
                    item.id,
                    item.name,
                    item.price,
                    item.categories.as_deref().unwrap_or("-")
                );
            }
        }
        "--help" | "-h" | "help" => print_help(),
        _ => {
            eprintln!("Unknown command: {}. Use 'fastfood help' for usage.", args[1]);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seed_args() {
        let parsed = parse_seed_args(&args(&[
            "--dry-run",
            "--on-missing",
            "skip",
            "--concurrency",
            "0",
            "--data",
            "menu.json",
        ]))
        .unwrap();
        assert!(parsed.dry_run);
        assert_eq!(parsed.on_missing, Some(MissingReferencePolicy::Skip));
        assert_eq!(parsed.concurrency, Some(1));
        assert_eq!(parsed.data, Some(PathBuf::from("menu.json")));

        assert_eq!(parse_seed_args(&[]).unwrap(), SeedArgs::default());
    }

    #[test]
    fn test_seed_args_errors() {
        assert!(parse_seed_args(&args(&["--data"])).is_err());
        assert!(parse_seed_args(&args(&["--on-missing", "ignore"])).is_err());
        assert!(parse_seed_args(&args(&["--concurrency", "many"])).is_err());
        assert!(parse_seed_args(&args(&["--force"])).is_err());
    }

    #[tokio::test]
    async fn test_dry_run_stays_offline() {
        let config = Arc::new(AppwriteConfig::new("http://localhost/v1", "dry-run").unwrap());
        let seed_args = SeedArgs {
            dry_run: true,
            ..SeedArgs::default()
        };
        let (backend, images) = connect_seed_target(&seed_args, &config).unwrap();

        // Unroutable source URLs still yield an image.
        let image = images.fetch("http://127.0.0.1:9/burger.jpg").await.unwrap();
        assert!(!image.bytes.is_empty());

        let data = SeedData::bundled().unwrap();
        let report = Seeder::new(backend.as_ref(), images.as_ref(), &config)
            .seed(&data)
            .await
            .unwrap();
        assert_eq!(report.images_uploaded, data.menu.len());
    }

    #[test]
    fn test_menu_args() {
        let params = parse_menu_args(&args(&["--category", "abc", "--query", "burger"])).unwrap();
        assert_eq!(params.category.as_deref(), Some("abc"));
        assert_eq!(params.query.as_deref(), Some("burger"));
        assert!(parse_menu_args(&args(&["--limit"])).is_err());
    }
}
