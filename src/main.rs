use clap::Parser;
use weekly_focus::domain::ports::{Display, LanguageModel, ProjectSource};
use weekly_focus::utils::error::ErrorSeverity;
use weekly_focus::utils::{logger, validation::Validate};
use weekly_focus::{
    AnthropicModel, CliConfig, Command, FocusEngine, FocusError, JsonFileSource, NotionSource,
    OfflineModel, Settings, TerminalDisplay,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting weekly-focus");
    tracing::debug!(command = ?cli.command(), mode = ?cli.run_mode(), "Parsed command line");

    let display = TerminalDisplay::new(cli.json);

    let result = match cli.command() {
        Command::Recommend => recommend(&cli, &display).await,
        Command::Check => check_connections(&cli).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ weekly-focus failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        display.show_error(&e);

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

fn load_settings(cli: &CliConfig) -> weekly_focus::Result<Settings> {
    cli.validate()?;
    let settings = cli.load_settings()?;
    settings.validate()?;
    tracing::debug!("✅ Configuration loaded and validated");
    Ok(settings)
}

fn build_source(cli: &CliConfig, settings: &Settings) -> weekly_focus::Result<Box<dyn ProjectSource>> {
    match &cli.projects_file {
        Some(path) => {
            tracing::info!("📁 Reading projects from {}", path);
            Ok(Box::new(JsonFileSource::new(path)))
        }
        None => Ok(Box::new(NotionSource::new(&settings.notion)?)),
    }
}

fn build_model(cli: &CliConfig, settings: &Settings) -> weekly_focus::Result<Box<dyn LanguageModel>> {
    // dry-run 不需要 API key
    if cli.dry_run && settings.anthropic.api_key.is_none() {
        return Ok(Box::new(OfflineModel));
    }
    Ok(Box::new(AnthropicModel::new(&settings.anthropic)?))
}

async fn recommend(cli: &CliConfig, display: &TerminalDisplay) -> weekly_focus::Result<()> {
    let settings = load_settings(cli)?;
    let source = build_source(cli, &settings)?;
    let model = build_model(cli, &settings)?;

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the language model will not be called");
    }

    let engine = FocusEngine::new(
        source,
        model,
        settings.rules.clone(),
        settings.persona.clone(),
        cli.run_mode(),
    );

    let outcome = engine.run().await?;
    display.show_outcome(&outcome)
}

async fn check_connections(cli: &CliConfig) -> weekly_focus::Result<()> {
    let settings = load_settings(cli)?;
    let mut failures = 0;

    match build_source(cli, &settings) {
        Ok(source) => match source.fetch_projects().await {
            Ok(projects) => println!("✅ Source: connected - found {} projects", projects.len()),
            Err(e) => {
                failures += 1;
                println!("❌ Source: failed - {}", e);
            }
        },
        Err(e) => {
            failures += 1;
            println!("❌ Source: not configured - {}", e);
        }
    }

    match AnthropicModel::new(&settings.anthropic) {
        Ok(model) => match model
            .complete("You are a test assistant.", "Respond with just the word 'OK'.")
            .await
        {
            Ok(reply) if reply.contains("OK") => println!("✅ Model: connected and responding"),
            Ok(_) => println!("⚠️ Model: connected but unexpected response"),
            Err(e) => {
                failures += 1;
                println!("❌ Model: failed - {}", e);
            }
        },
        Err(e) => {
            failures += 1;
            println!("❌ Model: not configured - {}", e);
        }
    }

    if failures > 0 {
        return Err(FocusError::ConfigError {
            message: format!("{} connection check(s) failed", failures),
        });
    }
    Ok(())
}
