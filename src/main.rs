use clap::Parser;
use colored::Colorize;
use dialoguer::{Input, Select};
use project_promoter::{
    build_backend, PostGenerator, ProjectPromotionRequest, PromotionPipeline, PromotionReport,
    Publisher, Settings, Tone, VideoRecorder,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "project-promoter",
    version,
    about = "AI agent that promotes your projects on LinkedIn"
)]
struct Cli {
    /// Path to input JSON file with project details
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Run in interactive mode (prompt for input)
    #[arg(long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Skip recording the demo video
    #[arg(long)]
    no_video: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings, cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    display_welcome(&settings);

    let request = match load_request(&cli, &settings).await {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Error loading input: {}", e);
            println!("\n{}\n", format!("❌ Error: {}", e).red().bold());
            return ExitCode::FAILURE;
        }
    };

    println!("\n{}", "Initializing tools...".cyan());
    let generator = PostGenerator::new(build_backend(&settings), &settings);
    let recorder = (!cli.no_video).then(|| VideoRecorder::from_settings(&settings));
    let publisher = Publisher::new(&settings);
    let pipeline = PromotionPipeline::new(&settings, generator, recorder, publisher);

    println!("\n{}\n", "Running agent...".green().bold());

    // Dropping the pipeline future on Ctrl-C tears down the browser and
    // removes any partially written capture.
    tokio::select! {
        report = pipeline.run(&request) => {
            display_report(&report);
            ExitCode::SUCCESS
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted by user");
            println!("\n\n{}", "Operation cancelled by user.".yellow());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(settings: &Settings, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs::OpenOptions;
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let level = if verbose {
        "debug".to_string()
    } else {
        settings.log_level.to_lowercase()
    };
    let log_level = format!(
        "{level},project_promoter={level},reqwest=warn,hyper=warn,chromiumoxide=warn",
        level = level
    );

    let env_filter = if verbose {
        EnvFilter::try_new(&log_level)?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?
    };

    let console_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, file_error) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
    {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(
            "Could not open log file {}: {}; logging to console only",
            settings.log_file.display(),
            e
        );
    }

    tracing::info!("🌱 project-promoter {} starting up", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Log level: {}", log_level);
    Ok(())
}

fn display_welcome(settings: &Settings) {
    let border = "═".repeat(52);
    println!("{}", border.green());
    println!("{}", "🌱 Project Promoter AI Agent".green().bold());
    println!();
    println!("An open-source AI agent that promotes your projects on LinkedIn.");
    println!();
    println!("Features:");
    println!("  🤖 AI-powered post generation");
    println!("  🎥 Automated demo videos");
    println!("  📱 LinkedIn publishing");
    println!();
    println!(
        "LLM Provider: {} ({})",
        settings.llm_provider.as_str().cyan(),
        settings.model_name().cyan()
    );
    println!(
        "Auto-post: {}",
        if settings.auto_post { "Enabled" } else { "Disabled" }.cyan()
    );
    println!("{}", border.green());
}

async fn load_request(
    cli: &Cli,
    settings: &Settings,
) -> Result<ProjectPromotionRequest, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.input {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let request: ProjectPromotionRequest = serde_json::from_str(&contents)
            .map_err(|e| format!("Invalid input file {}: {}", path.display(), e))?;
        tracing::info!("Loaded input from: {}", path.display());
        return Ok(request);
    }

    if cli.interactive {
        // dialoguer blocks on the terminal
        let default_tone = settings.default_post_tone;
        return tokio::task::spawn_blocking(move || load_request_interactive(default_tone))
            .await?
            .map_err(|e| format!("Input cancelled: {}", e).into());
    }

    println!(
        "\n{}\n",
        "No input provided. Using example data...".yellow()
    );
    Ok(ProjectPromotionRequest::example(&settings.project_website_url))
}

fn load_request_interactive(default_tone: Tone) -> Result<ProjectPromotionRequest, dialoguer::Error> {
    println!("\n{}\n", "Project Promoter - Interactive Mode".cyan().bold());

    let project_name: String = Input::new().with_prompt("Project Name").interact_text()?;
    let website_url: String = Input::new().with_prompt("Website URL").interact_text()?;
    let description: String = Input::new()
        .with_prompt("Description")
        .allow_empty(true)
        .interact_text()?;

    println!("\n{}", "Key Features (one per line, empty line to finish):".yellow());
    let mut key_features = Vec::new();
    loop {
        let feature: String = Input::new()
            .with_prompt("  -")
            .allow_empty(true)
            .interact_text()?;
        if feature.trim().is_empty() {
            break;
        }
        key_features.push(feature);
    }

    let tone_names: Vec<&str> = Tone::ALL.iter().map(|t| t.as_str()).collect();
    let default_index = Tone::ALL.iter().position(|t| *t == default_tone).unwrap_or(0);
    let selected = Select::new()
        .with_prompt("Post Tone")
        .items(&tone_names)
        .default(default_index)
        .interact()?;

    Ok(ProjectPromotionRequest {
        project_name,
        website_url,
        description,
        key_features,
        tone: Some(Tone::ALL[selected]),
    })
}

fn display_report(report: &PromotionReport) {
    let border = "═".repeat(52);
    if report.succeeded() {
        println!("\n{}\n", "✅ Agent execution completed!".green().bold());
    } else {
        println!("\n{}\n", "❌ Agent execution finished with errors".red().bold());
    }

    let color_border = if report.succeeded() {
        border.green()
    } else {
        border.red()
    };
    println!("{}", color_border);
    println!("{}", "Results".bold());
    println!("{}", color_border);
    if let Some(post) = &report.post {
        println!("{}\n{}\n", "Output:".cyan(), post.text);
    }
    println!("{}", report.summary());
    println!("{}", color_border);
}
