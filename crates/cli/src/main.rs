use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jobs::{
    Credentials, ExportFormat, ExportOptions, ExportResolution, HttpJobService, JobEvent, JobId,
    JobService,
};
use session::config::{app_data_dir, CONFIG_FILE};
use session::{Editor, EditorConfig, Role, TokenStore, VideoSource};
use timeline::timecode::format_clock_detail;

#[derive(Parser)]
#[command(name = "editverse-cli")]
#[command(about = "Editverse CLI - upload videos and edit them with natural-language prompts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Job service base URL (overrides config and EDITVERSE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored access token
    Logout,

    /// Upload a video and open a job for it
    Upload {
        /// Video file to upload
        file: PathBuf,
    },

    /// Upload (or reuse a job), send a prompt and wait for the result
    Edit {
        /// Video file to upload first
        #[arg(long, conflicts_with = "job", required_unless_present = "job")]
        file: Option<PathBuf>,

        /// Existing job ID
        #[arg(long)]
        job: Option<String>,

        /// What to change
        #[arg(short, long)]
        prompt: String,

        /// Copy the edited video here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show a job's current status
    Status {
        /// Job ID
        id: String,
    },

    /// Download a job's video
    Download {
        /// Job ID
        id: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Container format (mp4, webm, mov)
        #[arg(long, default_value = "mp4")]
        format: ExportFormat,

        /// Output size (720p, 1080p, 4k)
        #[arg(long, default_value = "1080p")]
        resolution: ExportResolution,
    },

    /// List previous jobs
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref(), cli.api_url)?;
    let tokens = TokenStore::new(config.token_path());
    let service = connect(&config, &tokens)?;

    match cli.command {
        Commands::Login { email, password } => {
            login_command(&service, &tokens, Credentials { email, password }).await
        }
        Commands::Register { email, password } => {
            register_command(&service, Credentials { email, password }).await
        }
        Commands::Logout => logout_command(&tokens),
        Commands::Upload { file } => upload_command(service, &config, &file).await,
        Commands::Edit {
            file,
            job,
            prompt,
            output,
        } => edit_command(service, &config, file, job, &prompt, output).await,
        Commands::Status { id } => status_command(&service, JobId::new(id)).await,
        Commands::Download {
            id,
            output,
            format,
            resolution,
        } => {
            download_command(
                &service,
                JobId::new(id),
                &output,
                ExportOptions::new(format, resolution),
            )
            .await
        }
        Commands::History { json } => history_command(&service, json).await,
    }
}

fn load_config(path: Option<&Path>, api_url: Option<String>) -> Result<EditorConfig> {
    let config = match path {
        Some(path) => EditorConfig::load(path)?,
        None => {
            let data_dir = app_data_dir();
            let config = EditorConfig::load_or_default(&data_dir)?;
            if !data_dir.join(CONFIG_FILE).exists() {
                info!("No config found, using defaults under {:?}", data_dir);
            }
            config
        }
    };
    let config = config.apply_env();
    Ok(match api_url {
        Some(url) => config.with_api_url(url),
        None => config,
    })
}

fn connect(config: &EditorConfig, tokens: &TokenStore) -> Result<Arc<HttpJobService>> {
    let service = match config.request_timeout() {
        Some(timeout) => HttpJobService::with_timeout(&config.api_base_url, timeout)?,
        None => HttpJobService::new(&config.api_base_url),
    };
    service.set_token(tokens.load()?);
    Ok(Arc::new(service))
}

async fn login_command(
    service: &HttpJobService,
    tokens: &TokenStore,
    credentials: Credentials,
) -> Result<()> {
    let token = service.login(&credentials).await?;
    tokens.save(&token)?;
    println!("Logged in as {}", credentials.email);
    Ok(())
}

async fn register_command(service: &HttpJobService, credentials: Credentials) -> Result<()> {
    service.register(&credentials).await?;
    println!(
        "Registered {}. Run `editverse-cli login` to sign in.",
        credentials.email
    );
    Ok(())
}

fn logout_command(tokens: &TokenStore) -> Result<()> {
    if tokens.clear()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

async fn upload_command(
    service: Arc<HttpJobService>,
    config: &EditorConfig,
    file: &Path,
) -> Result<()> {
    info!("Uploading {:?}", file);
    let mut editor = Editor::from_config(service, config);
    let result = editor.upload_path(file).await;
    for alert in editor.session_mut().take_alerts() {
        eprintln!("Error: {}", alert.message);
    }
    let job_id = result?;

    let session = editor.session();
    println!("Job ID: {}", job_id);
    match session.job().and_then(|j| j.source_duration) {
        Some(duration) => println!("Duration: {}", format_clock_detail(duration)),
        None => println!("Duration: unknown"),
    }
    if let Some(VideoSource::Remote(url)) = session.video_source() {
        println!("Preview: {}", url);
    }
    Ok(())
}

async fn edit_command(
    service: Arc<HttpJobService>,
    config: &EditorConfig,
    file: Option<PathBuf>,
    job: Option<String>,
    prompt: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut editor = Editor::from_config(service, config);

    match (file, job) {
        (Some(file), _) => {
            let result = editor.upload_path(&file).await;
            for alert in editor.session_mut().take_alerts() {
                eprintln!("Error: {}", alert.message);
            }
            let job_id = result?;
            println!("Uploaded {:?} as job {}", file, job_id);
        }
        (None, Some(id)) => editor
            .open_job(JobId::new(id))
            .await
            .context("opening job")?,
        (None, None) => bail!("either --file or --job is required"),
    }

    let replies_before = editor.session().chat().count(Role::Assistant);
    if let Err(e) = editor.send_prompt(prompt).await {
        print_new_replies(&editor, replies_before);
        return Err(e.into());
    }
    println!("Prompt sent, waiting for the job to finish...");

    for event in editor.wait_for_job().await {
        match event {
            JobEvent::Status { report, .. } => info!("Status: {}", report.status),
            JobEvent::PollError { error, .. } => warn!("Status check failed: {}", error),
            _ => {}
        }
    }
    print_new_replies(&editor, replies_before);
    for alert in editor.session_mut().take_alerts() {
        eprintln!("Error: {}", alert.message);
    }

    if let Some(VideoSource::File(render)) = editor.session().video_source() {
        match output {
            Some(output) => {
                std::fs::copy(render, &output)
                    .with_context(|| format!("copying render to {:?}", output))?;
                println!("Saved edited video to {:?}", output);
            }
            None => println!("Edited video: {:?}", render),
        }
    }
    Ok(())
}

fn print_new_replies<S: JobService + ?Sized>(editor: &Editor<S>, skip: usize) {
    editor
        .session()
        .chat()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .skip(skip)
        .for_each(|m| println!("Assistant: {}", m.content));
}

async fn status_command(service: &HttpJobService, job_id: JobId) -> Result<()> {
    let report = service.status(&job_id).await?;
    println!("Job {}: {}", job_id, report.status);
    if let Some(duration) = report.duration {
        println!("  duration: {}", format_clock_detail(duration));
    }
    if let Some(prompt) = &report.prompt {
        println!("  prompt:   {}", prompt);
    }
    if let Some(reply) = &report.ai_reply {
        println!("  reply:    {}", reply);
    }
    if let Some(error) = &report.error {
        println!("  error:    {}", error);
    }
    Ok(())
}

async fn download_command(
    service: &HttpJobService,
    job_id: JobId,
    output: &Path,
    options: ExportOptions,
) -> Result<()> {
    info!(
        "Downloading job {} as {} {}",
        job_id, options.format, options.resolution
    );
    let bytes = service.download(&job_id, Some(&options)).await?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &bytes).with_context(|| format!("writing {:?}", output))?;
    println!("Saved {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

async fn history_command(service: &HttpJobService, json: bool) -> Result<()> {
    let jobs = match service.history().await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!("Could not load job history: {}", e);
            Vec::new()
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        println!("No previous jobs");
        return Ok(());
    }
    for job in jobs {
        println!(
            "{}  {:<10}  {}  {}",
            job.id,
            job.status.as_str(),
            job.created_at.as_deref().unwrap_or("-"),
            job.prompt.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
