mod cli;

use ffscribe::av::{
    check_tools, MediaMetadata, ShellRunner, StreamMetadata, ToolPaths, Transcoder,
};
use ffscribe::config::{self, Config};
use ffscribe::job::build_job;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, JobArgs};
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ffscribe=trace,ffscribe_av=trace,ffscribe_probe=trace".to_string()
        } else {
            "ffscribe=info,ffscribe_av=info".to_string()
        }
    });

    // Logs go to stderr so rendered commands and JSON stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe { file, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(probe_file(&config, &file, json))
        }
        Commands::Transcode(args) => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let verbose = cli.verbose || config.verbose;
            block_on(transcode(&config, &args, verbose))
        }
        Commands::Render(args) => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            render(&config, &args)
        }
        Commands::Profiles { json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            list_profiles(&config, json)
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools_cmd(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

/// Transcoder for the configured tools; Ctrl-C cancels the running tool.
fn transcoder(config: &Config, tools: ToolPaths) -> Transcoder {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping the running tool");
            on_signal.cancel();
        }
    });

    let runner = ShellRunner::new().with_timeout(config.tools.timeout());
    Transcoder::with_runner(tools, runner).with_cancellation(cancel)
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let tools = config.tools.for_probe()?;
    let metadata = transcoder(config, tools)
        .metadata(file)
        .await
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        print_metadata(&metadata);
    }

    Ok(())
}

fn print_metadata(metadata: &MediaMetadata) {
    if let Some(ref version) = metadata.tool_version {
        println!("Tool version: {}", version);
    }
    if metadata.inputs.is_empty() {
        println!("No inputs found in probe output");
        return;
    }

    for input in &metadata.inputs {
        println!("\nInput #{}: {}", input.index, input.file_path);
        println!("  Container: {}", input.container_format);
        if let Some(duration) = input.duration() {
            println!("  Duration: {}", duration);
        }
        if let Some(bitrate) = input.bitrate() {
            println!("  Bitrate: {}", bitrate);
        }
        if let Some(resolution) = input.resolution {
            println!("  Resolution: {}", resolution);
        }

        if !input.chapters.is_empty() {
            println!("  Chapters: {}", input.chapters.len());
            for chapter in &input.chapters {
                println!(
                    "    [{}] {} - {} {}",
                    chapter.index,
                    chapter.start.as_deref().unwrap_or("?"),
                    chapter.end.as_deref().unwrap_or("?"),
                    chapter.title().unwrap_or_default()
                );
            }
        }

        println!("  Streams: {}", input.streams.len());
        for (key, stream) in &input.streams {
            println!("    [{}] {}", key, describe_stream(stream));
        }
    }
}

fn describe_stream(stream: &StreamMetadata) -> String {
    let mut line = stream.kind.to_string();
    if let Some(codec) = stream.codec() {
        line.push(' ');
        line.push_str(codec);
    }
    if let Some(resolution) = stream.resolution {
        line.push_str(&format!(" {}", resolution));
    }
    if let Some(ref language) = stream.language {
        line.push_str(&format!(" ({})", language));
    }
    line
}

async fn transcode(config: &Config, args: &JobArgs, verbose: bool) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", args.input);
    }

    let registry = config::build_registry(config)?;
    let job = build_job(
        &registry,
        &args.input,
        args.profile.as_deref(),
        &args.overrides,
        verbose,
    )?;

    let tools = config.tools.for_transcode()?;
    tracing::info!("Transcoding {:?} -> {:?}", args.input, args.output);
    let output = transcoder(config, tools)
        .run(&job, &args.output)
        .await
        .with_context(|| format!("Failed to transcode {:?}", args.input))?;

    if !output.stdout.is_empty() {
        print!("{}", output.stdout);
    }
    println!("Wrote {}", args.output.display());

    Ok(())
}

fn render(config: &Config, args: &JobArgs) -> Result<()> {
    let registry = config::build_registry(config)?;
    let job = build_job(
        &registry,
        &args.input,
        args.profile.as_deref(),
        &args.overrides,
        false,
    )?;

    println!("{}", job.render(&config.tools.paths().ffmpeg, &args.output));
    Ok(())
}

fn list_profiles(config: &Config, json: bool) -> Result<()> {
    let registry = config::build_registry(config)?;
    let profiles = registry.profiles();

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    for profile in &profiles {
        let origin = if ffscribe::av::FormatRegistry::is_builtin(profile.name()) {
            "built-in"
        } else {
            "custom"
        };
        println!("{} ({})", profile.name(), origin);

        let flags: Vec<String> = profile
            .flags()
            .iter()
            .map(|(flag, value)| format!("{} {}", flag, value).trim_end().to_string())
            .collect();
        println!("  {}", flags.join(" "));
    }

    Ok(())
}

fn check_tools_cmd(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = check_tools(&config.tools.paths());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to probe and transcode.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            let tools = config.tools.paths();
            println!("✓ Configuration is valid");
            println!("  ffmpeg: {}", tools.ffmpeg.display());
            println!("  ffprobe: {}", tools.ffprobe.display());
            match config.tools.timeout() {
                Some(timeout) => println!("  Timeout: {}s", timeout.as_secs()),
                None => println!("  Timeout: none"),
            }
            println!("  Custom profiles: {}", config.profiles.len());
            for name in config.profiles.keys() {
                println!("    {}", name);
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  ffmpeg: {}", config.tools.paths().ffmpeg.display());
            println!("  ffprobe: {}", config.tools.paths().ffprobe.display());
        }
    }

    Ok(())
}
