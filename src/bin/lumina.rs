//! CLI for Lumina - AI photo editing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use lumina::edit::{GeminiEditor, GeminiModel, ImageEditor};
use lumina::session::{EditMode, QuickAction, Session};
use lumina::shell::Shell;
use lumina::LuminaError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Edit photos with plain-language instructions via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gemini model to use
    #[arg(long, value_enum, global = true, default_value = "flash")]
    model: ModelArg,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit to an image and save the result
    Edit(EditArgs),

    /// Open an interactive editing shell
    Shell(ShellArgs),

    /// List the preset quick actions
    Actions,

    /// Check that the API key and model are usable
    Check,
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// Free-form edit instruction
    #[arg(short, long, conflicts_with = "action", required_unless_present = "action")]
    prompt: Option<String>,

    /// Preset edit to apply
    #[arg(short, long, value_enum)]
    action: Option<ActionArg>,

    /// Directory to save the edited image in
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[derive(Args)]
struct ShellArgs {
    /// Image to load on start
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// gemini-2.5-flash-image
    Flash,
    /// gemini-3-pro-image-preview
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    #[value(name = "remove-bg")]
    RemoveBg,
    Indoor,
    Outdoor,
    Cyberpunk,
    Enhance,
}

impl From<ActionArg> for QuickAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::RemoveBg => QuickAction::RemoveBackground,
            ActionArg::Indoor => QuickAction::IndoorSet,
            ActionArg::Outdoor => QuickAction::Outdoor,
            ActionArg::Cyberpunk => QuickAction::Cyberpunk,
            ActionArg::Enhance => QuickAction::Enhance,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => {
            run_edit(args, cli.model, cli.json).await?;
        }
        Commands::Shell(args) => {
            run_shell(args, cli.model).await?;
        }
        Commands::Actions => {
            list_actions(cli.json)?;
        }
        Commands::Check => {
            check(cli.model, cli.json).await?;
        }
    }

    Ok(())
}

fn build_editor(model: ModelArg) -> anyhow::Result<GeminiEditor> {
    Ok(GeminiEditor::builder().model(model.into()).build()?)
}

async fn run_edit(args: EditArgs, model: ModelArg, json_output: bool) -> anyhow::Result<()> {
    let session = Session::new(Arc::new(build_editor(model)?));
    session.select_image(&args.input).await?;

    let result = match (args.action, args.prompt.as_deref()) {
        (Some(action), _) => session.apply_quick_action(action.into()).await,
        (None, Some(prompt)) => session.apply_edit(prompt, EditMode::Style).await,
        (None, None) => anyhow::bail!("either --prompt or --action is required"),
    };

    let item = match result {
        Ok(Some(item)) => item,
        Ok(None) => anyhow::bail!("no image loaded"),
        Err(e) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&failure_json(&e))?);
            }
            anyhow::bail!("{}", e.user_message());
        }
    };

    tokio::fs::create_dir_all(&args.output).await?;
    let path = session.save_current(&args.output).await?;

    if json_output {
        let out = serde_json::json!({
            "success": true,
            "output": path.display().to_string(),
            "mime_type": item.image.mime_type(),
            "prompt": item.prompt,
            "history_id": item.id,
            "editor": session.editor_name(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Edited image: {} ({}) via {}",
            path.display(),
            item.image.mime_type(),
            session.editor_name()
        );
    }

    Ok(())
}

fn failure_json(err: &LuminaError) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": err.to_string(),
        "message": err.user_message(),
    })
}

async fn run_shell(args: ShellArgs, model: ModelArg) -> anyhow::Result<()> {
    let session = Session::new(Arc::new(build_editor(model)?));
    if let Some(ref input) = args.input {
        session.select_image(input).await?;
    }

    eprintln!("Lumina shell via {} - type `help` for commands", session.editor_name());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Shell::new(&session).run(stdin, tokio::io::stdout()).await?;
    Ok(())
}

fn list_actions(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ActionInfo {
        name: &'static str,
        label: &'static str,
        mode: EditMode,
        prompt: String,
    }

    let actions: Vec<ActionInfo> = QuickAction::ALL
        .into_iter()
        .map(|a| ActionInfo {
            name: a.as_str(),
            label: a.label(),
            mode: a.mode(),
            prompt: a.prompt(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else {
        println!("Quick actions:\n");
        for a in &actions {
            println!("  {:<10} {} ({})", a.name, a.label, a.mode);
        }
    }

    Ok(())
}

async fn check(model: ModelArg, json_output: bool) -> anyhow::Result<()> {
    let editor = build_editor(model)?;
    let result = editor.health_check().await;

    if json_output {
        let out = serde_json::json!({
            "editor": editor.name(),
            "model": editor.model().as_str(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match &result {
            Ok(()) => println!("✓ {} ({}) is reachable", editor.name(), editor.model()),
            Err(e) => println!("✗ {} ({}): {}", editor.name(), editor.model(), e),
        }
    }

    result.map_err(Into::into)
}
