use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compmod::config::{
	CONFIG_FILE_NAME, INIT_TEMPLATE, MergedConfig, discover_configs, load_config_file,
	load_merged_config,
};
use compmod::document::DocumentSources;
use compmod::document::scan::absolute_path;
use compmod::engine::{ModificationFileMap, ModificationSet};
use compmod::watch::{ChangeNotifier, WatchSession};

#[derive(Parser)]
#[command(name = "compmod")]
#[command(
	author,
	version,
	about = "Override component template, script and style blocks with modification documents"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Use this config file instead of discovering .compmod.toml
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Enable debug logging (overridden by COMPMOD_LOG)
	#[arg(short, long, global = true)]
	verbose: bool,

	/// Create a template .compmod.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .compmod.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Run files through the modification engine
	Apply {
		/// Files to transform
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Identity to match filters against (defaults to the file's absolute path)
		#[arg(long)]
		id: Option<String>,

		/// Rewrite the files instead of printing the result
		#[arg(long)]
		in_place: bool,
	},
	/// List every compiled modification
	List,
	/// Watch override documents and report affected files
	Watch {
		/// Directory whose files are candidates (repeatable; adds to watch-roots)
		#[arg(long = "root", value_name = "DIR")]
		roots: Vec<PathBuf>,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display config files and the merged effective configuration
	Show,
	/// Check config files and override documents for errors
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing(verbose: bool) {
	let default = if verbose { "compmod=debug" } else { "compmod=info" };
	let filter = EnvFilter::try_from_env("COMPMOD_LOG").unwrap_or_else(|_| EnvFilter::new(default));

	// Logs go to stderr so stdout carries only command output
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	if cli.init {
		return handle_init(cli.force);
	}

	let config_path = cli.config.as_deref();

	match cli.command {
		Some(Commands::Apply {
			files,
			id,
			in_place,
		}) => handle_apply(config_path, &files, id.as_deref(), in_place),
		Some(Commands::List) => handle_list(config_path),
		Some(Commands::Watch { roots }) => handle_watch(config_path, roots),
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(config_path),
			ConfigAction::Validate => handle_config_validate(config_path),
		},
		// Unreachable with arg_required_else_help unless only global flags were given
		None => Ok(ExitCode::SUCCESS),
	}
}

fn load_config(config_path: Option<&Path>) -> Result<MergedConfig> {
	match config_path {
		Some(path) => load_config_file(path)
			.with_context(|| format!("Failed to load configuration: {}", path.display())),
		None => {
			let cwd = std::env::current_dir().context("Failed to get current directory")?;
			load_merged_config(&cwd).context("Failed to load configuration")
		}
	}
}

fn load_modifications(config: &MergedConfig) -> Result<ModificationSet> {
	let sources = DocumentSources::from_config(config).context("Invalid exclude pattern")?;
	ModificationSet::load(&sources).context("Failed to load override documents")
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{} already exists. Use --force to overwrite.", CONFIG_FILE_NAME);
	}

	std::fs::write(&config_path, INIT_TEMPLATE)
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {}", CONFIG_FILE_NAME);
	Ok(ExitCode::SUCCESS)
}

fn handle_apply(
	config_path: Option<&Path>,
	files: &[PathBuf],
	id: Option<&str>,
	in_place: bool,
) -> Result<ExitCode> {
	if id.is_some() && files.len() > 1 {
		anyhow::bail!("--id can only be used with a single file");
	}

	let config = load_config(config_path)?;
	let modifications = load_modifications(&config)?;
	let mut matched = ModificationFileMap::new();

	for file in files {
		let content = std::fs::read_to_string(file)
			.with_context(|| format!("Failed to read {}", file.display()))?;
		let identity = match id {
			Some(id) => id.to_string(),
			None => absolute_path(file).to_string_lossy().into_owned(),
		};

		let output = modifications.apply(&content, &identity, &mut matched);

		if in_place {
			if output != content {
				std::fs::write(file, &output)
					.with_context(|| format!("Failed to write {}", file.display()))?;
				println!("Modified {}", file.display());
			}
		} else {
			print!("{}", output);
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_list(config_path: Option<&Path>) -> Result<ExitCode> {
	let config = load_config(config_path)?;
	let modifications = load_modifications(&config)?;

	if modifications.is_empty() {
		println!("No modifications found.");
		return Ok(ExitCode::SUCCESS);
	}

	for (i, modification) in modifications.iter().enumerate() {
		println!("Modification {}:", i + 1);
		println!("    document: {}", modification.own_document_id().display());
		println!("    target: {}", modification.owner_filename());
		println!("    filter: {}", modification.filter());
		match modification.find() {
			Some(find) => println!("    find: {}", find),
			None => println!("    find: (none, inert)"),
		}
		println!("    replace: {:?}", modification.replace());
		println!();
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_watch(config_path: Option<&Path>, roots: Vec<PathBuf>) -> Result<ExitCode> {
	let config = load_config(config_path)?;
	let sources = DocumentSources::from_config(&config).context("Invalid exclude pattern")?;
	let notifier = ChangeNotifier::new(sources).context("Failed to load override documents")?;

	let mut watch_roots = config.watch_roots.clone();
	watch_roots.extend(roots);
	if watch_roots.is_empty() {
		watch_roots.push(std::env::current_dir().context("Failed to get current directory")?);
	}

	let session = WatchSession::new(notifier, &watch_roots);
	session
		.run(|file| println!("changed {}", file))
		.context("File watcher failed")?;

	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
	let configs = match config_path {
		Some(path) => vec![path.to_path_buf()],
		None => {
			let cwd = std::env::current_dir().context("Failed to get current directory")?;
			discover_configs(&cwd)
				.context("Failed to discover config files")?
				.into_iter()
				.map(|loaded| loaded.path)
				.collect()
		}
	};

	if configs.is_empty() {
		println!("No configuration files found.");
		return Ok(ExitCode::SUCCESS);
	}

	println!("Configuration files (in cascade order):");
	for path in &configs {
		println!("  {}", path.display());
	}
	println!();

	let merged = load_config(config_path)?;
	println!(
		"extensions: .{} -> .{}",
		merged.extensions.override_ext, merged.extensions.target
	);
	println!("dirs:");
	for dir in &merged.dirs {
		println!("  {}", dir.display());
	}
	println!("files:");
	for file in &merged.files {
		println!("  {}", file.display());
	}
	println!("exclude:");
	for exclude in &merged.exclude {
		println!("  {} (from {})", exclude.pattern, exclude.source.display());
	}
	println!("watch-roots:");
	for root in &merged.watch_roots {
		println!("  {}", root.display());
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(config_path: Option<&Path>) -> Result<ExitCode> {
	let config = match load_config(config_path) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			return Ok(ExitCode::FAILURE);
		}
	};

	let result = DocumentSources::from_config(&config).and_then(|sources| {
		let documents = sources.list_documents()?;
		let modifications = compmod::rules::compile_documents(&documents)?;
		Ok((documents.len(), modifications.len()))
	});

	match result {
		Ok((0, _)) => {
			println!("No override documents found.");
			Ok(ExitCode::SUCCESS)
		}
		Ok((documents, modifications)) => {
			println!(
				"All override documents are valid: {} documents, {} modifications",
				documents, modifications
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:#}", anyhow::Error::from(e));
			Ok(ExitCode::FAILURE)
		}
	}
}
