use clap::{Parser, Subcommand};
use lectern::{build, config, convert, output, pdf, scan};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup — trivial, called exactly once
        Box::leak(format!("{}+{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Incremental publisher for lecture notes")]
#[command(long_about = "\
Incremental publisher for lecture notes

Converts directories of .docx and .pdf lecture documents into a browsable
HTML site with downloadable originals, print-quality PDF renditions, and a
searchable index. Only documents whose sources changed since the last run
are rebuilt.

Source layout, per group listed in config.json:

  sources/fyzika/
  ├── Přednáška 1.docx             # converted to HTML + PDF rendition
  ├── Přednáška 2.docx
  ├── Přednáška 2.pdf              # published alongside as the original PDF
  └── Skripta.pdf                  # no .docx sibling → published as-is

Next to config.json the tool expects the pandoc page templates
(template.html, template-tul.html) and the remove-toc.lua filter; an
optional fonts/ directory is copied into the site.

External tools: pandoc on PATH for conversion, a Chrome/Chromium binary
for PDF renditions. A missing Chrome only skips renditions; a failing
pandoc aborts the build.

Run 'lectern gen-config' to print a starter config.json.")]
#[command(version = version_string())]
struct Cli {
    /// Path to the site config
    #[arg(long, default_value = "config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Rebuild everything, ignoring timestamps
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site incrementally
    Build(BuildArgs),
    /// Validate the config and list discovered documents without building
    Check,
    /// Print a starter config.json
    GenConfig,
}

/// Templates, the Lua filter, and fonts live next to the config file.
fn assets_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => {
            let site_config = config::load_config(&cli.config)?;
            let assets = assets_dir(&cli.config);
            let converter = convert::PandocConverter::new(assets.clone());
            let renderer = pdf::ChromeRenderer::new();

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = build::build(
                &site_config,
                &assets,
                &converter,
                &renderer,
                args.force,
                Some(tx),
            );
            printer.join().expect("printer thread panicked");
            let stats = result?;
            println!("\n{stats}");
        }
        Command::Check => {
            let site_config = config::load_config(&cli.config)?;
            println!(
                "Config OK: {} source groups, output {}",
                site_config.sources.len(),
                site_config.output_dir.display()
            );
            for source in &site_config.sources {
                if !source.update {
                    println!("\n{} (frozen, served from manifest)", source.name);
                    continue;
                }
                if !source.path.exists() {
                    println!(
                        "\n{} — source directory {} not found",
                        source.name,
                        source.path.display()
                    );
                    continue;
                }
                let documents = scan::scan_group(&source.path)?;
                println!("\n{} ({})", source.name, source.path.display());
                for doc in &documents {
                    println!("    {} ({})", doc.base_name, doc.kind().label());
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_json());
        }
    }

    Ok(())
}
