//! # blockpress
//!
//! Command-line tools for structured CMS rich text.
//!
//! ## Usage
//!
//! Convert legacy text to block JSON:
//! ```sh
//! blockpress convert notes.txt
//! ```
//!
//! Search a document and highlight the second match:
//! ```sh
//! blockpress search --active 2 flood body.json
//! ```
//!
//! Sanitize a pasted embed:
//! ```sh
//! pbpaste | blockpress embed
//! ```

mod cli;

use blockpress::blocks::BlockTree;
use blockpress::content::{
    ContentSource, DirectorySource, Filter, RecordDocument, StoryDocument,
    normalize_document, normalize_documents,
};
use blockpress::convert::{ensure_blocks_json, text_to_blocks};
use blockpress::embed::{EmbedDeclaration, Provider, sanitize};
use blockpress::input::read_input;
use blockpress::plain::{has_content, preview, to_plain_text};
use blockpress::render::{BlockRenderer, Highlights, PlainRenderer};
use blockpress::search::{SearchEngine, SearchText};
use blockpress::Config;
use clap::Parser as ClapParser;
use cli::{Cli, Command, DocumentKind, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Handle dynamic shell completions
    #[cfg(feature = "unstable-dynamic")]
    clap_complete::CompleteEnv::with_factory(|| {
        use clap::CommandFactory;
        Cli::command()
    })
    .complete();

    let args = Cli::parse();

    let config = match args.config.as_deref() {
        Some(path) => Config::load_from(path)
            .ok_or_else(|| eyre!("Could not load config from {}", path.display()))?,
        None => Config::load(),
    };

    init_tracing(&config, args.verbose);

    match args.command {
        Command::Convert { file, compact } => convert(file.as_deref(), compact),
        Command::Plain {
            file,
            check,
            preview,
        } => plain(&config, file.as_deref(), check, preview),
        Command::Embed {
            file,
            provider,
            title,
            aspect_ratio,
        } => embed(&config, file.as_deref(), provider, title, aspect_ratio),
        Command::Search {
            term,
            file,
            active,
            output,
        } => search(&config, &term, file.as_deref(), active, &output),
        Command::Normalize {
            file,
            fields,
            in_place,
        } => normalize(&config, &file, fields, in_place),
        Command::Record { file } => {
            let doc: RecordDocument = read_document(file.as_deref())?;
            print_json(&config.content_mapper()?.map_record(&doc))
        }
        Command::Story { file } => {
            let doc: StoryDocument = read_document(file.as_deref())?;
            print_json(&config.content_mapper()?.map_story(&doc))
        }
        Command::Fetch {
            root,
            content_type,
            key,
            by_id,
            map,
        } => fetch(&config, root, &content_type, key, by_id, map),
        Command::Config { path, init } => show_config(&config, path, init),
    }
}

/// RUST_LOG wins over the config file; -v wins over both.
fn init_tracing(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Block JSON, a JSON string of legacy text, or raw legacy text.
fn parse_blocks(content: &str) -> Option<BlockTree> {
    match serde_json::from_str::<Value>(content.trim()) {
        Ok(value @ (Value::Array(_) | Value::String(_) | Value::Null)) => {
            ensure_blocks_json(&value)
        }
        _ => text_to_blocks(Some(content)),
    }
}

/// A single document, unwrapping a `{"data": {...}}` response.
fn read_document<T: serde::de::DeserializeOwned>(file: Option<&Path>) -> Result<T> {
    let content = read_input(file)?;
    let mut value: Value = serde_json::from_str(&content).wrap_err("Input is not valid JSON")?;
    if value.get("data").is_some_and(Value::is_object) {
        value = value["data"].take();
    }
    serde_json::from_value(value).wrap_err("Input is not a valid document")
}

fn convert(file: Option<&Path>, compact: bool) -> Result<()> {
    let content = read_input(file)?;
    let json = text_to_blocks(Some(&content))
        .map(|tree| tree.to_json())
        .unwrap_or(Value::Null);

    if compact {
        println!("{}", serde_json::to_string(&json)?);
        Ok(())
    } else {
        print_json(&json)
    }
}

fn plain(
    config: &Config,
    file: Option<&Path>,
    check: bool,
    preview_chars: Option<Option<usize>>,
) -> Result<()> {
    let content = read_input(file)?;
    let tree = parse_blocks(&content);

    if check {
        if !has_content(tree.as_ref()) {
            process::exit(1);
        }
        return Ok(());
    }

    let text = match preview_chars {
        Some(chars) => preview(
            tree.as_ref(),
            chars.unwrap_or(config.content.preview_chars),
        ),
        None => to_plain_text(tree.as_ref()),
    };
    println!("{}", text);
    Ok(())
}

fn embed(
    config: &Config,
    file: Option<&Path>,
    provider: Option<Provider>,
    title: Option<String>,
    aspect_ratio: Option<String>,
) -> Result<()> {
    let content = read_input(file)?;
    let declared = EmbedDeclaration {
        provider,
        title,
        aspect_ratio: aspect_ratio.or_else(|| Some(config.default_aspect_ratio().to_string())),
    };

    match sanitize(Some(&content), &declared) {
        Some(embed) => print_json(&embed),
        None => {
            eprintln!("Embed rejected: no iframe with a safe https source found");
            process::exit(1);
        }
    }
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    status: String,
    active: Option<usize>,
    matches: &'a [blockpress::search::SearchMatch],
}

fn search(
    config: &Config,
    term: &str,
    file: Option<&Path>,
    active: Option<usize>,
    output: &OutputFormat,
) -> Result<()> {
    let content = read_input(file)?;
    let tree = parse_blocks(&content).unwrap_or_default();

    let mut engine = SearchEngine::new(SearchText::from_tree(&tree));
    engine.on_active_change(|m| {
        if let Some(m) = m {
            tracing::debug!(index = m.index, start = m.anchor.range.start, "active match");
        }
    });
    engine.set_query(term);
    if let Some(n) = active {
        engine.select(n.saturating_sub(1));
    }

    match output {
        OutputFormat::Json => print_json(&SearchReport {
            query: engine.query(),
            status: engine.status().to_string(),
            active: engine.active_index(),
            matches: engine.matches(),
        }),
        OutputFormat::Plain => {
            let renderer = PlainRenderer::new(config.search.clone());
            let highlights = Highlights::from_engine(&engine);
            println!("{}", renderer.render(&tree, Some(&highlights)));
            println!();
            println!("Matches: {}", engine.status());
            Ok(())
        }
    }
}

fn normalize_fields(config: &Config, fields: Vec<String>) -> Vec<String> {
    if fields.is_empty() {
        config.content.normalize_fields.clone()
    } else {
        fields
    }
}

fn normalize(config: &Config, file: &Path, fields: Vec<String>, in_place: bool) -> Result<()> {
    let content = read_input(Some(file))?;
    let mut value: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not valid JSON", file.display()))?;

    let fields = normalize_fields(config, fields);
    let changed = normalize_documents(&mut value, &fields);
    tracing::info!(changed, fields = ?fields, "normalized");

    let output = serde_json::to_string_pretty(&value)?;
    if !in_place {
        println!("{}", output);
        return Ok(());
    }

    if file.as_os_str() == "-" {
        return Err(eyre!("--in-place needs a file, not stdin"));
    }

    // Write next to the target and rename over it
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    writeln!(tmp, "{}", output)?;
    tmp.persist(file)
        .wrap_err_with(|| format!("Failed to replace {}", file.display()))?;
    Ok(())
}

fn fetch(
    config: &Config,
    root: PathBuf,
    content_type: &str,
    key: String,
    by_id: bool,
    map: Option<DocumentKind>,
) -> Result<()> {
    let source = DirectorySource::new(root);
    let filter = if by_id {
        Filter::Id(key.clone())
    } else {
        Filter::Slug(key.clone())
    };

    let Some(mut doc) = source.fetch_document(content_type, &filter)? else {
        eprintln!("No {} document matching '{}'", content_type, key);
        process::exit(1);
    };

    let fields = normalize_fields(config, Vec::new());
    normalize_document(&mut doc, &fields);

    match map {
        None => print_json(&doc),
        Some(kind) => {
            let mapper = config.content_mapper()?;
            let value = Value::Object(doc);
            match kind {
                DocumentKind::Record => {
                    print_json(&mapper.map_record(&serde_json::from_value(value)?))
                }
                DocumentKind::Story => {
                    print_json(&mapper.map_story(&serde_json::from_value(value)?))
                }
            }
        }
    }
}

fn show_config(config: &Config, path: bool, init: bool) -> Result<()> {
    if path || init {
        let location = Config::config_path()
            .ok_or_else(|| eyre!("Could not determine config directory"))?;
        if init {
            config.save().map_err(|e| eyre!("Failed to save config: {}", e))?;
            eprintln!("Wrote {}", location.display());
        } else {
            println!("{}", location.display());
        }
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
