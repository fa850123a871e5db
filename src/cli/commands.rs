use blockpress::embed::Provider;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[cfg(feature = "unstable-dynamic")]
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate, ValueCompleter};

#[derive(Parser, Debug)]
#[command(name = "blockpress")]
#[command(version)]
#[command(about = "Convert, project, sanitize and search CMS rich text")]
#[command(
    long_about = "blockpress - tools for structured CMS content.\n\n\
    Converts legacy plain text into block trees, flattens block trees into plain text,\n\
    rebuilds pasted video embeds from a safe attribute whitelist, and searches rendered\n\
    documents with numbered, navigable matches.\n\n\
    Examples:\n  \
    blockpress convert notes.txt             # Legacy text to block JSON\n  \
    blockpress plain --preview body.json     # Short plain-text preview\n  \
    blockpress embed snippet.html            # Sanitized embed as JSON\n  \
    blockpress search 'flood' body.json      # Highlighted matches\n  \
    blockpress normalize --in-place rec.json # Normalize rich text fields"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log output (-v debug, -vv trace)
    ///
    /// Overrides RUST_LOG and the [log] level from the config file.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from FILE instead of the default location
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Convert legacy plain text into a block tree
    ///
    /// Blank lines become empty paragraphs, runs of "- ", "* " or "• " lines become
    /// bulleted lists and "1." or "1)" lines become numbered lists. Prints the
    /// block JSON, or null when the input has no content.
    Convert {
        /// Text file to convert, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,

        /// Print compact JSON on one line
        #[arg(long = "compact")]
        compact: bool,
    },

    /// Flatten block JSON (or legacy text) into plain text
    Plain {
        /// Block JSON or text file, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,

        /// Print nothing; exit with status 1 when there is no content
        #[arg(long = "check", conflicts_with = "preview")]
        check: bool,

        /// Shorten to CHARS characters at a word break
        ///
        /// Without a value the [content] preview_chars setting is used.
        #[arg(long = "preview", value_name = "CHARS", num_args = 0..=1)]
        preview: Option<Option<usize>>,
    },

    /// Rebuild a pasted video embed from its first iframe
    ///
    /// Only https sources (http and protocol-relative ones are upgraded) and a fixed
    /// set of attributes survive. Exits with status 1 when nothing safe remains.
    Embed {
        /// HTML snippet file, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,

        /// Provider to report instead of detecting it from the source host
        #[arg(long = "provider", value_name = "PROVIDER")]
        provider: Option<Provider>,

        /// Player title to report instead of the iframe's own
        #[arg(long = "title", value_name = "TITLE")]
        title: Option<String>,

        /// Aspect ratio: 16:9, 4:3, 1:1 or 9:16
        #[arg(long = "aspect-ratio", value_name = "RATIO")]
        aspect_ratio: Option<String>,
    },

    /// Search a document and show numbered matches
    ///
    /// Matching is case-insensitive and whitespace-tolerant, and works across
    /// bold or italic boundaries inside a word.
    Search {
        /// Text to search for
        term: String,

        /// Block JSON or text file, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,

        /// Make match N (1-based) the active one; wraps around
        #[arg(long = "active", value_name = "N")]
        active: Option<usize>,

        /// Output format
        ///
        ///   plain - Rendered document with match markers (default)
        ///   json  - Match list with anchors
        #[arg(short = 'o', long = "output", default_value = "plain")]
        output: OutputFormat,
    },

    /// Convert rich text fields of a JSON document to block trees
    Normalize {
        /// Document, or list of documents, as JSON
        #[arg(add = content_file_completer())]
        file: PathBuf,

        /// Field to normalize (repeatable); defaults to [content] normalize_fields
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,

        /// Rewrite FILE instead of printing the result
        #[arg(long = "in-place")]
        in_place: bool,
    },

    /// Map a record document to its view model
    Record {
        /// Record JSON, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,
    },

    /// Map a story document to its view model
    Story {
        /// Story JSON, or '-' for stdin
        #[arg(add = content_file_completer())]
        file: Option<PathBuf>,
    },

    /// Fetch one document from a directory store and normalize it
    ///
    /// Documents are read from ROOT/TYPE/*.json.
    Fetch {
        /// Store root directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,

        /// Content type, the sub-directory name (e.g. records)
        content_type: String,

        /// Slug of the document, or its id with --by-id
        key: String,

        /// Match on documentId/id instead of slug
        #[arg(long = "by-id")]
        by_id: bool,

        /// Map the document to a view model after fetching
        #[arg(long = "map", value_name = "KIND")]
        map: Option<DocumentKind>,
    },

    /// Show or create the configuration file
    Config {
        /// Print the config file location
        #[arg(long = "path")]
        path: bool,

        /// Write the current settings to the config file
        #[arg(long = "init", conflicts_with = "path")]
        init: bool,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum DocumentKind {
    Record,
    Story,
}

#[cfg(feature = "unstable-dynamic")]
fn content_file_completer() -> ArgValueCompleter {
    use std::ffi::OsStr;
    use std::path::Path;

    const EXTENSIONS: &[&str] = &["json", "txt", "html", "htm"];

    struct ContentFileCompleter;

    impl ValueCompleter for ContentFileCompleter {
        fn complete(&self, current: &OsStr) -> Vec<CompletionCandidate> {
            // e.g., "../docs/rec" -> directory="../docs", prefix="rec"
            let input_str = current.to_string_lossy();
            let input_path = Path::new(input_str.as_ref());

            let (search_dir, prefix) = if input_str.is_empty() {
                (Path::new("."), String::new())
            } else if input_str.ends_with('/') || input_str.ends_with('\\') {
                (input_path, String::new())
            } else {
                // parent() is Some("") for bare file names
                let parent = input_path.parent().unwrap_or(Path::new("."));
                let dir = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                let prefix = input_path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                (dir, prefix)
            };

            let Ok(entries) = std::fs::read_dir(search_dir) else {
                return vec![];
            };

            entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let path = entry.path();
                    let file_name = path.file_name()?.to_string_lossy().to_string();

                    if !prefix.is_empty()
                        && !file_name.to_lowercase().starts_with(&prefix.to_lowercase())
                    {
                        return None;
                    }

                    let completion_value = if search_dir == Path::new(".") {
                        file_name
                    } else {
                        search_dir.join(&file_name).to_string_lossy().to_string()
                    };

                    if path.is_dir() {
                        let mut dir_completion = completion_value;
                        if !dir_completion.ends_with('/') {
                            dir_completion.push('/');
                        }
                        return Some(
                            CompletionCandidate::new(dir_completion).help(Some("directory".into())),
                        );
                    }

                    let ext = path.extension()?.to_string_lossy().to_lowercase();
                    EXTENSIONS
                        .contains(&ext.as_str())
                        .then(|| CompletionCandidate::new(completion_value))
                })
                .collect()
        }
    }

    ArgValueCompleter::new(ContentFileCompleter)
}

#[cfg(not(feature = "unstable-dynamic"))]
fn content_file_completer() -> clap::builder::ValueHint {
    clap::ValueHint::FilePath
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "blockpress",
            "search",
            "cat sat",
            "doc.json",
            "--active",
            "2",
            "-o",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Search {
                term,
                file,
                active,
                output,
            } => {
                assert_eq!(term, "cat sat");
                assert_eq!(file, Some(PathBuf::from("doc.json")));
                assert_eq!(active, Some(2));
                assert!(matches!(output, OutputFormat::Json));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_preview_with_and_without_value() {
        let cli = Cli::try_parse_from(["blockpress", "plain", "--preview"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Plain {
                preview: Some(None),
                ..
            }
        ));

        let cli = Cli::try_parse_from(["blockpress", "-v", "plain", "--preview", "40", "x.json"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Command::Plain {
                preview: Some(Some(40)),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_embed_provider() {
        let cli = Cli::try_parse_from(["blockpress", "embed", "--provider", "YouTube", "-"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Embed {
                provider: Some(Provider::Youtube),
                ..
            }
        ));
    }
}
