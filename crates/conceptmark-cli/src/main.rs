//! conceptmark — Biomedical concept annotation renderer.
//! Entry point for the command-line binary.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conceptmark_annotate::details::occurrence_count;
use conceptmark_annotate::{
    annotate, annotate_publication, concept_details, concept_entries, ConceptSummary,
    HighlightControls, LinkBuilder, SemanticGroupCatalog,
};
use conceptmark_common::{AnnotationResult, Config, EntityRecord, RenderConfig};

#[derive(Parser, Debug)]
#[command(name = "conceptmark", about = "Render biomedical concept annotations as highlighted HTML", version)]
struct Cli {
    /// Configuration file (defaults to ./conceptmark.toml when present)
    #[arg(long, global = true, value_name = "FILE", env = "CONCEPTMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Write output here instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the annotated text, or publication title and abstract, as HTML
    Render {
        /// Annotation result JSON, plain text or publication (`-` for stdin)
        input: PathBuf,

        /// Emit bare markup without the container element
        #[arg(long)]
        no_container: bool,
    },
    /// Concept tree, group counts and highlight controls as JSON
    Summary {
        input: PathBuf,

        #[arg(long)]
        pretty: bool,
    },
    /// Concept groups and external references for one annotated term
    Details {
        input: PathBuf,
        term: String,
    },
    /// List the semantic groups in use
    Groups,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("conceptmark=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default()?,
    };
    let catalog = SemanticGroupCatalog::from_config(&config.groups)?;

    let output = match cli.command {
        Command::Render { input, no_container } => {
            let markup = match read_result(&input)? {
                AnnotationResult::Text(doc) => annotate(&catalog, &doc)?.markup,
                AnnotationResult::Publication(publication) => {
                    let result = annotate_publication(&catalog, &publication)?;
                    publication_markup(&result.title_markup, result.abstract_markup.as_deref())
                }
            };
            if no_container {
                markup
            } else {
                wrap_markup(&config.render, &markup)
            }
        }
        Command::Summary { input, pretty } => {
            let (pmid, summary): (Option<String>, ConceptSummary) = match read_result(&input)? {
                AnnotationResult::Text(doc) => (None, annotate(&catalog, &doc)?.summary),
                AnnotationResult::Publication(publication) => {
                    let result = annotate_publication(&catalog, &publication)?;
                    (Some(result.pmid), result.summary)
                }
            };

            let mut controls = HighlightControls::new(&catalog);
            controls.update_visible(&summary.group_counts, summary.has_ambiguous_concepts);

            let report = json!({
                "pmid": pmid,
                "summary": summary,
                "controls": {
                    "toggles": controls.toggles(),
                    "toolbar_visible": controls.toolbar_visible(),
                    "body_classes": controls.body_classes(),
                },
            });
            if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            }
        }
        Command::Details { input, term } => {
            let doc = read_result(&input)?;
            let records = doc.records()?;
            let ids = term_ids(&records, &term);
            if ids.is_empty() {
                bail!("term {term:?} is not annotated in {}", input.display());
            }

            let links = LinkBuilder::from_config(&config.links);
            let positions = conceptmark_annotate::term_positions(&records);
            let details = json!({
                "term": term,
                "occurrences": occurrence_count(&positions, &term),
                "groups": concept_entries(&catalog, &ids)?,
                "details": concept_details(&catalog, &ids, doc.ids(), &links)?,
            });
            serde_json::to_string_pretty(&details)?
        }
        Command::Groups => catalog
            .groups()
            .iter()
            .map(|g| format!("{}\t{}\t{}\t{}\n", g.id, g.name, g.class, g.color))
            .collect(),
    };

    emit(cli.output.as_deref(), &output)
}

/// Read an annotation result from a file, or stdin for `-`.
fn read_result(input: &Path) -> Result<AnnotationResult> {
    let json = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read annotation result from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?
    };
    let result = AnnotationResult::from_json(&json)
        .with_context(|| format!("Invalid annotation result in {}", input.display()))?;
    match &result {
        AnnotationResult::Text(doc) => {
            info!("Loaded text result: {} mentions", doc.entities.len())
        }
        AnnotationResult::Publication(publication) => {
            info!("Loaded publication {}: {} mentions", publication.pmid, publication.entities().len())
        }
    }
    Ok(result)
}

/// Title heading followed by the abstract paragraph, when there is one.
fn publication_markup(title: &str, abstract_markup: Option<&str>) -> String {
    let mut markup = format!("<h1 class=\"title\">{title}</h1>");
    if let Some(text) = abstract_markup {
        markup.push_str(&format!("<p class=\"abstract\">{text}</p>"));
    }
    markup
}

fn wrap_markup(render: &RenderConfig, markup: &str) -> String {
    if !render.wrap_in_container {
        return markup.to_string();
    }
    format!(
        "<div class=\"{}\">{}</div>",
        html_escape::encode_double_quoted_attribute(&render.container_class),
        markup
    )
}

/// Distinct concept ids of every mention of `term`, ignoring case.
fn term_ids(records: &[EntityRecord], term: &str) -> Vec<String> {
    let wanted = term.to_lowercase();
    let mut ids: Vec<String> = Vec::new();
    for record in records.iter().filter(|r| r.term.to_lowercase() == wanted) {
        for id in &record.ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}

fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
