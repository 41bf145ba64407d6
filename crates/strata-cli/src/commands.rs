use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use strata_blob::{BlobRef, BlobStore, FlatRasterCodec};
use strata_canon::canonical_digest_json;
use strata_doc::{layers_sidecar_path, project_layers, Container, LayerInfo};
use strata_patch::{apply_patch, PartialSpec};

use crate::cli::*;
use crate::config::Config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Command::Patch(args) => cmd_patch(args, &config),
        Command::Layers(args) => cmd_layers(args, &config),
        Command::Verify(args) => cmd_verify(args),
        Command::Show(args) => cmd_show(args),
    }
}

fn cmd_patch(args: PatchArgs, config: &Config) -> anyhow::Result<()> {
    let mut container = Container::load(&args.container)
        .with_context(|| format!("loading {}", args.container.display()))?;
    let text = fs::read_to_string(&args.spec)
        .with_context(|| format!("reading spec {}", args.spec.display()))?;
    let spec: PartialSpec = serde_json::from_str(&text)
        .with_context(|| format!("parsing spec {}", args.spec.display()))?;

    let layers = apply_patch(&mut container, &spec)?;
    container.save(&args.container)?;

    let layers_path = resolve_output(args.layers, config, layers_sidecar_path(&args.container));
    write_layers(&layers, &layers_path)?;

    println!(
        "{} Patched {}",
        "✓".green().bold(),
        args.container.display().to_string().bold()
    );
    println!(
        "  Digest: {}",
        container.meta.canonical_digest.short_hex().yellow()
    );
    println!("  Layers: {}", layers_path.display());
    Ok(())
}

fn cmd_layers(args: LayersArgs, config: &Config) -> anyhow::Result<()> {
    let container = Container::load(&args.container)
        .with_context(|| format!("loading {}", args.container.display()))?;
    let assets_dir = config
        .assets_dir_name
        .as_deref()
        .unwrap_or(&container.meta.assets_dir);
    let layers = project_layers(&container.tree, assets_dir);

    let output = resolve_output(args.output, config, layers_sidecar_path(&args.container));
    write_layers(&layers, &output)?;

    println!(
        "{} Wrote {} top-level layer(s) to {}",
        "✓".green().bold(),
        layers.len().to_string().bold(),
        output.display()
    );
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> anyhow::Result<()> {
    let container = Container::load(&args.container)
        .with_context(|| format!("loading {}", args.container.display()))?;

    let computed = canonical_digest_json(&container.tree)?;
    if computed != container.meta.canonical_digest {
        println!(
            "{} Canonical digest mismatch: recorded {}, computed {}",
            "✗".red().bold(),
            container.meta.canonical_digest.short_hex().yellow(),
            computed.short_hex().yellow()
        );
        anyhow::bail!("container {} failed verification", args.container.display());
    }
    println!("  Canonical digest: {}", "valid".green());

    let store = BlobStore::new(
        container.assets_dir_abs(&args.container),
        Arc::new(FlatRasterCodec),
    )?;
    store.hydrate(&container.tree)?;
    println!(
        "  Blobs: {} referenced, all {}",
        count_blob_refs(&container.tree).to_string().bold(),
        "verified".green()
    );
    println!("{} Container integrity verified", "✓".green().bold());
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let container = Container::load(&args.container)
        .with_context(|| format!("loading {}", args.container.display()))?;
    let meta = &container.meta;

    println!("Container {}", args.container.display().to_string().bold());
    println!("  Tool: {} {}", meta.tool.cyan(), meta.version);
    println!("  Created: {}", meta.created_at.to_rfc3339());
    if let Some(name) = &meta.input_file_name {
        println!("  Source: {}", name);
    }
    if let Some(size) = meta.input_size {
        println!("  Source size: {} bytes", size);
    }
    println!("  Assets: {}", meta.assets_dir);
    println!("  Digest: {}", meta.canonical_digest.to_hex().yellow());
    let layers = project_layers(&container.tree, &meta.assets_dir);
    println!(
        "  Layers: {} top-level, {} total, {} blob(s)",
        layers.len().to_string().bold(),
        count_layers(&layers).to_string().bold(),
        count_blob_refs(&container.tree).to_string().bold()
    );
    Ok(())
}

fn resolve_output(explicit: Option<PathBuf>, config: &Config, default: PathBuf) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match (&config.output_dir, default.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => default,
    }
}

fn write_layers(layers: &[LayerInfo], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(layers)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn count_layers(layers: &[LayerInfo]) -> usize {
    layers
        .iter()
        .map(|l| 1 + l.children.as_deref().map_or(0, count_layers))
        .sum()
}

fn count_blob_refs(tree: &serde_json::Value) -> usize {
    match tree {
        serde_json::Value::Array(items) => items.iter().map(count_blob_refs).sum(),
        serde_json::Value::Object(map) => {
            let own = usize::from(matches!(BlobRef::detect(map), Some(Ok(_))));
            own + map.values().map(count_blob_refs).sum::<usize>()
        }
        _ => 0,
    }
}
