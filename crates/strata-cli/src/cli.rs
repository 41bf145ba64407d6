use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata — content-addressed layered-document containers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file with command defaults (falls back to ./strata.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a partial layer spec to a container
    Patch(PatchArgs),
    /// Regenerate the layer-info projection of a container
    Layers(LayersArgs),
    /// Check container and blob integrity
    Verify(VerifyArgs),
    /// Show container metadata
    Show(ShowArgs),
}

#[derive(Args)]
pub struct PatchArgs {
    pub container: PathBuf,
    /// JSON file holding the partial spec
    pub spec: PathBuf,
    /// Where to write the refreshed layer info (default: the sidecar)
    #[arg(short, long)]
    pub layers: Option<PathBuf>,
}

#[derive(Args)]
pub struct LayersArgs {
    pub container: PathBuf,
    /// Where to write the layer info (default: the sidecar)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub container: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    pub container: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_patch() {
        let cli = Cli::try_parse_from(["strata", "patch", "doc.json", "spec.json"]).unwrap();
        if let Command::Patch(args) = cli.command {
            assert_eq!(args.container, PathBuf::from("doc.json"));
            assert_eq!(args.spec, PathBuf::from("spec.json"));
            assert!(args.layers.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_patch_with_layers_path() {
        let cli = Cli::try_parse_from([
            "strata", "patch", "doc.json", "spec.json", "-l", "out.json",
        ])
        .unwrap();
        if let Command::Patch(args) = cli.command {
            assert_eq!(args.layers, Some(PathBuf::from("out.json")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_layers() {
        let cli = Cli::try_parse_from(["strata", "layers", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::Layers(_)));
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["strata", "verify", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["strata", "show", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::Show(_)));
    }

    #[test]
    fn parse_verbose_and_config() {
        let cli =
            Cli::try_parse_from(["strata", "--verbose", "--config", "x.toml", "show", "d.json"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
