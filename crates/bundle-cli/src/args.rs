use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "bundle", version, about = "Offline distribution bundle engine")]
pub struct Cli {
    /// Emit JSON on stdout instead of colorized prose.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an empty, signed bundle skeleton.
    Create {
        /// Human-readable bundle name.
        name: String,
        #[arg(long)]
        version: String,
        /// One of templates|modules|mixed.
        #[arg(long = "type")]
        bundle_type: String,
        #[arg(long)]
        out: PathBuf,
    },

    /// Stage a content item into an existing bundle and re-seal it.
    Add {
        bundle: PathBuf,
        #[arg(long)]
        file: PathBuf,
        /// One of template|module|config|resource.
        #[arg(long = "type")]
        content_type: String,
        #[arg(long)]
        id: String,
    },

    /// Re-sign an existing bundle with its signing key.
    Sign {
        bundle: PathBuf,
        #[arg(long)]
        key: PathBuf,
    },

    /// Check a bundle's signature, checksums, and structure.
    Verify {
        bundle: PathBuf,
        #[arg(long)]
        pubkey: PathBuf,
    },

    /// Produce a distributable archive from a bundle directory.
    Export {
        bundle: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// One of identity|gzip|zstd.
        #[arg(long)]
        compression: Option<String>,
        /// One of aes-256-gcm|chacha20-poly1305. Reads BUNDLE_PASSWORD from
        /// the environment for the encryption password.
        #[arg(long)]
        encrypt: Option<String>,
    },

    /// Run the staged importer against a target directory.
    Import {
        archive: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(long)]
        pubkey: PathBuf,
        #[arg(long)]
        backup: Option<PathBuf>,
        #[arg(long)]
        force: bool,
        /// One of basic|standard|strict.
        #[arg(long, default_value = "standard")]
        validation_level: String,
        /// Required to import an archive produced with `export --encrypt`.
        /// Read from the BUNDLE_PASSWORD environment variable, never from argv.
        #[arg(long)]
        encrypted: bool,
    },

    /// Generate a delta bundle between two bundle directories.
    Delta {
        #[arg(long)]
        from: PathBuf,
        #[arg(long)]
        to: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Emit a diff report between a local and a remote bundle manifest.
    Diff {
        #[arg(long)]
        local: PathBuf,
        #[arg(long)]
        remote: PathBuf,
        /// One of text|json|markdown.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run local environment and key-material self-checks.
    Doctor {
        #[arg(long)]
        store_root: Option<PathBuf>,
    },
}
