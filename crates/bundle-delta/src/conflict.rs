//! Conflict resolution (C10), per spec §4.10: a closed vocabulary of
//! conflict kinds and resolution strategies, with a fixed default mapping
//! and an optional interactive callback for the `prompt` strategy.

use std::path::Path;

use bundle_core::ArtifactPath;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    FileExists,
    Content,
    Version,
    Dependency,
    Permission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    Skip,
    Overwrite,
    Merge,
    Rename,
    KeepBoth,
    Prompt,
}

impl ConflictKind {
    /// The strategy used when no interactive prompt is available.
    fn default_strategy(self) -> ResolutionStrategy {
        match self {
            ConflictKind::FileExists => ResolutionStrategy::Overwrite,
            ConflictKind::Content => ResolutionStrategy::Overwrite,
            ConflictKind::Version => ResolutionStrategy::Prompt,
            ConflictKind::Dependency => ResolutionStrategy::Prompt,
            ConflictKind::Permission => ResolutionStrategy::Overwrite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub path: ArtifactPath,
    pub detail: String,
}

#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Resolution {
    Skip,
    Overwrite,
    /// `<<<<<<< SOURCE` / `=======` / `>>>>>>> TARGET` delimited text.
    Merged(String),
    Rename(ArtifactPath),
    KeepBoth { original: ArtifactPath, incoming: ArtifactPath },
}

pub type PromptCallback<'a> = dyn Fn(&Conflict) -> ResolutionStrategy + 'a;

pub struct ConflictResolver<'a> {
    prompt: Option<Box<PromptCallback<'a>>>,
}

impl<'a> Default for ConflictResolver<'a> {
    fn default() -> Self {
        Self { prompt: None }
    }
}

impl<'a> ConflictResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a callback invoked for conflicts whose resolved strategy is
    /// `Prompt`. Without one, `prompt` falls back to the kind's default.
    pub fn with_prompt(callback: impl Fn(&Conflict) -> ResolutionStrategy + 'a) -> Self {
        Self { prompt: Some(Box::new(callback)) }
    }

    fn strategy_for(&self, conflict: &Conflict) -> ResolutionStrategy {
        let strategy = conflict.kind.default_strategy();
        if strategy == ResolutionStrategy::Prompt {
            match &self.prompt {
                Some(cb) => cb(conflict),
                None => strategy,
            }
        } else {
            strategy
        }
    }

    /// Resolve one conflict against the text found at `source_text`/
    /// `target_text` (only consulted when the resolved strategy is `Merge`).
    /// `now` is the caller's `Context::now()`; it backs the time-stamp
    /// suffix the `rename` strategy writes (spec §4.10).
    pub fn resolve(
        &self,
        conflict: &Conflict,
        source_text: Option<&str>,
        target_text: Option<&str>,
        now: OffsetDateTime,
    ) -> Resolution {
        match self.strategy_for(conflict) {
            ResolutionStrategy::Skip => Resolution::Skip,
            ResolutionStrategy::Overwrite => Resolution::Overwrite,
            ResolutionStrategy::Rename => Resolution::Rename(timestamped_path(&conflict.path, now)),
            ResolutionStrategy::KeepBoth => Resolution::KeepBoth {
                original: conflict.path.clone(),
                incoming: new_infix_path(&conflict.path),
            },
            ResolutionStrategy::Prompt => Resolution::Overwrite,
            ResolutionStrategy::Merge => match (source_text, target_text) {
                (Some(source), Some(target)) => Resolution::Merged(merge_text(source, target)),
                // Binary content (or missing text) can't be diff-merged; the
                // caller falls back to overwrite.
                _ => Resolution::Overwrite,
            },
        }
    }
}

fn split_stem_ext(path: &ArtifactPath) -> (&Path, &str, Option<&str>) {
    let original = Path::new(path.as_str());
    let stem = original.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = original.extension().and_then(|s| s.to_str());
    (original, stem, ext)
}

fn rebuild_path(original: &Path, new_name: String, fallback: &ArtifactPath) -> ArtifactPath {
    let renamed = match original.parent() {
        Some(parent) if parent != Path::new("") => parent.join(new_name),
        _ => Path::new(&new_name).to_path_buf(),
    };
    ArtifactPath::new(renamed.to_string_lossy().replace('\\', "/")).unwrap_or_else(|_| fallback.clone())
}

/// `keep_both` writes the incoming file next to the existing one with a
/// `.new` infix, per spec §4.10.
fn new_infix_path(path: &ArtifactPath) -> ArtifactPath {
    let (original, stem, ext) = split_stem_ext(path);
    let new_name = match ext {
        Some(ext) => format!("{stem}.new.{ext}"),
        None => format!("{stem}.new"),
    };
    rebuild_path(original, new_name, path)
}

/// `rename` moves the existing file aside with a time-stamp suffix on the
/// source, per spec §4.10.
fn timestamped_path(path: &ArtifactPath, now: OffsetDateTime) -> ArtifactPath {
    let (original, stem, ext) = split_stem_ext(path);
    let suffix = now.unix_timestamp();
    let new_name = match ext {
        Some(ext) => format!("{stem}.{suffix}.{ext}"),
        None => format!("{stem}.{suffix}"),
    };
    rebuild_path(original, new_name, path)
}

fn merge_text(source: &str, target: &str) -> String {
    format!("<<<<<<< SOURCE\n{source}\n=======\n{target}\n>>>>>>> TARGET\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(kind: ConflictKind, path: &str) -> Conflict {
        Conflict { kind, path: ArtifactPath::new(path).unwrap(), detail: "test".to_string() }
    }

    fn fixed_now() -> OffsetDateTime {
        time::macros::datetime!(2026-07-26 12:00:00 UTC)
    }

    #[test]
    fn default_mapping_matches_spec_table() {
        assert_eq!(ConflictKind::FileExists.default_strategy(), ResolutionStrategy::Overwrite);
        assert_eq!(ConflictKind::Content.default_strategy(), ResolutionStrategy::Overwrite);
        assert_eq!(ConflictKind::Version.default_strategy(), ResolutionStrategy::Prompt);
        assert_eq!(ConflictKind::Dependency.default_strategy(), ResolutionStrategy::Prompt);
        assert_eq!(ConflictKind::Permission.default_strategy(), ResolutionStrategy::Overwrite);
    }

    #[test]
    fn prompt_conflicts_fall_back_to_default_without_a_callback() {
        let resolver = ConflictResolver::new();
        let c = conflict(ConflictKind::Version, "bundle.json");
        assert!(matches!(resolver.resolve(&c, None, None, fixed_now()), Resolution::Overwrite));
    }

    #[test]
    fn prompt_callback_can_override_the_default() {
        let resolver = ConflictResolver::with_prompt(|_| ResolutionStrategy::Skip);
        let c = conflict(ConflictKind::Version, "bundle.json");
        assert!(matches!(resolver.resolve(&c, None, None, fixed_now()), Resolution::Skip));
    }

    #[test]
    fn merge_produces_conflict_markers_for_text_content() {
        let resolver = ConflictResolver::with_prompt(|_| ResolutionStrategy::Merge);
        let c = conflict(ConflictKind::Content, "readme.md");
        match resolver.resolve(&c, Some("new"), Some("old"), fixed_now()) {
            Resolution::Merged(text) => {
                assert!(text.starts_with("<<<<<<< SOURCE\nnew\n"));
                assert!(text.contains(">>>>>>> TARGET"));
            }
            other => panic!("expected merged text, got {other:?}"),
        }
    }

    #[test]
    fn merge_falls_back_to_overwrite_for_binary_content() {
        let resolver = ConflictResolver::with_prompt(|_| ResolutionStrategy::Merge);
        let c = conflict(ConflictKind::Content, "logo.png");
        assert!(matches!(resolver.resolve(&c, None, None, fixed_now()), Resolution::Overwrite));
    }

    #[test]
    fn keep_both_uses_new_infix() {
        let path = ArtifactPath::new("modules/tool.wasm").unwrap();
        let incoming = new_infix_path(&path);
        assert_eq!(incoming.as_str(), "modules/tool.new.wasm");
    }

    #[test]
    fn rename_keeps_extension_and_directory_with_timestamp_suffix() {
        let path = ArtifactPath::new("modules/tool.wasm").unwrap();
        let renamed = timestamped_path(&path, fixed_now());
        assert_eq!(renamed.as_str(), format!("modules/tool.{}.wasm", fixed_now().unix_timestamp()));
    }

    #[test]
    fn keep_both_resolution_uses_new_infix_for_incoming() {
        let c = conflict(ConflictKind::FileExists, "templates/welcome.json");
        let resolver = ConflictResolver::with_prompt(|_| ResolutionStrategy::KeepBoth);
        match resolver.resolve(&c, None, None, fixed_now()) {
            Resolution::KeepBoth { incoming, .. } => assert_eq!(incoming.as_str(), "templates/welcome.new.json"),
            other => panic!("expected keep-both, got {other:?}"),
        }
    }
}
