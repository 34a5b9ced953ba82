//! CreamAPI installation into a game folder
//!
//! Every steam_api DLL under the game folder gets a cream_api.ini next to it
//! and, unless only the ini is being refreshed, is swapped for the CreamAPI
//! build while the original is kept as `<name>_o.dll`.
//!
//! Candidates are processed one at a time and independently: a failure on
//! one is recorded in the report and the next one is still attempted.

mod candidates;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cream_ini::CREAM_API_INI;
use crate::logging::{log_action, log_error, log_info, log_install, log_warning};

pub use candidates::{
    backup_path_for, find_candidates, Architecture, BinaryCandidate, BACKUP_SUFFIX,
    STEAM_API64_DLL, STEAM_API_DLL,
};

/// Suffix of the staging copy written next to the DLL before it is swapped in
pub const STAGING_SUFFIX: &str = ".creamdeck-tmp";

// ============================================================================
// Options and Decisions
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapOptions {
    /// Log every action but never touch the filesystem
    pub mock: bool,
    /// Only write cream_api.ini, leave the DLLs alone
    pub only_update: bool,
    /// Swap even when a `_o.dll` backup already exists
    pub force: bool,
}

/// What to do with one candidate after its ini has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    Replace,
    SkipAlreadyPatched,
    SkipMissingSource,
    UpdateConfigOnly,
}

impl SwapDecision {
    /// Decide from the current filesystem facts. Checks run in a fixed
    /// order: ini-only mode, missing source, existing backup.
    pub fn evaluate(options: &SwapOptions, source_exists: bool, backup_exists: bool) -> Self {
        if options.only_update {
            SwapDecision::UpdateConfigOnly
        } else if !source_exists {
            SwapDecision::SkipMissingSource
        } else if backup_exists && !options.force {
            SwapDecision::SkipAlreadyPatched
        } else {
            SwapDecision::Replace
        }
    }

    /// Evaluate against the filesystem for `candidate`
    pub fn for_candidate(candidate: &BinaryCandidate, options: &SwapOptions) -> Self {
        Self::evaluate(
            options,
            candidate.replacement_source.is_file(),
            candidate.backup_path.exists(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyPatched,
    MissingReplacementSource,
    OnlyUpdateMode,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyPatched => write!(f, "already patched"),
            SkipReason::MissingReplacementSource => write!(f, "replacement DLL missing"),
            SkipReason::OnlyUpdateMode => write!(f, "only updating cream_api.ini"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("failed to write {path}: {source}")]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage {source_path} at {path}: {source}")]
    StageReplacement {
        source_path: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {path} to {backup}: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The original is at `backup` but the replacement could not be put in
    /// place. `restored` tells whether the original was moved back.
    #[error("failed to move replacement into {path} (original restored: {restored}): {source}")]
    Activate {
        path: PathBuf,
        backup: PathBuf,
        restored: bool,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal state of one candidate
#[derive(Debug)]
pub enum CandidateState {
    Skipped(SkipReason),
    BackedUpAndReplaced,
    Failed(SwapError),
}

#[derive(Debug)]
pub struct CandidateOutcome {
    pub candidate: BinaryCandidate,
    /// cream_api.ini was written (or would have been, in mock mode)
    pub config_written: bool,
    pub state: CandidateState,
}

/// Result of one engine run, in processing order
#[derive(Debug, Default)]
pub struct SwapReport {
    pub outcomes: Vec<CandidateOutcome>,
}

impl SwapReport {
    pub fn replaced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, CandidateState::BackedUpAndReplaced))
            .count()
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, CandidateState::Skipped(r) if r == reason))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.state, CandidateState::Failed(_)))
            .count()
    }

    pub fn configs_written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.config_written).count()
    }
}

// ============================================================================
// Swap Engine
// ============================================================================

pub struct SwapEngine {
    dll_folder: PathBuf,
    options: SwapOptions,
}

impl SwapEngine {
    pub fn new(dll_folder: impl Into<PathBuf>, options: SwapOptions) -> Self {
        Self {
            dll_folder: dll_folder.into(),
            options,
        }
    }

    pub fn options(&self) -> &SwapOptions {
        &self.options
    }

    /// Install into every steam_api DLL found under `game_folder`
    pub fn run(&self, game_folder: &Path, rendered_config: &str) -> SwapReport {
        let candidates = find_candidates(game_folder, &self.dll_folder);
        if candidates.is_empty() {
            log_warning(&format!("No steam_api DLLs found under {}", game_folder.display()));
        }

        let mut report = SwapReport::default();
        for candidate in candidates {
            let outcome = self.process(candidate, rendered_config);
            report.outcomes.push(outcome);
        }

        log_info(&format!(
            "Processed {} DLL(s): {} replaced, {} already patched, {} missing source, {} failed",
            report.outcomes.len(),
            report.replaced(),
            report.skipped(SkipReason::AlreadyPatched),
            report.skipped(SkipReason::MissingReplacementSource),
            report.failed()
        ));
        report
    }

    /// Take one candidate from discovery to its terminal state
    pub fn process(&self, candidate: BinaryCandidate, rendered_config: &str) -> CandidateOutcome {
        log_info(&format!(
            "File: {} ({})",
            candidate.path.display(),
            candidate.architecture.label()
        ));

        if let Err(e) = self.write_config(&candidate, rendered_config) {
            log_error(&e.to_string());
            return CandidateOutcome {
                candidate,
                config_written: false,
                state: CandidateState::Failed(e),
            };
        }

        let state = match SwapDecision::for_candidate(&candidate, &self.options) {
            SwapDecision::UpdateConfigOnly => CandidateState::Skipped(SkipReason::OnlyUpdateMode),
            SwapDecision::SkipMissingSource => {
                log_warning(&format!(
                    "CreamAPI dll {} not found.",
                    candidate.replacement_source.display()
                ));
                CandidateState::Skipped(SkipReason::MissingReplacementSource)
            }
            SwapDecision::SkipAlreadyPatched => {
                log_info(&format!(
                    "Skipping cause {} exists.",
                    candidate.backup_path.display()
                ));
                CandidateState::Skipped(SkipReason::AlreadyPatched)
            }
            SwapDecision::Replace => match self.swap(&candidate) {
                Ok(()) => CandidateState::BackedUpAndReplaced,
                Err(e) => {
                    log_error(&e.to_string());
                    CandidateState::Failed(e)
                }
            },
        };

        CandidateOutcome {
            candidate,
            config_written: true,
            state,
        }
    }

    fn write_config(&self, candidate: &BinaryCandidate, rendered_config: &str) -> Result<(), SwapError> {
        let ini_path = candidate.folder().join(CREAM_API_INI);
        if ini_path.exists() {
            log_action(&format!("Overwriting {}", ini_path.display()));
        } else {
            log_action(&format!("Writing {}", ini_path.display()));
        }

        if self.options.mock {
            return Ok(());
        }
        fs::write(&ini_path, rendered_config).map_err(|source| SwapError::WriteConfig {
            path: ini_path,
            source,
        })
    }

    /// Back up the original DLL and put the replacement in its place.
    ///
    /// The replacement is first copied next to the DLL, so a failed copy
    /// leaves the game untouched. Moving the original to the backup and the
    /// staged copy into place are two renames; if the process dies between
    /// them the original sits at `_o.dll` and the game has no steam_api DLL
    /// until the staged `.creamdeck-tmp` file is renamed by hand or the game
    /// files are verified.
    fn swap(&self, candidate: &BinaryCandidate) -> Result<(), SwapError> {
        let staged = staging_path_for(&candidate.path);

        if candidate.backup_path.exists() {
            log_action(&format!("Overwriting file {}", candidate.backup_path.display()));
        } else {
            log_action(&format!(
                "Moving {} to {}",
                candidate.path.display(),
                candidate.backup_path.display()
            ));
        }

        if self.options.mock {
            log_install(&format!("Mock: would proxy {}", candidate.path.display()));
            return Ok(());
        }

        fs::copy(&candidate.replacement_source, &staged).map_err(|source| {
            let _ = fs::remove_file(&staged);
            SwapError::StageReplacement {
                source_path: candidate.replacement_source.clone(),
                path: staged.clone(),
                source,
            }
        })?;

        if let Err(source) = fs::rename(&candidate.path, &candidate.backup_path) {
            let _ = fs::remove_file(&staged);
            return Err(SwapError::Backup {
                path: candidate.path.clone(),
                backup: candidate.backup_path.clone(),
                source,
            });
        }

        if let Err(source) = fs::rename(&staged, &candidate.path) {
            let restored = fs::rename(&candidate.backup_path, &candidate.path).is_ok();
            let _ = fs::remove_file(&staged);
            return Err(SwapError::Activate {
                path: candidate.path.clone(),
                backup: candidate.backup_path.clone(),
                restored,
                source,
            });
        }

        log_install(&format!("Proxying {}.", candidate.path.display()));
        Ok(())
    }
}

/// `steam_api.dll` -> `steam_api.dll.creamdeck-tmp`
pub fn staging_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(STAGING_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INI: &str = "[steam]\nappid = 480\n";

    struct Fixture {
        game: tempfile::TempDir,
        dlls: tempfile::TempDir,
    }

    impl Fixture {
        /// Game with one x64 DLL; asset folder with both replacements
        fn new() -> Self {
            let game = tempfile::tempdir().unwrap();
            let dlls = tempfile::tempdir().unwrap();
            fs::write(game.path().join(STEAM_API64_DLL), b"original64").unwrap();
            fs::write(dlls.path().join(STEAM_API_DLL), b"cream32").unwrap();
            fs::write(dlls.path().join(STEAM_API64_DLL), b"cream64").unwrap();
            Self { game, dlls }
        }

        fn engine(&self, options: SwapOptions) -> SwapEngine {
            SwapEngine::new(self.dlls.path(), options)
        }

        fn read(&self, name: &str) -> Option<Vec<u8>> {
            fs::read(self.game.path().join(name)).ok()
        }

        /// Every file under the game folder with its contents
        fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
            let mut files: Vec<_> = walkdir::WalkDir::new(self.game.path())
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
                .collect();
            files.sort();
            files
        }
    }

    fn opts(mock: bool, only_update: bool, force: bool) -> SwapOptions {
        SwapOptions {
            mock,
            only_update,
            force,
        }
    }

    #[test]
    fn test_decision_table() {
        let plain = SwapOptions::default();
        assert_eq!(SwapDecision::evaluate(&plain, true, false), SwapDecision::Replace);
        assert_eq!(SwapDecision::evaluate(&plain, true, true), SwapDecision::SkipAlreadyPatched);
        assert_eq!(SwapDecision::evaluate(&plain, false, true), SwapDecision::SkipMissingSource);

        let forced = opts(false, false, true);
        assert_eq!(SwapDecision::evaluate(&forced, true, true), SwapDecision::Replace);
        assert_eq!(SwapDecision::evaluate(&forced, false, false), SwapDecision::SkipMissingSource);

        for force in [false, true] {
            let only = opts(false, true, force);
            for (source, backup) in [(true, true), (false, false), (true, false)] {
                assert_eq!(
                    SwapDecision::evaluate(&only, source, backup),
                    SwapDecision::UpdateConfigOnly
                );
            }
        }
    }

    #[test]
    fn test_replace_backs_up_and_writes_ini() {
        let fx = Fixture::new();
        let report = fx.engine(SwapOptions::default()).run(fx.game.path(), INI);

        assert_eq!(report.replaced(), 1);
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"cream64");
        assert_eq!(fx.read("steam_api64_o.dll").unwrap(), b"original64");
        assert_eq!(fx.read(CREAM_API_INI).unwrap(), INI.as_bytes());
        assert!(fx.read("steam_api64.dll.creamdeck-tmp").is_none());
    }

    #[test]
    fn test_second_run_is_already_patched_but_rewrites_ini() {
        let fx = Fixture::new();
        let engine = fx.engine(SwapOptions::default());
        engine.run(fx.game.path(), INI);

        fs::write(fx.game.path().join(CREAM_API_INI), "stale").unwrap();
        let second = engine.run(fx.game.path(), INI);

        assert_eq!(second.replaced(), 0);
        assert_eq!(second.skipped(SkipReason::AlreadyPatched), 1);
        assert_eq!(second.configs_written(), 1);
        assert_eq!(fx.read(CREAM_API_INI).unwrap(), INI.as_bytes());
        assert_eq!(fx.read("steam_api64_o.dll").unwrap(), b"original64");
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"cream64");
    }

    #[test]
    fn test_existing_backup_without_force_leaves_files_alone() {
        let fx = Fixture::new();
        fs::write(fx.game.path().join("steam_api64_o.dll"), b"backup").unwrap();

        let report = fx.engine(SwapOptions::default()).run(fx.game.path(), INI);

        assert!(matches!(
            report.outcomes[0].state,
            CandidateState::Skipped(SkipReason::AlreadyPatched)
        ));
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"original64");
        assert_eq!(fx.read("steam_api64_o.dll").unwrap(), b"backup");
    }

    #[test]
    fn test_force_overwrites_existing_backup() {
        let fx = Fixture::new();
        fs::write(fx.game.path().join("steam_api64_o.dll"), b"backup").unwrap();

        let report = fx.engine(opts(false, false, true)).run(fx.game.path(), INI);

        assert_eq!(report.replaced(), 1);
        assert_eq!(fx.read("steam_api64_o.dll").unwrap(), b"original64");
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"cream64");
    }

    #[test]
    fn test_only_update_never_touches_dlls() {
        for force in [false, true] {
            let fx = Fixture::new();
            let report = fx.engine(opts(false, true, force)).run(fx.game.path(), INI);

            assert_eq!(report.skipped(SkipReason::OnlyUpdateMode), 1);
            assert_eq!(fx.read(CREAM_API_INI).unwrap(), INI.as_bytes());
            assert_eq!(fx.read("steam_api64.dll").unwrap(), b"original64");
            assert!(fx.read("steam_api64_o.dll").is_none());
        }
    }

    #[test]
    fn test_mock_never_mutates_but_visits_everything() {
        let combos = [
            opts(true, false, false),
            opts(true, false, true),
            opts(true, true, false),
            opts(true, true, true),
        ];
        for options in combos {
            let fx = Fixture::new();
            fs::create_dir_all(fx.game.path().join("bin")).unwrap();
            fs::write(fx.game.path().join("bin/steam_api.dll"), b"original32").unwrap();
            let before = fx.snapshot();

            let report = fx.engine(options).run(fx.game.path(), INI);

            assert_eq!(fx.snapshot(), before, "mutated with {:?}", options);
            assert_eq!(report.outcomes.len(), 2);
            assert_eq!(report.configs_written(), 2);
            let expected = if options.only_update { 0 } else { 2 };
            assert_eq!(report.replaced(), expected);
        }
    }

    #[test]
    fn test_missing_source_skips_only_that_architecture() {
        let fx = Fixture::new();
        fs::remove_file(fx.dlls.path().join(STEAM_API64_DLL)).unwrap();
        fs::create_dir_all(fx.game.path().join("x86")).unwrap();
        fs::write(fx.game.path().join("x86/steam_api.dll"), b"original32").unwrap();

        let report = fx.engine(SwapOptions::default()).run(fx.game.path(), INI);

        assert_eq!(report.skipped(SkipReason::MissingReplacementSource), 1);
        assert_eq!(report.replaced(), 1);
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"original64");
        assert!(fx.read("steam_api64_o.dll").is_none());
        assert_eq!(fx.read("x86/steam_api.dll").unwrap(), b"cream32");
        assert_eq!(fx.read("x86/steam_api_o.dll").unwrap(), b"original32");
        // The ini is written before the source check
        assert_eq!(fx.read(CREAM_API_INI).unwrap(), INI.as_bytes());
    }

    #[test]
    fn test_failed_staging_leaves_original_in_place() {
        let fx = Fixture::new();
        // A directory where the staging file should go makes the copy fail
        fs::create_dir_all(fx.game.path().join("steam_api64.dll.creamdeck-tmp/blocker")).unwrap();

        let report = fx.engine(SwapOptions::default()).run(fx.game.path(), INI);

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcomes[0].state,
            CandidateState::Failed(SwapError::StageReplacement { .. })
        ));
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"original64");
        assert!(fx.read("steam_api64_o.dll").is_none());
    }

    #[test]
    fn test_failure_on_one_candidate_does_not_stop_the_next() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.game.path().join("a")).unwrap();
        fs::write(fx.game.path().join("a/steam_api.dll"), b"original32").unwrap();
        // Block the ini write in the first folder visited
        fs::create_dir_all(fx.game.path().join("a").join(CREAM_API_INI)).unwrap();

        let report = fx.engine(SwapOptions::default()).run(fx.game.path(), INI);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.replaced(), 1);
        assert_eq!(fx.read("a/steam_api.dll").unwrap(), b"original32");
        assert_eq!(fx.read("steam_api64.dll").unwrap(), b"cream64");
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path_for(Path::new("/g/steam_api.dll")),
            PathBuf::from("/g/steam_api.dll.creamdeck-tmp")
        );
    }
}
