use crate::cli::{CACHE_DIR_NAME, Cli, Command, remove_cache_dirs};

use std::fs::{create_dir_all, write};
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

/// **VALUE**: Verifies that nested cache directories are found and removed.
///
/// **WHY THIS MATTERS**: `remove-cache` is how users recover from a stale
/// build. Missing nested caches would leave the problem in place.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Only the top level was searched
/// - Non-cache directories or files were deleted
#[test]
fn given_nested_caches_when_removing_then_only_caches_deleted() {
    // GIVEN: A tree with two caches and unrelated content
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    create_dir_all(root.join(CACHE_DIR_NAME).join("deep")).unwrap();
    create_dir_all(root.join("app").join("ui").join(CACHE_DIR_NAME)).unwrap();
    create_dir_all(root.join("app").join("src")).unwrap();
    write(root.join("app").join("src").join("main.js"), "x").unwrap();

    // WHEN: Removing caches
    let removed = remove_cache_dirs(root).unwrap();

    // THEN: Both caches are gone and the rest survives
    assert_eq!(removed, 2);
    assert!(!root.join(CACHE_DIR_NAME).exists());
    assert!(!root.join("app").join("ui").join(CACHE_DIR_NAME).exists());
    assert!(root.join("app").join("src").join("main.js").exists());
}

/// **VALUE**: Verifies that a tree without caches is left alone.
///
/// **WHY THIS MATTERS**: The command must exit successfully when there is
/// nothing to remove.
///
/// **BUG THIS CATCHES**: Would catch an error on an empty search.
#[test]
fn given_no_caches_when_removing_then_zero_removed() {
    // GIVEN: A tree with no cache directories
    let temp = TempDir::new().unwrap();
    create_dir_all(temp.path().join("a").join("b")).unwrap();

    // WHEN / THEN
    assert_eq!(remove_cache_dirs(temp.path()).unwrap(), 0);
    assert!(temp.path().join("a").join("b").exists());
}

/// **VALUE**: Verifies that a missing root is reported, not ignored.
///
/// **WHY THIS MATTERS**: A typo in `--root` should not look like success.
///
/// **BUG THIS CATCHES**: Would catch if read errors were swallowed.
#[test]
fn given_missing_root_when_removing_then_cache_error() {
    // GIVEN: A root that does not exist
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");

    // WHEN
    let result = remove_cache_dirs(&missing);

    // THEN
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Cache Error:"));
}

/// **VALUE**: Verifies the command-line surface.
///
/// **WHY THIS MATTERS**: Launch scripts depend on the subcommand and flag names.
///
/// **BUG THIS CATCHES**: Would catch renamed subcommands or flags.
#[test]
fn given_arguments_when_parsing_then_subcommands_recognized() {
    // GIVEN / WHEN
    let run = Cli::try_parse_from(["frame-host", "run", "--config-dir", "/cfg"]).unwrap();
    let clean = Cli::try_parse_from(["frame-host", "remove-cache", "--root", "/src"]).unwrap();

    // THEN
    assert_eq!(
        run.command,
        Command::Run {
            config_dir: Some(PathBuf::from("/cfg")),
            log_dir: None,
            address: None,
        }
    );
    assert_eq!(
        clean.command,
        Command::RemoveCache {
            root: Some(PathBuf::from("/src")),
        }
    );
    assert!(Cli::try_parse_from(["frame-host"]).is_err());
}
