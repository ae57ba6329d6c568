// Config/log directory resolution

use crate::paths::{PathSource, resolve_from};

use std::path::PathBuf;

/// **VALUE**: Verifies an explicit override wins and logs live under it.
///
/// **WHY THIS MATTERS**: Tests and packaged installs point the host somewhere other than
/// the platform config dir. If the override were ignored, they would read and write the
/// user's real config.
///
/// **BUG THIS CATCHES**: Would catch the override being dropped, or logs landing outside
/// the config directory.
#[test]
fn given_override_dir_when_resolving_then_env_var_source_and_nested_logs() {
    // GIVEN: An override directory
    let dir = PathBuf::from("/tmp/php-bridge-paths-test");

    // WHEN: Resolving
    let paths = resolve_from(Some(dir.clone())).expect("override always resolves");

    // THEN: Override used, logs underneath
    assert_eq!(paths.source, PathSource::EnvVar);
    assert_eq!(paths.config_dir, dir);
    assert_eq!(paths.log_dir, dir.join("logs"));
}

/// **VALUE**: Verifies an empty override (`BRIDGE_CONFIG_DIR=`) is treated as unset.
///
/// **BUG THIS CATCHES**: Would catch an empty variable turning into a config dir of ""
/// (the current working directory).
#[test]
fn given_empty_override_when_resolving_then_platform_default_used() {
    // GIVEN / WHEN
    let result = resolve_from(Some(PathBuf::new()));

    // THEN: Either the platform default, or an error on platforms without one
    match dirs::config_dir() {
        Some(base) => {
            let paths = result.expect("platform default");
            assert_eq!(paths.source, PathSource::PlatformDefault);
            assert_eq!(paths.config_dir, base.join("php-bridge"));
        }
        None => assert!(result.is_err()),
    }
}
