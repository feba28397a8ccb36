// Profile file loading, preset lookup and fallback resolution

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::error::ProfileError;
use super::types::Profile;
use crate::world::Side;

/// Directory holding user profile files
pub fn profiles_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("bankshot");

    // Create config directory if it doesn't exist
    fs::create_dir_all(&path).ok();

    path
}

/// Load and validate a profile from a `.toml` or `.json` file
pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
    let contents = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let profile: Profile = if is_json {
        serde_json::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    profile.validate()?;
    Ok(profile)
}

/// Load a profile file, substituting the fallback profile on any failure
pub fn load_profile_or_fallback(path: &Path) -> Profile {
    match load_profile(path) {
        Ok(profile) => profile,
        Err(e) => {
            error!(path = %path.display(), "failed to load profile: {}", e);
            Profile::fallback()
        }
    }
}

/// Resolve a command-line style profile reference: a preset name, a file path, or a saved profile name
pub fn profile_from_spec(spec: &str) -> Result<Profile, ProfileError> {
    if let Some(profile) = Profile::preset(spec) {
        return Ok(profile);
    }

    let path = Path::new(spec);
    if path.exists() {
        return load_profile(path);
    }

    // Bare names also resolve against the user's profile directory
    let saved = profiles_dir().join(format!("{spec}.toml"));
    if saved.exists() {
        return load_profile(&saved);
    }

    warn!(
        "unknown profile `{}` (presets: {})",
        spec,
        Profile::preset_names().join(", ")
    );
    Err(ProfileError::UnknownPreset(spec.to_string()))
}

/// Final gate before a profile reaches a controller.
///
/// A missing or invalid profile is replaced by `Profile::fallback()` and logged once.
pub fn resolve_profile(profile: Option<Profile>, side: Side) -> Profile {
    let Some(profile) = profile else {
        error!(%side, "profile was missing, loading fallback");
        return Profile::fallback();
    };

    match profile.validate() {
        Ok(()) => {
            info!(%side, profile = %profile.name, "loaded profile");
            profile
        }
        Err(e) => {
            error!(%side, profile = %profile.name, "rejected profile ({}), loading fallback", e);
            Profile::fallback()
        }
    }
}

/// Write a commented TOML template containing the fallback profile
pub fn write_default_profile(path: &Path) -> Result<(), ProfileError> {
    let toml_string = toml::to_string_pretty(&Profile::fallback())?;

    let commented_toml = format!(
        "# bankshot opponent profile\n\
         # Angles are radians unless the key ends in Deg, times are milliseconds\n\
         #\n\
         # reloading.strategy: \"empty\" or \"threshold\"\n\
         # targeting.strategy: \"closest\" or \"closestToGoal\"\n\n\
         {}",
        toml_string
    );

    fs::write(path, commented_toml).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "created default profile");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReloadStrategy, TargetingKind};

    #[test]
    fn test_default_profile_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        write_default_profile(&path).unwrap();

        let loaded = load_profile(&path).unwrap();
        assert_eq!(loaded, Profile::fallback());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
            name = "partial"
            [aiming]
            errorMargin = 0.02
            canBounceShot = true
            bounceShotChance = 0.4

            [reloading]
            strategy = "threshold"
            threshold = 4
            "#,
        )
        .unwrap();

        let profile = load_profile(&path).unwrap();
        assert_eq!(profile.name, "partial");
        assert_eq!(profile.aiming.error_margin, 0.02);
        assert!(profile.aiming.can_bounce_shot);
        assert_eq!(profile.aiming.aim_rotation_speed_cap, 1.5);
        assert_eq!(profile.reloading.strategy, ReloadStrategy::Threshold);
        assert_eq!(profile.reloading.threshold, 4);
        assert_eq!(profile.targeting.strategy, TargetingKind::Closest);
    }

    #[test]
    fn test_json_profile_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(
            &path,
            r#"{ "name": "json", "timing": { "fireRate": 250 }, "unknownKey": 1 }"#,
        )
        .unwrap();

        let profile = load_profile(&path).unwrap();
        assert_eq!(profile.name, "json");
        assert_eq!(profile.timing.fire_rate, 250.0);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(load_profile(&path).is_err());
        assert_eq!(load_profile_or_fallback(&path), Profile::fallback());

        let missing = dir.path().join("missing.toml");
        assert_eq!(load_profile_or_fallback(&missing), Profile::fallback());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        fs::write(&path, "[aiming]\npredictiveStrength = 3.0\n").unwrap();
        assert!(matches!(
            load_profile(&path),
            Err(ProfileError::Invalid { .. })
        ));
    }

    #[test]
    fn test_resolve_profile() {
        assert_eq!(resolve_profile(None, Side::Left), Profile::fallback());

        let mut bad = Profile::veteran();
        bad.aiming.aim_rotation_speed_cap = 0.0;
        assert_eq!(resolve_profile(Some(bad), Side::Right), Profile::fallback());

        assert_eq!(
            resolve_profile(Some(Profile::veteran()), Side::Right),
            Profile::veteran()
        );
    }

    #[test]
    fn test_profile_from_spec() {
        assert_eq!(profile_from_spec("Trickster").unwrap().name, "trickster");
        assert!(matches!(
            profile_from_spec("no-such-profile-anywhere"),
            Err(ProfileError::UnknownPreset(_))
        ));
    }
}
