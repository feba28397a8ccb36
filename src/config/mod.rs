// Configuration module for bankshot
// Handles opponent profiles: typed defaults, presets, and file loading

pub mod error;
pub mod loader;
pub mod types;

pub use error::ProfileError;
pub use loader::{
    load_profile, load_profile_or_fallback, profile_from_spec, profiles_dir, resolve_profile,
    write_default_profile,
};
pub use types::{
    AimingProfile, Profile, ReloadStrategy, ReloadingProfile, TargetingKind, TargetingProfile,
    TimingProfile, MAX_BOUNCE_SWEEP_ANGLES,
};
