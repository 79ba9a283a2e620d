//! Limits and scene configuration.
//!
//! The per-field byte ceiling is always enforced. Project-wide limits are
//! quota settings owned by the caller and only apply when set.

/// Index value meaning "no category" in categorical data.
pub const NO_CATEGORY: i64 = -1;

/// Largest category index a categorical array may hold.
pub const MAX_CATEGORY_INDEX: i64 = 255;

/// Size in bytes of one encoded array element (`<f4` and `<i4`).
pub const WIRE_ITEM_SIZE: usize = 4;

/// Default ceiling for the encoded size of a single field (250 MiB).
pub const DEFAULT_MAX_FIELD_BYTES: u64 = 250 * 1024 * 1024;

/// Default quota for the encoded size of a whole project (1 GiB).
pub const DEFAULT_MAX_PROJECT_BYTES: u64 = 1024 * 1024 * 1024;

/// Default quota for the number of resources in a project.
pub const DEFAULT_MAX_PROJECT_RESOURCES: usize = 200;

/// Relative tolerance of the float narrowing check.
pub const FLOAT_RTOL: f64 = 1e-5;

/// Absolute tolerance of the float narrowing check.
pub const FLOAT_ATOL: f64 = 1e-8;

/// Leading bytes of every PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Size limits applied during assignment and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum encoded size of any single array or image field.
    pub max_field_bytes: u64,
    /// Maximum encoded size of all arrays owned by a project.
    pub max_project_bytes: Option<u64>,
    /// Maximum number of resources in a project.
    pub max_project_resources: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_field_bytes: DEFAULT_MAX_FIELD_BYTES,
            max_project_bytes: None,
            max_project_resources: None,
        }
    }
}

impl Limits {
    /// Creates the default limits (field ceiling only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates limits with the default project quotas enabled.
    pub fn with_default_quota() -> Self {
        Self {
            max_field_bytes: DEFAULT_MAX_FIELD_BYTES,
            max_project_bytes: Some(DEFAULT_MAX_PROJECT_BYTES),
            max_project_resources: Some(DEFAULT_MAX_PROJECT_RESOURCES),
        }
    }

    /// Sets the per-field byte ceiling.
    pub fn with_max_field_bytes(mut self, bytes: u64) -> Self {
        self.max_field_bytes = bytes;
        self
    }

    /// Sets the project size quota.
    pub fn with_max_project_bytes(mut self, bytes: u64) -> Self {
        self.max_project_bytes = Some(bytes);
        self
    }

    /// Sets the project resource count quota.
    pub fn with_max_project_resources(mut self, count: usize) -> Self {
        self.max_project_resources = Some(count);
        self
    }
}

/// Configuration for a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneConfig {
    pub limits: Limits,
    /// Seed for the scene's random source. `None` seeds from OS entropy.
    ///
    /// Every random default (random colors, generated colormaps) is drawn
    /// from this one source, so a fixed seed gives reproducible scenes.
    pub seed: Option<u64>,
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
