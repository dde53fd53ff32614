//! Material bundles: named subsets of material ids loaded together.
//!
//! Bundles only decide which base materials the registry instantiates and
//! in what order; they are invisible at render time.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::material::MaterialId;

/// Name of the bundle that always exists and is always active.
pub const BASE_BUNDLE: &str = "base";

/// One bundle file: `{name, description?, materials, icon?, always_loaded?, order?}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialBundle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub materials: Vec<MaterialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub always_loaded: bool,
    #[serde(default)]
    pub order: i32,
}

impl MaterialBundle {
    pub fn new(name: impl Into<String>, materials: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            materials: materials.iter().map(|m| m.to_string()).collect(),
            icon: None,
            always_loaded: false,
            order: 0,
        }
    }
}

/// All known bundles plus the set of active ones.
#[derive(Clone, Debug)]
pub struct BundleSet {
    bundles: BTreeMap<String, MaterialBundle>,
    active: BTreeSet<String>,
}

impl BundleSet {
    /// The bundles shipped with the built-in materials.
    pub fn builtin() -> Self {
        let mut base = MaterialBundle::new(
            BASE_BUNDLE,
            &[
                "grass", "dirt", "sand", "snow", "stone", "mountain", "road", "water", "forest",
                "wall", "floor",
            ],
        );
        base.always_loaded = true;
        base.description = Some("Core terrain".into());
        let mut settlements = MaterialBundle::new("settlements", &["village", "torch"]);
        settlements.order = 10;
        let mut elements = MaterialBundle::new("elements", &["fire", "lava"]);
        elements.order = 20;

        let mut set = Self {
            bundles: BTreeMap::new(),
            active: BTreeSet::new(),
        };
        for b in [base, settlements, elements] {
            set.insert(b);
        }
        set
    }

    /// Load every `*.json` bundle file in `dir` over the built-in bundles.
    ///
    /// Files that fail to parse are skipped with a warning; a missing
    /// directory yields the built-in set.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        if !dir.is_dir() {
            log::debug!("bundle directory {} not found, using built-in bundles", dir.display());
            return Ok(set);
        }
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        for path in paths {
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<MaterialBundle>(&text) {
                Ok(bundle) => set.insert(bundle),
                Err(e) => log::warn!("skipping bundle file {}: {}", path.display(), e),
            }
        }
        Ok(set)
    }

    /// Add or replace a bundle. `always_loaded` bundles become active.
    pub fn insert(&mut self, bundle: MaterialBundle) {
        if bundle.always_loaded || bundle.name == BASE_BUNDLE {
            self.active.insert(bundle.name.clone());
        }
        self.bundles.insert(bundle.name.clone(), bundle);
    }

    pub fn get(&self, name: &str) -> Option<&MaterialBundle> {
        self.bundles.get(name)
    }

    /// Activate a known bundle. Returns `false` for unknown names.
    pub fn activate(&mut self, name: &str) -> bool {
        if !self.bundles.contains_key(name) {
            return false;
        }
        self.active.insert(name.to_string());
        true
    }

    /// Deactivate a bundle. The base bundle cannot be deactivated.
    pub fn deactivate(&mut self, name: &str) -> bool {
        if name == BASE_BUNDLE {
            return false;
        }
        self.active.remove(name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        name == BASE_BUNDLE || self.active.contains(name)
    }

    /// Bundles in load order: base first, then by `order`, then name.
    pub fn ordered(&self) -> Vec<&MaterialBundle> {
        let mut v: Vec<_> = self.bundles.values().collect();
        v.sort_by(|a, b| {
            let key = |m: &MaterialBundle| (m.name != BASE_BUNDLE, m.order);
            key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
        });
        v
    }

    /// Material ids of every active bundle, deduplicated, in load order.
    pub fn active_materials(&self) -> Vec<MaterialId> {
        let mut seen = HashSet::new();
        self.ordered()
            .into_iter()
            .filter(|b| self.is_active(&b.name))
            .flat_map(|b| b.materials.iter())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for BundleSet {
    fn default() -> Self {
        Self::builtin()
    }
}
