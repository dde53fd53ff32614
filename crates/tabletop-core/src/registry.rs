//! The [`MaterialRegistry`]: one id → material lookup for the whole session.
//!
//! Base materials come from the built-in set (filtered by active bundles);
//! custom materials come from a user-editable JSON store and may be added or
//! removed at runtime. Ids are unique across both sets.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::BundleSet;
use crate::error::{Error, Result};
use crate::material::{Material, MaterialId, builtin_materials};

/// JSON file holding the custom set: `{id: {name, color, animated, emoji, texture_path?}}`.
#[derive(Clone, Debug)]
pub struct CustomStore {
    path: PathBuf,
}

impl CustomStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store. A missing file is an empty store.
    pub fn load(&self) -> Result<BTreeMap<MaterialId, Material>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, materials: &BTreeMap<MaterialId, Material>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(materials)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Process-lifetime owner of every [`Material`].
#[derive(Clone, Debug)]
pub struct MaterialRegistry {
    materials: BTreeMap<MaterialId, Material>,
    custom: BTreeSet<MaterialId>,
    store: Option<CustomStore>,
    fallback: Material,
}

impl MaterialRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            materials: BTreeMap::new(),
            custom: BTreeSet::new(),
            store: None,
            fallback: Material::fallback(),
        }
    }

    /// Every built-in material, regardless of bundles.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        reg.materials.extend(builtin_materials());
        reg
    }

    /// Built-in materials listed by the active bundles, in bundle order.
    pub fn from_bundles(bundles: &BundleSet) -> Self {
        let mut all: BTreeMap<_, _> = builtin_materials().into_iter().collect();
        let mut reg = Self::empty();
        for id in bundles.active_materials() {
            match all.remove(&id) {
                Some(m) => {
                    reg.materials.insert(id, m);
                }
                None if reg.materials.contains_key(&id) => {}
                None => log::warn!("bundle references unknown material `{id}`"),
            }
        }
        reg
    }

    /// Attach a custom store: its materials are merged now and every later
    /// `put`/`remove` is written back.
    pub fn attach_store(&mut self, store: CustomStore) -> Result<()> {
        let loaded = store.load()?;
        self.merge_custom(loaded);
        self.store = Some(store);
        Ok(())
    }

    /// Merge custom materials, skipping ids that already exist.
    pub fn merge_custom(&mut self, materials: BTreeMap<MaterialId, Material>) {
        for (id, m) in materials {
            if self.materials.contains_key(&id) {
                log::warn!("custom material `{id}` collides with a loaded id, skipping");
                continue;
            }
            self.custom.insert(id.clone());
            self.materials.insert(id, m);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Like [`get`](Self::get), but unknown ids yield the grey fallback.
    pub fn lookup(&self, id: &str) -> &Material {
        self.materials.get(id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.materials.contains_key(id)
    }

    pub fn is_custom(&self, id: &str) -> bool {
        self.custom.contains(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Every material, stably sorted by display name (ties keep id order).
    pub fn all(&self) -> Vec<(&str, &Material)> {
        let mut v: Vec<_> = self.materials.iter().map(|(id, m)| (id.as_str(), m)).collect();
        v.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        v
    }

    /// Add a custom material. When the store cannot be written the
    /// registry is left unchanged.
    pub fn put(&mut self, id: impl Into<MaterialId>, material: Material) -> Result<()> {
        let id = id.into();
        if self.materials.contains_key(&id) {
            return Err(Error::DuplicateMaterialId(id));
        }
        let mut stored = self.custom_materials();
        stored.insert(id.clone(), material.clone());
        self.persist(&stored)?;
        self.custom.insert(id.clone());
        self.materials.insert(id, material);
        Ok(())
    }

    /// Remove a custom material. Base ids cannot be removed. When the
    /// store cannot be written the material stays.
    pub fn remove(&mut self, id: &str) -> Result<Material> {
        if !self.custom.contains(id) {
            return Err(Error::UnknownMaterialId(id.to_string()));
        }
        let mut stored = self.custom_materials();
        stored.remove(id);
        self.persist(&stored)?;
        self.custom.remove(id);
        self.materials
            .remove(id)
            .ok_or_else(|| Error::UnknownMaterialId(id.to_string()))
    }

    /// The custom set, as stored in the custom store and map documents.
    pub fn custom_materials(&self) -> BTreeMap<MaterialId, Material> {
        self.custom
            .iter()
            .filter_map(|id| self.materials.get(id).map(|m| (id.clone(), m.clone())))
            .collect()
    }

    fn persist(&self, custom: &BTreeMap<MaterialId, Material>) -> Result<()> {
        match &self.store {
            Some(store) => store.save(custom),
            None => Ok(()),
        }
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use std::collections::HashSet;

    #[test]
    fn unknown_lookup_is_grey() {
        let reg = MaterialRegistry::builtin();
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.lookup("nope").color, Rgb::FALLBACK_GREY);
        assert_eq!(reg.lookup("grass").name, "Grass");
    }

    #[test]
    fn all_is_sorted_by_name_and_unique() {
        let mut reg = MaterialRegistry::builtin();
        reg.put("aaa", Material::new("Zebra", Rgb::BLACK)).unwrap();
        let all = reg.all();
        let names: Vec<_> = all.iter().map(|(_, m)| m.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        let ids: HashSet<_> = all.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn put_rejects_duplicates() {
        let mut reg = MaterialRegistry::builtin();
        let err = reg.put("grass", Material::new("Other", Rgb::WHITE)).unwrap_err();
        assert!(matches!(err, Error::DuplicateMaterialId(id) if id == "grass"));
    }

    #[test]
    fn remove_only_custom() {
        let mut reg = MaterialRegistry::builtin();
        assert!(matches!(reg.remove("grass"), Err(Error::UnknownMaterialId(_))));
        reg.put("swamp", Material::new("Swamp", Rgb::new(60, 80, 40))).unwrap();
        assert!(reg.is_custom("swamp"));
        assert_eq!(reg.remove("swamp").unwrap().name, "Swamp");
        assert!(!reg.contains("swamp"));
        assert!(matches!(reg.remove("swamp"), Err(Error::UnknownMaterialId(_))));
    }

    #[test]
    fn bundles_limit_base_set() {
        let reg = MaterialRegistry::from_bundles(&BundleSet::builtin());
        assert!(reg.contains("grass"));
        assert!(!reg.contains("village"));
    }

    #[test]
    fn store_saves_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut reg = MaterialRegistry::builtin();
        reg.attach_store(CustomStore::new(&path)).unwrap();
        reg.put("swamp", Material::new("Swamp", Rgb::new(60, 80, 40))).unwrap();

        let mut fresh = MaterialRegistry::builtin();
        fresh.attach_store(CustomStore::new(&path)).unwrap();
        assert_eq!(fresh.get("swamp").unwrap().color, Rgb::new(60, 80, 40));

        fresh.remove("swamp").unwrap();
        let stored = CustomStore::new(&path).load().unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn failed_save_leaves_registry_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let mut reg = MaterialRegistry::builtin();
        reg.attach_store(CustomStore::new(blocker.join("custom.json"))).unwrap();

        let swamp = Material::new("Swamp", Rgb::new(60, 80, 40));
        assert!(matches!(reg.put("swamp", swamp.clone()), Err(Error::Io(_))));
        assert!(!reg.contains("swamp"));
        assert!(!reg.is_custom("swamp"));
        // a retry reports the same failure, not a duplicate
        assert!(matches!(reg.put("swamp", swamp), Err(Error::Io(_))));
    }

    #[test]
    fn failed_remove_keeps_material() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let mut reg = MaterialRegistry::builtin();
        reg.attach_store(CustomStore::new(&path)).unwrap();
        reg.put("swamp", Material::new("Swamp", Rgb::new(60, 80, 40))).unwrap();

        // swap the store file for a directory so the next write fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        assert!(reg.remove("swamp").is_err());
        assert!(reg.is_custom("swamp"));
        assert_eq!(reg.lookup("swamp").name, "Swamp");
    }

    #[test]
    fn merge_skips_colliding_ids() {
        let mut reg = MaterialRegistry::builtin();
        let mut incoming = BTreeMap::new();
        incoming.insert("grass".to_string(), Material::new("Fake", Rgb::BLACK));
        incoming.insert("swamp".to_string(), Material::new("Swamp", Rgb::BLACK));
        reg.merge_custom(incoming);
        assert_eq!(reg.lookup("grass").name, "Grass");
        assert!(reg.is_custom("swamp"));
        assert!(!reg.is_custom("grass"));
    }
}
