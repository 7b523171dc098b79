use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use zobj_core::{Descriptor, Entry, EntryKind, ZObject};

pub const PROJECT_FILE: &str = "project.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    object_file: PathBuf,
    descriptor_file: PathBuf,
}

impl ProjectConfig {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let config_str = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {:?}", path.as_ref()))?;
        let config: ProjectConfig = toml::from_str(&config_str)?;
        Ok(config)
    }
}

/// An object segment on disk: the raw blob plus the descriptor that carves it up.
pub struct Project {
    dir: PathBuf,
    config: ProjectConfig,
    blob: Vec<u8>,
    object: ZObject,
}

impl Project {
    /// Creates a project directory around `input`, described as one unknown entry.
    pub fn init(input: impl AsRef<Path>, project_dir: impl AsRef<Path>) -> Result<Self> {
        let input = input.as_ref();
        let dir = project_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).with_context(|| format!("create {:?}", dir))?;

        let blob = std::fs::read(input).with_context(|| format!("read {:?}", input))?;
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string());
        let config = ProjectConfig {
            object_file: PathBuf::from(format!("{}.zobj", stem)),
            descriptor_file: PathBuf::from(format!("{}.yaml", stem)),
        };

        std::fs::write(dir.join(&config.object_file), &blob)?;
        std::fs::write(dir.join(PROJECT_FILE), toml::to_string(&config)?)?;

        let project = Self {
            object: ZObject::from_blob(&blob),
            dir,
            config,
            blob,
        };
        project.save()?;
        Ok(project)
    }

    pub fn open(project_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = project_dir.as_ref().to_path_buf();
        let config = ProjectConfig::new(dir.join(PROJECT_FILE))?;

        let blob_path = dir.join(&config.object_file);
        let blob = std::fs::read(&blob_path).with_context(|| format!("read {:?}", blob_path))?;
        let descriptor_path = dir.join(&config.descriptor_file);
        let descriptor = std::fs::read_to_string(&descriptor_path)
            .with_context(|| format!("read {:?}", descriptor_path))?;
        let descriptor = Descriptor::from_yaml(&descriptor)?;

        let mut object = ZObject::from_descriptor(&descriptor)?;
        let described = object.total_size() as usize;
        if blob.len() < described {
            bail!(
                "{:?} is 0x{:X} bytes but the descriptor covers 0x{:X}",
                blob_path,
                blob.len(),
                described
            );
        }
        if blob.len() > described {
            log::info!(
                "describing trailing 0x{:X} bytes as unknown",
                blob.len() - described
            );
            let name = Entry::auto_name(EntryKind::Unknown, described as u32);
            object.add_unknown(&name, vec![0; blob.len() - described], None)?;
        }
        object.load(&blob)?;

        Ok(Self {
            dir,
            config,
            blob,
            object,
        })
    }

    pub fn object(&self) -> &ZObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut ZObject {
        &mut self.object
    }

    /// Bytes of the original blob in `offset..offset + size`.
    pub fn slice(&self, offset: u32, size: u32) -> Result<&[u8]> {
        let start = offset as usize;
        let end = start + size as usize;
        if end > self.blob.len() {
            bail!(
                "0x{:X}..0x{:X} is outside the 0x{:X} byte object",
                start,
                end,
                self.blob.len()
            );
        }
        Ok(&self.blob[start..end])
    }

    pub fn save(&self) -> Result<()> {
        let path = self.dir.join(&self.config.descriptor_file);
        let yaml = self.object.to_descriptor().to_yaml()?;
        std::fs::write(&path, yaml).with_context(|| format!("write {:?}", path))?;
        log::debug!("saved descriptor to {:?}", path);
        Ok(())
    }
}
