use std::{
    cell::RefCell,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;

pub trait OptionStore {
    fn get_options(&self) -> Result<Option<Value>>;

    fn set_options(&self, value: &Value) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileOptionStore {
    path: PathBuf,
}

impl JsonFileOptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "options.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl OptionStore for JsonFileOptionStore {
    fn get_options(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Reading options file {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Parsing options JSON in {:?}", self.path))?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    fn set_options(&self, value: &Value) -> Result<()> {
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)
                .with_context(|| format!("Creating options file {temp:?}"))?;
            serde_json::to_writer_pretty(&mut file, value).context("Writing options JSON")?;
            file.write_all(b"\n")?;
            file.flush()?;
        }
        fs::rename(&temp, &self.path)
            .with_context(|| format!("Replacing options file {:?}", self.path))
    }
}

#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    value: RefCell<Option<Value>>,
    writes: RefCell<usize>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value) -> Self {
        Self {
            value: RefCell::new(Some(value)),
            writes: RefCell::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.borrow()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_options(&self) -> Result<Option<Value>> {
        Ok(self.value.borrow().clone())
    }

    fn set_options(&self, value: &Value) -> Result<()> {
        *self.value.borrow_mut() = Some(value.clone());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

impl<S: OptionStore + ?Sized> OptionStore for &S {
    fn get_options(&self) -> Result<Option<Value>> {
        (**self).get_options()
    }

    fn set_options(&self, value: &Value) -> Result<()> {
        (**self).set_options(value)
    }
}
